//! Skill-overlap scoring between a project's required skills and a
//! candidate's skill set. The score is the share of required skills the
//! candidate covers, after normalization, expressed as 0-100.

use crate::skill_normalizer::normalize_skill_set;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillOverlap {
    /// Percentage (0-100) of required skills the candidate covers.
    pub score: f64,
    /// Canonical form of the required skills the candidate has, sorted.
    pub matched_skills: Vec<String>,
    /// Canonical required skills the candidate lacks, sorted.
    pub missing_skills: Vec<String>,
}

pub fn score_skill_overlap(required_skills: &[String], candidate_skills: &[String]) -> SkillOverlap {
    let required = normalize_skill_set(required_skills);
    if required.is_empty() {
        // Nothing required means nothing to rank on.
        return SkillOverlap::default();
    }

    let offered = normalize_skill_set(candidate_skills);

    let mut matched_skills: Vec<String> = required.intersection(&offered).cloned().collect();
    matched_skills.sort();

    let mut missing_skills: Vec<String> = required.difference(&offered).cloned().collect();
    missing_skills.sort();

    let score = matched_skills.len() as f64 / required.len() as f64 * 100.0;

    SkillOverlap {
        score,
        matched_skills,
        missing_skills,
    }
}
