pub mod recommender;
pub mod skills;

pub use recommender::{rank_candidates, recommend_for_project, RecommendError, RecommendedMatch};
pub use skills::{score_skill_overlap, SkillOverlap};
