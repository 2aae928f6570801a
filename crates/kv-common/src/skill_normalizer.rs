//! Canonicalizes free-form skill strings before overlap scoring. Users type
//! "React.js", owners type "react", and both must land on the same token or
//! the recommender undercounts the overlap.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use strsim::damerau_levenshtein;
use unicode_normalization::UnicodeNormalization;

/// Alias → canonical skill token. Lookup is O(1); the table covers the
/// spellings seen in onboarding data, not every technology in existence —
/// unknown skills fall through to plain lowercasing.
static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        (
            "javascript",
            &["js", "javascript", "java script", "ecmascript", "es6"],
        ),
        ("typescript", &["ts", "typescript", "type script"]),
        ("nodejs", &["node.js", "node js", "nodejs", "node"]),
        ("react", &["reactjs", "react.js", "react js", "react"]),
        ("reactnative", &["react native", "react-native", "reactnative"]),
        ("vue", &["vue.js", "vuejs", "vue js", "vue", "vue3"]),
        ("angular", &["angularjs", "angular.js", "angular"]),
        ("svelte", &["sveltejs", "svelte.js", "svelte"]),
        ("nextjs", &["next.js", "nextjs", "next js"]),
        ("css", &["css", "css3", "cascading style sheets"]),
        ("sass", &["scss", "sass"]),
        ("tailwind", &["tailwindcss", "tailwind css", "tailwind"]),
        ("html", &["html", "html5"]),
        ("graphql", &["graph ql", "gql", "graphql"]),
        ("rest", &["rest api", "restful", "rest"]),
        ("express", &["express.js", "expressjs", "express js", "express"]),
        ("django", &["django rest framework", "drf", "django"]),
        ("flask", &["python flask", "flask"]),
        ("fastapi", &["fast api", "fastapi"]),
        ("spring", &["spring boot", "springboot", "spring"]),
        ("rails", &["ruby on rails", "ror", "rails"]),
        ("laravel", &["php laravel", "laravel"]),
        ("postgresql", &["postgres", "pg", "postgresql", "postgre sql"]),
        ("mysql", &["my sql", "mysql", "mariadb"]),
        ("mongodb", &["mongo", "mongo db", "mongodb"]),
        ("redis", &["redis cache", "redis"]),
        ("sqlite", &["sqlite3", "sqlite"]),
        ("elasticsearch", &["elastic search", "elasticsearch"]),
        ("aws", &["amazon web services", "aws cloud", "aws"]),
        ("gcp", &["google cloud platform", "google cloud", "gcp"]),
        ("azure", &["microsoft azure", "ms azure", "azure"]),
        ("firebase", &["google firebase", "firebase"]),
        ("docker", &["docker container", "containerization", "docker"]),
        ("kubernetes", &["k8s", "kube", "kubernetes"]),
        ("terraform", &["infrastructure as code", "iac", "terraform"]),
        ("git", &["version control", "github", "gitlab", "git"]),
        ("cicd", &["ci/cd", "ci cd", "continuous integration", "cicd"]),
        ("python", &["python3", "python 3", "py", "python"]),
        ("java", &["java8", "java11", "java17", "openjdk", "java"]),
        ("csharp", &["c#", "c sharp", "csharp", ".net", "dotnet"]),
        ("cplusplus", &["c++", "cpp", "c plus plus"]),
        ("golang", &["go", "golang", "go lang"]),
        ("rust", &["rust lang", "rust language", "rust"]),
        ("php", &["php7", "php8", "php"]),
        ("ruby", &["ruby lang", "ruby"]),
        ("swift", &["ios swift", "swift"]),
        ("kotlin", &["kotlin jvm", "kotlin"]),
        ("flutter", &["dart flutter", "flutter"]),
        ("ml", &["machine learning", "ml"]),
        ("tensorflow", &["tensor flow", "tensorflow"]),
        ("pytorch", &["py torch", "torch", "pytorch"]),
        ("pandas", &["python pandas", "pandas"]),
        ("figma", &["figma design", "figma"]),
        ("uiux", &["ui/ux", "ui ux", "ux design", "ui design", "uiux"]),
        ("jest", &["jest testing", "jest"]),
        ("cypress", &["cypress testing", "e2e testing", "cypress"]),
        ("pytest", &["python testing", "py test", "pytest"]),
        ("websockets", &["web sockets", "websocket", "websockets"]),
        ("zustand", &["zustand"]),
        ("webrtc", &["web rtc", "webrtc"]),
    ];

    let mut map = HashMap::new();
    for (canonical, alias_list) in aliases {
        map.insert(*canonical, *canonical);
        for alias in *alias_list {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Same table keyed by separator-stripped form, to absorb punctuation noise
/// like "node-js" or "react_native".
static COMPACT_ALIAS_TO_CANONICAL: LazyLock<HashMap<String, &'static str>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
            map.entry(compact_key(alias)).or_insert(*canonical);
        }
        map
    });

fn nfkc_lower_trim(input: &str) -> String {
    input.nfkc().collect::<String>().trim().to_lowercase()
}

fn compact_key(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '/' | ','))
        .collect()
}

fn split_segments(input: &str) -> impl Iterator<Item = String> + '_ {
    input
        .split(|c: char| matches!(c, ' ' | '/' | ',' | ';' | '|' | '+'))
        .map(nfkc_lower_trim)
        .filter(|s| !s.is_empty())
}

fn fuzzy_match_canonical(compact: &str) -> Option<String> {
    if compact.len() < 5 {
        return None;
    }

    let mut best: Option<(&str, usize)> = None;
    for (alias, canonical) in COMPACT_ALIAS_TO_CANONICAL.iter() {
        // Short tokens (go, php, vue) are exact-match only: one edit on a
        // three-letter alias is a different word, not a typo.
        if alias.len() < 5 || canonical.len() < 5 {
            continue;
        }

        let distance = damerau_levenshtein(compact, alias);
        if distance == 0 {
            return Some((*canonical).to_string());
        }

        let len = compact.len().max(alias.len());
        let acceptable = distance == 1 || (len >= 8 && distance == 2);
        if !acceptable {
            continue;
        }

        match best {
            None => best = Some((canonical, distance)),
            Some((_, best_dist)) if distance < best_dist => best = Some((canonical, distance)),
            _ => {}
        }
    }

    best.map(|(canonical, _)| canonical.to_string())
}

fn match_canonical_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    if let Some(canonical) = ALIAS_TO_CANONICAL.get(token) {
        return Some((*canonical).to_string());
    }

    let compact = compact_key(token);
    if let Some(canonical) = COMPACT_ALIAS_TO_CANONICAL.get(&compact) {
        return Some((*canonical).to_string());
    }

    fuzzy_match_canonical(&compact)
}

/// Canonicalize a single skill string.
pub fn normalize_skill(skill: &str) -> String {
    let normalized = nfkc_lower_trim(skill);
    if let Some(canonical) = match_canonical_token(&normalized) {
        return canonical;
    }

    for segment in split_segments(skill) {
        if let Some(canonical) = match_canonical_token(&segment) {
            return canonical;
        }
    }

    normalized
}

/// Canonicalize a skill list into a set for overlap comparison.
pub fn normalize_skill_set(skills: &[String]) -> HashSet<String> {
    skills
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| normalize_skill(s))
        .collect()
}

/// Canonicalize, dedupe, and sort a skill list for storage.
pub fn normalize_skills_vec(skills: &[String]) -> Vec<String> {
    let mut result: Vec<String> = skills
        .iter()
        .map(|s| normalize_skill(s))
        .filter(|s| s.len() >= 2)
        .collect();
    result.sort();
    result.dedup();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_and_case_collapse() {
        assert_eq!(normalize_skill("JavaScript"), "javascript");
        assert_eq!(normalize_skill("js"), "javascript");
        assert_eq!(normalize_skill("K8s"), "kubernetes");
        assert_eq!(normalize_skill("C#"), "csharp");
        assert_eq!(normalize_skill("Node.js"), "nodejs");
    }

    #[test]
    fn separators_are_absorbed() {
        assert_eq!(normalize_skill("react-native"), "reactnative");
        assert_eq!(normalize_skill("React JS"), "react");
        assert_eq!(normalize_skill("UI/UX"), "uiux");
    }

    #[test]
    fn small_typos_on_long_aliases_still_match() {
        assert_eq!(normalize_skill("javascirpt"), "javascript");
        assert_eq!(normalize_skill("kuberntes"), "kubernetes");
        assert_eq!(normalize_skill("pytroch"), "pytorch");
    }

    #[test]
    fn short_tokens_never_fuzzy_match() {
        assert_eq!(normalize_skill("javaa"), "javaa");
        assert_eq!(normalize_skill("rustt"), "rustt");
        assert_eq!(normalize_skill("ab"), "ab");
    }

    #[test]
    fn unknown_skills_lowercase_untouched() {
        assert_eq!(normalize_skill("MyInternalTool"), "myinternaltool");
    }

    #[test]
    fn project_and_candidate_spellings_meet_in_the_middle() {
        let required = normalize_skill_set(&["React.js".to_string(), "K8s".to_string()]);
        let offered = normalize_skill_set(&["react".to_string(), "kubernetes".to_string()]);
        assert_eq!(required, offered);
    }

    #[test]
    fn storage_form_sorts_and_dedupes() {
        let normalized = normalize_skills_vec(&[
            "Python".to_string(),
            "python".to_string(),
            " JS ".to_string(),
            "javascript".to_string(),
        ]);
        assert_eq!(normalized, vec!["javascript".to_string(), "python".to_string()]);
    }
}
