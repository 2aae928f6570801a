//! Runtime-tunable business policies. Everything here reads from the
//! environment once at startup with conservative defaults so the caps and
//! thresholds are configuration, not literals scattered through the
//! storage layer.

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|raw| raw.parse().ok())
}

/// Per-user commitment cap: active collaborations plus owned Open projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitmentPolicy {
    pub cap: i64,
}

impl Default for CommitmentPolicy {
    fn default() -> Self {
        Self { cap: 2 }
    }
}

impl CommitmentPolicy {
    pub fn from_env() -> Self {
        Self {
            cap: env_parse::<i64>("KV_COMMITMENT_CAP")
                .filter(|cap| *cap > 0)
                .unwrap_or(2),
        }
    }

    pub fn can_accept(&self, commitments: i64) -> bool {
        commitments < self.cap
    }
}

/// Recommendation tuning for the skill-overlap matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchPolicy {
    /// Minimum overlap percentage (0-100) for a candidate to be recommended.
    pub score_threshold: f64,
    /// Maximum number of pending matches created per pitched project.
    pub recommendation_limit: usize,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            score_threshold: 30.0,
            recommendation_limit: 10,
        }
    }
}

impl MatchPolicy {
    pub fn from_env() -> Self {
        Self {
            score_threshold: env_parse::<f64>("KV_MATCH_SCORE_THRESHOLD")
                .filter(|t| (0.0..=100.0).contains(t))
                .unwrap_or(30.0),
            recommendation_limit: env_parse::<usize>("KV_MATCH_RECOMMENDATION_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(10),
        }
    }
}

/// How a submitted score folds into the ratee's running average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingPolicy {
    /// Plain mean over all completed ratings.
    SimpleMean,
    /// Exponential moving average: `alpha * new + (1 - alpha) * previous`.
    DecayedMean { alpha: f64 },
}

impl Default for RatingPolicy {
    fn default() -> Self {
        RatingPolicy::SimpleMean
    }
}

impl RatingPolicy {
    pub fn from_env() -> Self {
        match std::env::var("KV_RATING_POLICY").as_deref() {
            Ok("decayed_mean") => {
                let alpha = env_parse::<f64>("KV_RATING_DECAY_ALPHA")
                    .filter(|a| (0.0..=1.0).contains(a))
                    .unwrap_or(0.3);
                RatingPolicy::DecayedMean { alpha }
            }
            _ => RatingPolicy::SimpleMean,
        }
    }

    /// Compute the ratee's next average. `completed_mean` is the mean over
    /// all completed ratings including the one just submitted; `current` is
    /// the previously stored average, if any.
    pub fn next_rating(&self, current: Option<f64>, completed_mean: f64, new_score: f64) -> f64 {
        match self {
            RatingPolicy::SimpleMean => completed_mean,
            RatingPolicy::DecayedMean { alpha } => match current {
                Some(previous) => alpha * new_score + (1.0 - alpha) * previous,
                None => new_score,
            },
        }
    }
}

/// Valid score range for a submitted rating, inclusive.
pub const RATING_SCORE_MIN: f64 = 0.0;
pub const RATING_SCORE_MAX: f64 = 5.0;

pub fn rating_score_valid(score: f64) -> bool {
    score.is_finite() && (RATING_SCORE_MIN..=RATING_SCORE_MAX).contains(&score)
}
