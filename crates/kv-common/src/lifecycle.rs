//! Match lifecycle: a pitched project's recommended pairing moves from two
//! independent pending decisions to a confirmed collaboration (both sides
//! accept) or a closed match (either side rejects). Decisions are
//! write-once per side; terminal states accept no further input.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which side of the match is deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    Owner,
    User,
}

impl Actor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Actor::Owner => "owner",
            Actor::User => "user",
        }
    }

    pub fn other(&self) -> Actor {
        match self {
            Actor::Owner => Actor::User,
            Actor::User => Actor::Owner,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accepted,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Accepted => "accepted",
            Decision::Rejected => "rejected",
        }
    }
}

/// One side's decision slot as persisted on the match row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionState {
    #[default]
    Undecided,
    Accepted,
    Rejected,
}

impl DecisionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionState::Undecided => "pending",
            DecisionState::Accepted => "accepted",
            DecisionState::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<DecisionState> {
        match value {
            "pending" => Some(DecisionState::Undecided),
            "accepted" => Some(DecisionState::Accepted),
            "rejected" => Some(DecisionState::Rejected),
            _ => None,
        }
    }
}

impl From<Decision> for DecisionState {
    fn from(value: Decision) -> Self {
        match value {
            Decision::Accepted => DecisionState::Accepted,
            Decision::Rejected => DecisionState::Rejected,
        }
    }
}

/// The full lifecycle, derived from the two decision slots. `Confirmed` and
/// `Closed` are terminal; invalid combinations (a decision recorded after a
/// rejection) are unrepresentable by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchLifecycle {
    Open {
        owner: DecisionState,
        user: DecisionState,
    },
    Confirmed,
    Closed {
        rejected_by: Option<Actor>,
    },
}

/// What the caller must do after a decision was validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Record the decision; the match stays open waiting for the other side.
    Record,
    /// Both sides have accepted: record the decision and create the
    /// collaboration in the same transaction.
    Confirm,
    /// A rejection: record it and close the match for both sides.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("{actor} decision has already been made")]
    AlreadyDecided { actor: Actor },
    #[error("match is already {state}")]
    Terminal { state: &'static str },
}

impl MatchLifecycle {
    /// Rebuild the lifecycle from the persisted decision slots.
    pub fn from_decisions(owner: DecisionState, user: DecisionState) -> MatchLifecycle {
        if owner == DecisionState::Rejected {
            return MatchLifecycle::Closed {
                rejected_by: Some(Actor::Owner),
            };
        }
        if user == DecisionState::Rejected {
            return MatchLifecycle::Closed {
                rejected_by: Some(Actor::User),
            };
        }
        if owner == DecisionState::Accepted && user == DecisionState::Accepted {
            return MatchLifecycle::Confirmed;
        }
        MatchLifecycle::Open { owner, user }
    }

    pub fn state_str(&self) -> &'static str {
        match self {
            MatchLifecycle::Open { .. } => "open",
            MatchLifecycle::Confirmed => "confirmed",
            MatchLifecycle::Closed { .. } => "closed",
        }
    }

    /// Validate one side's decision against the current lifecycle.
    ///
    /// Does not mutate anything; the storage layer applies the returned
    /// transition inside its transaction.
    pub fn apply(&self, actor: Actor, decision: Decision) -> Result<Transition, LifecycleError> {
        let (owner, user) = match self {
            MatchLifecycle::Open { owner, user } => (*owner, *user),
            MatchLifecycle::Confirmed => {
                return Err(LifecycleError::Terminal { state: "confirmed" })
            }
            MatchLifecycle::Closed { .. } => {
                return Err(LifecycleError::Terminal { state: "closed" })
            }
        };

        let own_slot = match actor {
            Actor::Owner => owner,
            Actor::User => user,
        };
        if own_slot != DecisionState::Undecided {
            return Err(LifecycleError::AlreadyDecided { actor });
        }

        match decision {
            Decision::Rejected => Ok(Transition::Close),
            Decision::Accepted => {
                let other_slot = match actor.other() {
                    Actor::Owner => owner,
                    Actor::User => user,
                };
                if other_slot == DecisionState::Accepted {
                    Ok(Transition::Confirm)
                } else {
                    Ok(Transition::Record)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(owner: DecisionState, user: DecisionState) -> MatchLifecycle {
        MatchLifecycle::Open { owner, user }
    }

    #[test]
    fn fresh_match_records_first_accept() {
        let lifecycle = open(DecisionState::Undecided, DecisionState::Undecided);
        assert_eq!(
            lifecycle.apply(Actor::Owner, Decision::Accepted),
            Ok(Transition::Record)
        );
        assert_eq!(
            lifecycle.apply(Actor::User, Decision::Accepted),
            Ok(Transition::Record)
        );
    }

    #[test]
    fn second_accept_confirms() {
        let lifecycle = open(DecisionState::Accepted, DecisionState::Undecided);
        assert_eq!(
            lifecycle.apply(Actor::User, Decision::Accepted),
            Ok(Transition::Confirm)
        );

        let lifecycle = open(DecisionState::Undecided, DecisionState::Accepted);
        assert_eq!(
            lifecycle.apply(Actor::Owner, Decision::Accepted),
            Ok(Transition::Confirm)
        );
    }

    #[test]
    fn rejection_closes_from_any_open_state() {
        for owner in [DecisionState::Undecided, DecisionState::Accepted] {
            let lifecycle = open(owner, DecisionState::Undecided);
            assert_eq!(
                lifecycle.apply(Actor::User, Decision::Rejected),
                Ok(Transition::Close)
            );
        }
    }

    #[test]
    fn decisions_are_write_once_per_side() {
        let lifecycle = open(DecisionState::Accepted, DecisionState::Undecided);
        assert_eq!(
            lifecycle.apply(Actor::Owner, Decision::Accepted),
            Err(LifecycleError::AlreadyDecided {
                actor: Actor::Owner
            })
        );
        assert_eq!(
            lifecycle.apply(Actor::Owner, Decision::Rejected),
            Err(LifecycleError::AlreadyDecided {
                actor: Actor::Owner
            })
        );
    }

    #[test]
    fn terminal_states_reject_all_decisions() {
        for lifecycle in [
            MatchLifecycle::Confirmed,
            MatchLifecycle::Closed {
                rejected_by: Some(Actor::User),
            },
        ] {
            for actor in [Actor::Owner, Actor::User] {
                for decision in [Decision::Accepted, Decision::Rejected] {
                    assert!(matches!(
                        lifecycle.apply(actor, decision),
                        Err(LifecycleError::Terminal { .. })
                    ));
                }
            }
        }
    }

    #[test]
    fn from_decisions_derives_terminal_states() {
        assert_eq!(
            MatchLifecycle::from_decisions(DecisionState::Accepted, DecisionState::Accepted),
            MatchLifecycle::Confirmed
        );
        assert_eq!(
            MatchLifecycle::from_decisions(DecisionState::Rejected, DecisionState::Accepted),
            MatchLifecycle::Closed {
                rejected_by: Some(Actor::Owner)
            }
        );
        assert_eq!(
            MatchLifecycle::from_decisions(DecisionState::Undecided, DecisionState::Rejected),
            MatchLifecycle::Closed {
                rejected_by: Some(Actor::User)
            }
        );
        assert_eq!(
            MatchLifecycle::from_decisions(DecisionState::Accepted, DecisionState::Undecided),
            MatchLifecycle::Open {
                owner: DecisionState::Accepted,
                user: DecisionState::Undecided
            }
        );
    }

    #[test]
    fn decision_state_round_trips_through_storage_strings() {
        for state in [
            DecisionState::Undecided,
            DecisionState::Accepted,
            DecisionState::Rejected,
        ] {
            assert_eq!(DecisionState::parse(state.as_str()), Some(state));
        }
        assert_eq!(DecisionState::parse("confirmed"), None);
    }
}
