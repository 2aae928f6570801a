pub mod capacity;
pub mod collaborations;
pub mod matches;
pub mod migrations;
pub mod pool;
pub mod projects;
pub mod ratings;
pub mod users;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use capacity::{fetch_collaboration_status, CapacityFetchError};
pub use collaborations::{finish_collaboration, CollaborationStorageError, FinishOutcome};
pub use matches::{
    fetch_matches_for_project, fetch_open_matches_for_user, record_decision, DecisionOutcome,
    MatchStorageError,
};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, create_pool_from_url_checked, DbPoolError, PgPool};
pub use projects::{create_project, delete_project, ProjectInsert, ProjectStorageError};
pub use ratings::{list_pending_ratings, submit_rating, RatingStorageError};
pub use users::{freeze_inactive_users, unfreeze_user, UserStorageError};
