use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::{DbPoolError, PgPool};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to build pool: {0}")]
    PoolBuild(#[from] DbPoolError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "core tables for users, projects, matches, collaborations, ratings",
        sql: r#"
CREATE TABLE IF NOT EXISTS konverge.users (
    user_id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    bio TEXT,
    skills TEXT[] NOT NULL DEFAULT '{}',
    account_status TEXT NOT NULL DEFAULT 'active',
    rating DOUBLE PRECISION,
    engagement_score DOUBLE PRECISION,
    last_active_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS konverge.projects (
    project_id BIGSERIAL PRIMARY KEY,
    owner_id BIGINT NOT NULL REFERENCES konverge.users(user_id),
    title TEXT NOT NULL,
    description TEXT,
    required_skills TEXT[] NOT NULL DEFAULT '{}',
    status TEXT NOT NULL DEFAULT 'Open',
    roles_available INT NOT NULL DEFAULT 1,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_projects_owner_open
    ON konverge.projects(owner_id)
    WHERE status = 'Open';

CREATE TABLE IF NOT EXISTS konverge.project_matches (
    match_id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES konverge.projects(project_id) ON DELETE CASCADE,
    recommended_user_id BIGINT NOT NULL REFERENCES konverge.users(user_id),
    required_skill TEXT NOT NULL,
    skill_match_score DOUBLE PRECISION NOT NULL,
    engagement_snapshot DOUBLE PRECISION,
    rating_snapshot DOUBLE PRECISION,
    owner_decision TEXT NOT NULL DEFAULT 'pending',
    user_decision TEXT NOT NULL DEFAULT 'pending',
    state TEXT NOT NULL DEFAULT 'open',
    source_type TEXT NOT NULL DEFAULT 'recommended',
    decision_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    decided_at TIMESTAMPTZ,
    UNIQUE (project_id, recommended_user_id)
);

CREATE INDEX IF NOT EXISTS idx_project_matches_user_open
    ON konverge.project_matches(recommended_user_id)
    WHERE state = 'open';

CREATE TABLE IF NOT EXISTS konverge.project_collaborators (
    collaboration_id BIGSERIAL PRIMARY KEY,
    project_id BIGINT NOT NULL REFERENCES konverge.projects(project_id) ON DELETE CASCADE,
    user_id BIGINT NOT NULL REFERENCES konverge.users(user_id),
    required_skill TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    completed_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX IF NOT EXISTS ux_active_collaboration_pair
    ON konverge.project_collaborators(project_id, user_id)
    WHERE status = 'active';

CREATE INDEX IF NOT EXISTS idx_collaborators_user_active
    ON konverge.project_collaborators(user_id)
    WHERE status = 'active';

CREATE TABLE IF NOT EXISTS konverge.user_ratings (
    rating_id BIGSERIAL PRIMARY KEY,
    rater_id BIGINT NOT NULL REFERENCES konverge.users(user_id),
    ratee_id BIGINT NOT NULL REFERENCES konverge.users(user_id),
    project_id BIGINT REFERENCES konverge.projects(project_id) ON DELETE SET NULL,
    score DOUBLE PRECISION,
    feedback TEXT,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    submitted_at TIMESTAMPTZ
);

CREATE INDEX IF NOT EXISTS idx_user_ratings_rater_pending
    ON konverge.user_ratings(rater_id)
    WHERE status = 'pending';
"#,
    },
    Migration {
        id: 2,
        description: "safety checks for decision values and score ranges",
        sql: r#"
DO $$
BEGIN
    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_owner_decision'
    ) THEN
        ALTER TABLE konverge.project_matches
            ADD CONSTRAINT chk_owner_decision
            CHECK (owner_decision IN ('pending', 'accepted', 'rejected'));
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_user_decision'
    ) THEN
        ALTER TABLE konverge.project_matches
            ADD CONSTRAINT chk_user_decision
            CHECK (user_decision IN ('pending', 'accepted', 'rejected'));
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_match_state'
    ) THEN
        ALTER TABLE konverge.project_matches
            ADD CONSTRAINT chk_match_state
            CHECK (state IN ('open', 'confirmed', 'closed'));
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_rating_score_range'
    ) THEN
        ALTER TABLE konverge.user_ratings
            ADD CONSTRAINT chk_rating_score_range
            CHECK (score IS NULL OR (score >= 0.0 AND score <= 5.0));
    END IF;

    IF NOT EXISTS (
        SELECT 1 FROM pg_constraint WHERE conname = 'chk_collaboration_status'
    ) THEN
        ALTER TABLE konverge.project_collaborators
            ADD CONSTRAINT chk_collaboration_status
            CHECK (status IN ('active', 'completed'));
    END IF;
END $$;
"#,
    },
];

#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client
        .batch_execute(
            "CREATE SCHEMA IF NOT EXISTS konverge;
             CREATE TABLE IF NOT EXISTS konverge.schema_migrations (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
             );",
        )
        .await?;

    for migration in MIGRATIONS {
        let already_applied: bool = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM konverge.schema_migrations WHERE id = $1)",
                &[&migration.id],
            )
            .await?
            .get(0);

        if already_applied {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO konverge.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(
            id = migration.id,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_ids_are_unique_and_ordered() {
        let mut previous = 0;
        for migration in MIGRATIONS {
            assert!(migration.id > previous, "migration ids must increase");
            previous = migration.id;
        }
    }
}
