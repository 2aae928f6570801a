//! Storage-level flows that need a real database.
//!
//! Set `DATABASE_URL` to run these; without it every test returns early.
//! Fixtures use unique emails so repeated runs against the same database do
//! not collide.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use kv_common::db::collaborations::create_collaboration;
use kv_common::db::{
    create_pool_from_url_checked, finish_collaboration, record_decision, run_migrations,
    CollaborationStorageError, MatchStorageError, PgPool,
};
use kv_common::lifecycle::{Actor, Decision};
use kv_common::policy::CommitmentPolicy;

static SEQ: AtomicU32 = AtomicU32::new(0);

fn unique_tag() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{nanos}-{}", SEQ.fetch_add(1, Ordering::Relaxed))
}

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = create_pool_from_url_checked(&url)
        .await
        .expect("database reachable");
    run_migrations(&pool).await.expect("migrations apply");
    Some(pool)
}

async fn insert_user(pool: &PgPool, name: &str) -> i64 {
    let client = pool.get().await.unwrap();
    client
        .query_one(
            "INSERT INTO konverge.users (name, email) VALUES ($1, $2) RETURNING user_id",
            &[&name, &format!("{name}-{}@example.test", unique_tag())],
        )
        .await
        .unwrap()
        .get("user_id")
}

async fn insert_project(pool: &PgPool, owner_id: i64) -> i64 {
    let client = pool.get().await.unwrap();
    client
        .query_one(
            "INSERT INTO konverge.projects (owner_id, title, required_skills)
             VALUES ($1, 'storage flow project', ARRAY['rust'])
             RETURNING project_id",
            &[&owner_id],
        )
        .await
        .unwrap()
        .get("project_id")
}

async fn insert_match(pool: &PgPool, project_id: i64, user_id: i64) -> i64 {
    let client = pool.get().await.unwrap();
    client
        .query_one(
            "INSERT INTO konverge.project_matches
                (project_id, recommended_user_id, required_skill, skill_match_score)
             VALUES ($1, $2, 'rust', 100.0)
             RETURNING match_id",
            &[&project_id, &user_id],
        )
        .await
        .unwrap()
        .get("match_id")
}

async fn insert_active_collaboration(pool: &PgPool, project_id: i64, user_id: i64) -> i64 {
    let mut client = pool.get().await.unwrap();
    let tx = client.transaction().await.unwrap();
    let id = create_collaboration(&tx, project_id, user_id, "rust")
        .await
        .unwrap();
    tx.commit().await.unwrap();
    id
}

async fn active_collaboration_count(pool: &PgPool, project_id: i64, user_id: i64) -> i64 {
    let client = pool.get().await.unwrap();
    client
        .query_one(
            "SELECT COUNT(*) FROM konverge.project_collaborators
             WHERE project_id = $1 AND user_id = $2 AND status = 'active'",
            &[&project_id, &user_id],
        )
        .await
        .unwrap()
        .get(0)
}

#[tokio::test]
async fn second_create_returns_the_existing_active_collaboration() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let owner = insert_user(&pool, "owner").await;
    let member = insert_user(&pool, "member").await;
    let project = insert_project(&pool, owner).await;

    let mut client = pool.get().await.unwrap();
    let tx = client.transaction().await.unwrap();
    let first = create_collaboration(&tx, project, member, "rust")
        .await
        .unwrap();
    let second = create_collaboration(&tx, project, member, "rust")
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(active_collaboration_count(&pool, project, member).await, 1);
}

#[tokio::test]
async fn repeat_finish_reports_not_found_and_keeps_exactly_two_ratings() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let owner = insert_user(&pool, "owner").await;
    let member = insert_user(&pool, "member").await;
    let project = insert_project(&pool, owner).await;
    insert_active_collaboration(&pool, project, member).await;

    let policy = CommitmentPolicy::default();
    let outcome = finish_collaboration(&pool, &policy, project, member)
        .await
        .unwrap();
    assert_eq!(outcome.ratings_created, 2);
    assert_eq!(active_collaboration_count(&pool, project, member).await, 0);

    let err = finish_collaboration(&pool, &policy, project, member)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CollaborationStorageError::ActiveCollaborationNotFound { .. }
    ));

    let client = pool.get().await.unwrap();
    let pending: i64 = client
        .query_one(
            "SELECT COUNT(*) FROM konverge.user_ratings
             WHERE project_id = $1 AND status = 'pending'",
            &[&project],
        )
        .await
        .unwrap()
        .get(0);
    assert_eq!(pending, 2);
}

#[tokio::test]
async fn capacity_failure_rolls_back_the_whole_decision() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let owner = insert_user(&pool, "owner").await;
    let member = insert_user(&pool, "member").await;
    let other_owner = insert_user(&pool, "other-owner").await;

    // The candidate already carries one active collaboration elsewhere.
    let busy_project = insert_project(&pool, other_owner).await;
    insert_active_collaboration(&pool, busy_project, member).await;

    let project = insert_project(&pool, owner).await;
    let match_id = insert_match(&pool, project, member).await;

    let policy = CommitmentPolicy { cap: 1 };
    record_decision(
        &pool,
        &policy,
        match_id,
        Actor::Owner,
        Decision::Accepted,
        None,
    )
    .await
    .unwrap();

    let err = record_decision(
        &pool,
        &policy,
        match_id,
        Actor::User,
        Decision::Accepted,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MatchStorageError::CapacityExceeded { .. }));

    let client = pool.get().await.unwrap();
    let row = client
        .query_one(
            "SELECT user_decision, state FROM konverge.project_matches WHERE match_id = $1",
            &[&match_id],
        )
        .await
        .unwrap();
    assert_eq!(row.get::<_, String>("user_decision"), "pending");
    assert_eq!(row.get::<_, String>("state"), "open");
    assert_eq!(active_collaboration_count(&pool, project, member).await, 0);
}
