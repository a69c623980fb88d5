/// Integration tests for the store
///
/// Run against a private in-memory SQLite database per test, so they need no
/// external services. The same SQL runs on Postgres.

use chrono::{Duration, Utc};
use sqlopt_shared::models::query_history::NewQueryHistory;
use sqlopt_shared::models::query_log::NewQueryLog;
use sqlopt_shared::models::user::CreateUser;
use sqlopt_shared::prompt::TaskType;
use sqlopt_shared::store::sqlite::SqliteStore;
use sqlopt_shared::store::{Store, StoreError};

async fn store() -> SqliteStore {
    SqliteStore::in_memory().await.expect("Failed to open in-memory store")
}

fn new_user(email: &str, is_admin: bool) -> CreateUser {
    CreateUser {
        email: email.to_string(),
        name: email.split('@').next().unwrap_or(email).to_string(),
        password_hash: "$2b$04$placeholderplaceholderplaceholderplaceholderpla".to_string(),
        is_admin,
    }
}

fn history(email: &str, sql: &str, task: TaskType) -> NewQueryHistory {
    NewQueryHistory {
        user_email: email.to_string(),
        query_text: sql.to_string(),
        task_type: task.as_str().to_string(),
        result_text: Some("result".to_string()),
        query_name: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_health_check() {
    let store = store().await;
    store.health_check().await.expect("Health check should succeed");
    assert_eq!(store.backend(), "sqlite");
}

#[tokio::test]
async fn test_migration_status_and_pool_stats() {
    let store = store().await;

    let status = store.migration_status().await.unwrap();
    assert_eq!(status.applied_migrations, 2);
    assert_eq!(status.latest_version, Some(20250201000000));

    let stats = store.pool_stats();
    assert_eq!(stats.total_connections, stats.active_connections + stats.idle_connections);
}

#[tokio::test]
async fn test_closed_store_rejects_queries() {
    let store = store().await;

    store.close().await;

    assert!(store.health_check().await.is_err());
}

#[tokio::test]
async fn test_create_and_find_user() {
    let store = store().await;

    let created = store.create_user(new_user("ada@example.com", false)).await.unwrap();
    assert_eq!(created.email, "ada@example.com");
    assert!(!created.is_admin);

    let found = store.find_user("ada@example.com").await.unwrap().expect("user exists");
    assert_eq!(found.name, "ada");
    assert_eq!(found.password_hash, created.password_hash);

    assert!(store.find_user("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let store = store().await;
    store.create_user(new_user("ada@example.com", false)).await.unwrap();

    let err = store.create_user(new_user("ada@example.com", true)).await.unwrap_err();
    match err {
        StoreError::Conflict(message) => assert_eq!(message, "Email already exists"),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn test_user_management() {
    let store = store().await;
    store.create_user(new_user("admin@example.com", true)).await.unwrap();
    store.create_user(new_user("bob@example.com", false)).await.unwrap();
    store.create_user(new_user("ada@example.com", false)).await.unwrap();

    let all: Vec<String> = store.list_users().await.unwrap().into_iter().map(|u| u.email).collect();
    assert_eq!(all, vec!["ada@example.com", "admin@example.com", "bob@example.com"]);

    let regular: Vec<String> = store
        .list_regular_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.email)
        .collect();
    assert_eq!(regular, vec!["ada@example.com", "bob@example.com"]);

    assert!(store.set_admin("bob@example.com", true).await.unwrap());
    assert!(!store.set_admin("nobody@example.com", true).await.unwrap());
    assert_eq!(store.list_regular_users().await.unwrap().len(), 1);

    assert!(store.update_password("ada@example.com", "new-hash").await.unwrap());
    assert_eq!(store.find_user("ada@example.com").await.unwrap().unwrap().password_hash, "new-hash");

    assert!(store.delete_user("ada@example.com").await.unwrap());
    assert!(!store.delete_user("ada@example.com").await.unwrap());
}

#[tokio::test]
async fn test_history_is_newest_first() {
    let store = store().await;

    let first = store.insert_history(history("ada@example.com", "SELECT 1", TaskType::Explain)).await.unwrap();
    let second = store.insert_history(history("ada@example.com", "SELECT 2", TaskType::Test)).await.unwrap();
    store.insert_history(history("bob@example.com", "SELECT 3", TaskType::Test)).await.unwrap();

    let rows = store.list_history("ada@example.com", 50).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(rows.iter().all(|r| !r.is_favorite && r.query_name.is_none()));

    let limited = store.list_history("ada@example.com", 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_toggle_favorite_twice_restores_value() {
    let store = store().await;
    let row = store.insert_history(history("ada@example.com", "SELECT 1", TaskType::Explain)).await.unwrap();

    assert_eq!(store.toggle_favorite(row.id, "ada@example.com").await.unwrap(), Some(true));
    assert_eq!(store.list_favorites("ada@example.com").await.unwrap().len(), 1);

    assert_eq!(store.toggle_favorite(row.id, "ada@example.com").await.unwrap(), Some(false));
    assert!(store.list_favorites("ada@example.com").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_mutations_are_owner_scoped() {
    let store = store().await;
    let row = store.insert_history(history("ada@example.com", "SELECT 1", TaskType::Explain)).await.unwrap();

    assert_eq!(store.toggle_favorite(row.id, "bob@example.com").await.unwrap(), None);
    assert_eq!(store.rename_history(row.id, "bob@example.com", Some("mine")).await.unwrap(), 0);
    assert_eq!(store.delete_history(row.id, "bob@example.com").await.unwrap(), 0);
    assert!(store.find_history(row.id, "bob@example.com").await.unwrap().is_none());

    let untouched = store.find_history(row.id, "ada@example.com").await.unwrap().unwrap();
    assert!(!untouched.is_favorite);
    assert!(untouched.query_name.is_none());

    assert_eq!(store.rename_history(row.id, "ada@example.com", Some("Daily report")).await.unwrap(), 1);
    let renamed = store.find_history(row.id, "ada@example.com").await.unwrap().unwrap();
    assert_eq!(renamed.query_name.as_deref(), Some("Daily report"));

    assert_eq!(store.rename_history(row.id, "ada@example.com", None).await.unwrap(), 1);
    let cleared = store.find_history(row.id, "ada@example.com").await.unwrap().unwrap();
    assert!(cleared.query_name.is_none());

    assert_eq!(store.delete_history(row.id, "ada@example.com").await.unwrap(), 1);
    assert!(store.list_history("ada@example.com", 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_log_aggregates() {
    let store = store().await;
    let now = Utc::now();
    store.create_user(new_user("ada@example.com", false)).await.unwrap();
    store.create_user(new_user("bob@example.com", false)).await.unwrap();

    store
        .insert_query_log(NewQueryLog::success("ada@example.com", TaskType::Optimize, 10, Some(100), now))
        .await
        .unwrap();
    store
        .insert_query_log(NewQueryLog::success("ada@example.com", TaskType::Optimize, 20, Some(200), now))
        .await
        .unwrap();
    store
        .insert_query_log(NewQueryLog::failure("bob@example.com", TaskType::Explain, 30, "timeout", now))
        .await
        .unwrap();
    store
        .insert_query_log(NewQueryLog::success(
            "gone@example.com",
            TaskType::Test,
            40,
            None,
            now - Duration::days(30),
        ))
        .await
        .unwrap();

    let totals = store.usage_totals(now - Duration::days(7)).await.unwrap();
    assert_eq!(totals.total_queries, 4);
    assert_eq!(totals.successful_queries, 3);
    assert_eq!(totals.total_query_length, 100);
    assert_eq!(totals.total_tokens, 300);
    assert_eq!(totals.total_users, 2);
    assert_eq!(totals.active_users, 2);

    let by_task = store.queries_by_task().await.unwrap();
    assert_eq!(by_task[0].task_type, "Optimize");
    assert_eq!(by_task[0].count, 2);

    let top = store.top_users(10).await.unwrap();
    assert_eq!(top[0].user_email, "ada@example.com");
    assert_eq!(top[0].name, "ada");
    assert_eq!(top[0].query_count, 2);
    let gone = top.iter().find(|u| u.user_email == "gone@example.com").unwrap();
    assert_eq!(gone.name, "gone@example.com");

    let errors = store.recent_errors(10).await.unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_message.as_deref(), Some("timeout"));

    let recent = store.recent_activity(now - Duration::hours(2), 8).await.unwrap();
    assert_eq!(recent.len(), 3);

    let ada = store.log_totals_for_user("ada@example.com").await.unwrap();
    assert_eq!(ada.total_queries, 2);
    assert_eq!(ada.successful_queries, 2);

    let per_user = store.user_totals().await.unwrap();
    assert_eq!(per_user.len(), 2);
    assert_eq!(per_user[0].email, "ada@example.com");
    assert!(per_user[0].last_activity.is_some());

    let breakdown = store.user_task_counts().await.unwrap();
    assert!(breakdown
        .iter()
        .any(|row| row.user_email == "bob@example.com" && row.task_type == "Explain" && row.count == 1));
}

#[tokio::test]
async fn test_empty_aggregates() {
    let store = store().await;
    let totals = store.usage_totals(Utc::now()).await.unwrap();
    assert_eq!(totals.total_queries, 0);
    assert_eq!(totals.total_tokens, 0);
    assert!(store.queries_by_task().await.unwrap().is_empty());
    assert!(store.user_totals().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_schema_upsert_and_delete() {
    let store = store().await;
    let ddl = "CREATE TABLE users (id INT PRIMARY KEY, name TEXT)";

    assert!(store.find_user_schema("ada@example.com").await.unwrap().is_none());

    let saved = store.save_user_schema("ada@example.com", ddl).await.unwrap();
    assert_eq!(saved.schema_text, ddl);
    assert_eq!(saved.created_at, saved.updated_at);

    let replaced = store
        .save_user_schema("ada@example.com", "CREATE TABLE t (a INT)")
        .await
        .unwrap();
    assert_eq!(replaced.schema_text, "CREATE TABLE t (a INT)");
    assert_eq!(replaced.created_at, saved.created_at);
    assert!(replaced.updated_at >= saved.updated_at);

    // Each user has their own schema
    assert!(store.find_user_schema("bob@example.com").await.unwrap().is_none());

    assert!(store.delete_user_schema("ada@example.com").await.unwrap());
    assert!(!store.delete_user_schema("ada@example.com").await.unwrap());
    assert!(store.find_user_schema("ada@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_history_keeps_query_name() {
    let store = store().await;

    let mut entry = history("ada@example.com", "SELECT 1", TaskType::Explain);
    entry.query_name = Some("NL: count users".to_string());
    let saved = store.insert_history(entry).await.unwrap();

    assert_eq!(saved.query_name.as_deref(), Some("NL: count users"));
}
