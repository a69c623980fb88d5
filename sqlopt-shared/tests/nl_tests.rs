/// Integration tests for natural-language SQL generation

use chrono::Utc;
use sqlopt_shared::auth::session::SessionStore;
use sqlopt_shared::llm::MockCompletionClient;
use sqlopt_shared::nl::{generate_sql, sample_schema, NlError, NlRequest, NL_MAX_TOKENS, NL_TASK_NAME};
use sqlopt_shared::quota::DAILY_LIMIT;
use sqlopt_shared::store::sqlite::SqliteStore;
use sqlopt_shared::store::Store;

const REPLY: &str = "SQL:\n```sql\nSELECT first_name, salary FROM employees ORDER BY salary DESC LIMIT 5;\n```\n\n\
                     Explanation: Sorts employees by salary.\n\nAssumptions: salary is annual";

async fn setup() -> (SqliteStore, MockCompletionClient, SessionStore) {
    let store = SqliteStore::in_memory().await.expect("Failed to open in-memory store");
    let hr = sample_schema("HR Database").expect("sample exists");
    store.save_user_schema("ada@example.com", hr).await.unwrap();
    (store, MockCompletionClient::new(), SessionStore::new())
}

fn request(session_id: uuid::Uuid, question: &str) -> NlRequest {
    NlRequest {
        session_id,
        question: question.to_string(),
        include_explanation: true,
    }
}

#[tokio::test]
async fn test_generation_parses_reply_and_logs() {
    let (store, llm, sessions) = setup().await;
    let now = Utc::now();
    let session = sessions.create("ada@example.com", "Ada", false, now).await;
    llm.push_response(REPLY, Some(210));

    let outcome = generate_sql(&store, &llm, &sessions, request(session.id, " top 5 salaries "), now)
        .await
        .unwrap();

    assert_eq!(outcome.query.question, "top 5 salaries");
    assert_eq!(
        outcome.query.sql,
        "SELECT first_name, salary FROM employees ORDER BY salary DESC LIMIT 5;"
    );
    assert_eq!(outcome.query.explanation.as_deref(), Some("Sorts employees by salary."));
    assert_eq!(outcome.query.assumptions.as_deref(), Some("salary is annual"));
    assert_eq!(outcome.tokens_used, Some(210));
    assert_eq!(outcome.quota.as_ref().map(|q| q.remaining), Some(DAILY_LIMIT - 1));

    let sent = &llm.requests()[0];
    assert!(sent.prompt.contains("CREATE TABLE employees"));
    assert!(sent.prompt.contains("\"top 5 salaries\""));
    assert_eq!(sent.max_tokens, NL_MAX_TOKENS);

    let logs = store.recent_logs_for_user("ada@example.com", 5).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].success);
    assert_eq!(logs[0].task_type, NL_TASK_NAME);
    assert_eq!(logs[0].query_length, 14);

    // Generation doesn't write history on its own
    assert!(store.list_history("ada@example.com", 50).await.unwrap().is_empty());

    let stored = sessions.get(session.id).await.unwrap();
    assert_eq!(stored.last_generated, Some(outcome.query));
    assert_eq!(stored.quota.count, 1);
}

#[tokio::test]
async fn test_failed_generation_keeps_quota() {
    let (store, llm, sessions) = setup().await;
    let now = Utc::now();
    let session = sessions.create("ada@example.com", "Ada", false, now).await;
    llm.push_failure("connection reset");

    let err = generate_sql(&store, &llm, &sessions, request(session.id, "top 5 salaries"), now)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Error generating SQL: Request failed: connection reset");

    let logs = store.recent_logs_for_user("ada@example.com", 5).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert!(!logs[0].success);
    assert_eq!(logs[0].task_type, NL_TASK_NAME);

    let stored = sessions.get(session.id).await.unwrap();
    assert_eq!(stored.quota.count, 0);
    assert!(stored.last_generated.is_none());
}

#[tokio::test]
async fn test_quota_is_checked_before_calling_out() {
    let (store, llm, sessions) = setup().await;
    let now = Utc::now();
    let session = sessions.create("ada@example.com", "Ada", false, now).await;
    sessions
        .update(session.id, |s| s.quota.count = DAILY_LIMIT)
        .await;

    let err = generate_sql(&store, &llm, &sessions, request(session.id, "anything"), now)
        .await
        .unwrap_err();

    assert!(matches!(err, NlError::QuotaExceeded(_)));
    assert!(llm.requests().is_empty());
    assert!(store.recent_logs_for_user("ada@example.com", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admins_are_not_counted() {
    let (store, llm, sessions) = setup().await;
    let now = Utc::now();
    let session = sessions.create("ada@example.com", "Ada", true, now).await;
    sessions
        .update(session.id, |s| s.quota.count = DAILY_LIMIT)
        .await;

    let outcome = generate_sql(&store, &llm, &sessions, request(session.id, "anything"), now)
        .await
        .unwrap();

    assert!(outcome.quota.is_none());
    assert_eq!(sessions.get(session.id).await.unwrap().quota.count, DAILY_LIMIT);
}

#[tokio::test]
async fn test_empty_question_and_missing_schema() {
    let (store, llm, sessions) = setup().await;
    let now = Utc::now();

    let ada = sessions.create("ada@example.com", "Ada", false, now).await;
    let err = generate_sql(&store, &llm, &sessions, request(ada.id, "   "), now)
        .await
        .unwrap_err();
    assert!(matches!(err, NlError::EmptyQuestion));

    let bob = sessions.create("bob@example.com", "Bob", false, now).await;
    let err = generate_sql(&store, &llm, &sessions, request(bob.id, "count rows"), now)
        .await
        .unwrap_err();
    assert!(matches!(err, NlError::SchemaMissing));

    assert!(llm.requests().is_empty());
    assert_eq!(sessions.get(bob.id).await.unwrap().quota.count, 0);
}
