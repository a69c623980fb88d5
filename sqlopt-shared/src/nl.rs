/// Natural-language to SQL
///
/// A user stores one database schema (`CREATE TABLE` statements) and then asks
/// questions in plain English. Each question is sent to the completion API
/// together with the schema; the reply is split into the SQL, an optional
/// explanation and any assumptions the model made.
///
/// ```text
/// generate_sql()
///   ├─> reject an empty question (no quota, no API call)
///   ├─> refuse when a non-admin session has no analyses left
///   ├─> load the user's schema
///   ├─> build prompt, call the completion client
///   ├─> success: consume one quota unit, log row, remember the result
///   └─> failure: log row with success=false, quota untouched
/// ```
///
/// Unlike an analysis, the quota unit is only spent once the call succeeds.
///
/// # Example
///
/// ```
/// use sqlopt_shared::nl::parse_response;
///
/// let reply = "SQL:\n```sql\nSELECT * FROM customers\n```\n\nExplanation: Lists customers.";
/// let generated = parse_response("show customers", reply);
///
/// assert_eq!(generated.sql, "SELECT * FROM customers");
/// assert_eq!(generated.explanation.as_deref(), Some("Lists customers."));
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::session::SessionStore;
use crate::llm::{CompletionClient, CompletionRequest, DEFAULT_TEMPERATURE};
use crate::models::query_history::NewQueryHistory;
use crate::models::query_log::NewQueryLog;
use crate::quota::{QuotaCheckResult, QuotaError};
use crate::store::{Store, StoreError};

/// Task name recorded in logs and history
pub const NL_TASK_NAME: &str = "Natural Language";

/// Response length cap for SQL generation
pub const NL_MAX_TOKENS: u32 = 1000;

/// File name offered when downloading generated SQL
pub const DOWNLOAD_FILENAME: &str = "generated_query.sql";

/// Characters of the question kept in a saved history name
const HISTORY_NAME_CHARS: usize = 50;

const SQL_FENCE: &str = "```sql";
const FENCE: &str = "```";
const SQL_MARKER: &str = "SQL:";
const EXPLANATION_MARKER: &str = "Explanation:";
const ASSUMPTIONS_MARKER: &str = "Assumptions:";

const ECOMMERCE_SCHEMA: &str = "CREATE TABLE customers (
    customer_id INT PRIMARY KEY,
    first_name VARCHAR(50),
    last_name VARCHAR(50),
    email VARCHAR(100) UNIQUE,
    city VARCHAR(100),
    state VARCHAR(50),
    country VARCHAR(50),
    created_at TIMESTAMP
);

CREATE TABLE products (
    product_id INT PRIMARY KEY,
    product_name VARCHAR(200),
    category VARCHAR(100),
    price DECIMAL(10,2),
    stock_quantity INT,
    created_at TIMESTAMP
);

CREATE TABLE orders (
    order_id INT PRIMARY KEY,
    customer_id INT REFERENCES customers(customer_id),
    order_date TIMESTAMP,
    total_amount DECIMAL(10,2),
    status VARCHAR(50)
);

CREATE TABLE order_items (
    order_item_id INT PRIMARY KEY,
    order_id INT REFERENCES orders(order_id),
    product_id INT REFERENCES products(product_id),
    quantity INT,
    unit_price DECIMAL(10,2)
);
";

const HR_SCHEMA: &str = "CREATE TABLE employees (
    employee_id INT PRIMARY KEY,
    first_name VARCHAR(50),
    last_name VARCHAR(50),
    email VARCHAR(100),
    hire_date DATE,
    job_title VARCHAR(100),
    salary DECIMAL(10,2),
    department_id INT,
    manager_id INT
);

CREATE TABLE departments (
    department_id INT PRIMARY KEY,
    department_name VARCHAR(100),
    location VARCHAR(100)
);

CREATE TABLE attendance (
    attendance_id INT PRIMARY KEY,
    employee_id INT REFERENCES employees(employee_id),
    date DATE,
    check_in TIME,
    check_out TIME,
    status VARCHAR(20)
);
";

const SCHOOL_SCHEMA: &str = "CREATE TABLE students (
    student_id INT PRIMARY KEY,
    first_name VARCHAR(50),
    last_name VARCHAR(50),
    email VARCHAR(100),
    enrollment_date DATE,
    grade_level INT
);

CREATE TABLE courses (
    course_id INT PRIMARY KEY,
    course_name VARCHAR(100),
    credits INT,
    department VARCHAR(50)
);

CREATE TABLE enrollments (
    enrollment_id INT PRIMARY KEY,
    student_id INT REFERENCES students(student_id),
    course_id INT REFERENCES courses(course_id),
    semester VARCHAR(20),
    grade VARCHAR(2)
);

CREATE TABLE teachers (
    teacher_id INT PRIMARY KEY,
    first_name VARCHAR(50),
    last_name VARCHAR(50),
    email VARCHAR(100),
    department VARCHAR(50)
);
";

/// Built-in schemas offered for a quick start, in display order
pub const SAMPLE_SCHEMAS: &[(&str, &str)] = &[
    ("E-commerce", ECOMMERCE_SCHEMA),
    ("HR Database", HR_SCHEMA),
    ("School Database", SCHOOL_SCHEMA),
];

const ECOMMERCE_EXAMPLES: &[&str] = &[
    "Show me all customers from California",
    "What are the top 10 best-selling products?",
    "Find all orders from last month over $1000",
    "Which customers haven't made any orders?",
    "Calculate total revenue by product category",
];

const HR_EXAMPLES: &[&str] = &[
    "List all employees in the IT department",
    "Who are the top 5 highest paid employees?",
    "Show employees who have been here more than 5 years",
    "Find all employees who report to John Smith",
    "What is the average salary by department?",
];

const SCHOOL_EXAMPLES: &[&str] = &[
    "Show all students enrolled in Computer Science",
    "Which courses have more than 30 students?",
    "Find students with GPA above 3.5",
    "List all courses taught by Professor Johnson",
    "What is the average grade for each course?",
];

const GENERIC_EXAMPLES: &[&str] = &[
    "Show all records from the main table",
    "Count the total number of records",
    "Find the most recent entries",
    "Group data by category and count",
    "Show records that meet multiple conditions",
];

/// Natural-language error types
#[derive(Debug, thiserror::Error)]
pub enum NlError {
    /// Question was empty or whitespace
    #[error("Please enter a question")]
    EmptyQuestion,

    /// Schema text was empty or whitespace
    #[error("Please paste your schema")]
    EmptySchema,

    /// Schema text has no `CREATE TABLE` statement
    #[error("Invalid schema format. Please check your CREATE TABLE statements.")]
    InvalidSchema,

    /// No built-in schema has this name
    #[error("Unknown sample schema: {0}")]
    UnknownSample(String),

    /// User hasn't stored a schema yet
    #[error("Please set up your database schema first")]
    SchemaMissing,

    /// Session vanished between authentication and dispatch
    #[error("Session not found")]
    SessionNotFound,

    /// Daily limit reached
    #[error("{0}")]
    QuotaExceeded(QuotaError),

    /// Completion call failed; the attempt has been logged
    #[error("Error generating SQL: {0}")]
    CompletionFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Where a schema comes from when it is saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// One of [`SAMPLE_SCHEMAS`], by name
    Sample(String),

    /// Pasted or uploaded DDL
    Text(String),
}

/// SQL generated for one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    /// Question as asked
    pub question: String,

    /// Extracted SQL, possibly empty when the model didn't produce any
    pub sql: String,

    pub explanation: Option<String>,

    pub assumptions: Option<String>,
}

impl GeneratedQuery {
    /// History row for "Save to History"
    pub fn history_entry(&self, user_email: &str, now: DateTime<Utc>) -> NewQueryHistory {
        let short: String = self.question.chars().take(HISTORY_NAME_CHARS).collect();
        NewQueryHistory {
            user_email: user_email.to_string(),
            query_text: self.sql.clone(),
            task_type: NL_TASK_NAME.to_string(),
            result_text: Some(format!("Generated from: {}", self.question)),
            query_name: Some(format!("NL: {}", short)),
            created_at: now,
        }
    }
}

/// One question to answer
#[derive(Debug, Clone)]
pub struct NlRequest {
    pub session_id: Uuid,
    pub question: String,
    pub include_explanation: bool,
}

/// Successful generation
#[derive(Debug, Clone)]
pub struct NlOutcome {
    pub query: GeneratedQuery,

    pub tokens_used: Option<i64>,

    /// Quota after this generation; `None` for admins
    pub quota: Option<QuotaCheckResult>,
}

/// Looks up a built-in schema by name
pub fn sample_schema(name: &str) -> Option<&'static str> {
    SAMPLE_SCHEMAS
        .iter()
        .find(|(sample, _)| *sample == name)
        .map(|(_, ddl)| *ddl)
}

/// Whether text looks like a set of `CREATE TABLE` statements
pub fn validate_schema(schema: &str) -> bool {
    schema.to_uppercase().contains("CREATE TABLE") && schema.contains('(') && schema.contains(')')
}

/// Resolves a schema source to the DDL that gets stored
///
/// # Errors
///
/// `UnknownSample`, `EmptySchema` or `InvalidSchema`
pub fn resolve_schema(source: SchemaSource) -> Result<String, NlError> {
    match source {
        SchemaSource::Sample(name) => sample_schema(&name)
            .map(str::to_string)
            .ok_or(NlError::UnknownSample(name)),
        SchemaSource::Text(text) if text.trim().is_empty() => Err(NlError::EmptySchema),
        SchemaSource::Text(text) if !validate_schema(&text) => Err(NlError::InvalidSchema),
        SchemaSource::Text(text) => Ok(text),
    }
}

/// Suggested questions matching the kind of schema
pub fn example_questions(schema: &str) -> &'static [&'static str] {
    let lower = schema.to_lowercase();
    if lower.contains("customers") || lower.contains("orders") {
        ECOMMERCE_EXAMPLES
    } else if lower.contains("employees") || lower.contains("departments") {
        HR_EXAMPLES
    } else if lower.contains("students") || lower.contains("courses") {
        SCHOOL_EXAMPLES
    } else {
        GENERIC_EXAMPLES
    }
}

/// Builds the generation prompt
pub fn build_prompt(schema: &str, question: &str, include_explanation: bool) -> String {
    let (explain_request, explain_format) = if include_explanation {
        (
            "Also provide a brief explanation of what the query does.",
            "Explanation: [brief explanation of what the query does]",
        )
    } else {
        ("", "")
    };

    format!(
        "Given the following database schema:

{schema}

Convert this natural language query to SQL:
\"{question}\"

Requirements:
1. Generate syntactically correct SQL
2. Use only tables and columns that exist in the schema
3. Make reasonable assumptions for ambiguous requests
4. If the query cannot be answered with the given schema, explain why

{explain_request}

Format your response as:
SQL:
```sql
[your SQL query here]
```

{explain_format}

If there are any assumptions made, list them as:
Assumptions: [list any assumptions]
"
    )
}

/// Splits a model reply into SQL, explanation and assumptions
///
/// The SQL is the first fenced ```` ```sql ```` block; an unclosed fence runs
/// to the end of the reply. Without a fence, [`extract_sql_from_response`]
/// is used.
pub fn parse_response(question: &str, text: &str) -> GeneratedQuery {
    let sql = match text.find(SQL_FENCE) {
        Some(start) => {
            let body = &text[start + SQL_FENCE.len()..];
            let end = body.find(FENCE).unwrap_or(body.len());
            body[..end].trim().to_string()
        }
        None => extract_sql_from_response(text),
    };

    let explanation = text.split(EXPLANATION_MARKER).nth(1).map(|rest| {
        rest.split(ASSUMPTIONS_MARKER)
            .next()
            .unwrap_or(rest)
            .trim()
            .to_string()
    });
    let assumptions = text
        .split(ASSUMPTIONS_MARKER)
        .nth(1)
        .map(|rest| rest.trim().to_string());

    GeneratedQuery {
        question: question.to_string(),
        sql,
        explanation: explanation.filter(|s| !s.is_empty()),
        assumptions: assumptions.filter(|s| !s.is_empty()),
    }
}

/// Collects the non-blank lines after a `SQL:` line
///
/// Collection stops at a line starting with `Explanation:` or `Assumptions:`
/// and resumes only after another `SQL:` line.
pub fn extract_sql_from_response(text: &str) -> String {
    let mut lines = Vec::new();
    let mut in_sql = false;

    for line in text.split('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with(SQL_MARKER) {
            in_sql = true;
        } else if trimmed.starts_with(EXPLANATION_MARKER) || trimmed.starts_with(ASSUMPTIONS_MARKER) {
            in_sql = false;
        } else if in_sql && !trimmed.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}

fn log_row(
    email: &str,
    query_length: i64,
    tokens_used: Option<i64>,
    error_message: Option<String>,
    now: DateTime<Utc>,
) -> NewQueryLog {
    NewQueryLog {
        user_email: email.to_string(),
        task_type: NL_TASK_NAME.to_string(),
        query_length,
        tokens_used,
        success: error_message.is_none(),
        error_message,
        created_at: now,
    }
}

/// Generates SQL for one question
///
/// # Errors
///
/// - `EmptyQuestion` before anything else is touched
/// - `QuotaExceeded` when a non-admin session has used its daily analyses
/// - `SchemaMissing` when the user has no stored schema
/// - `CompletionFailed` when the completion call fails
pub async fn generate_sql(
    store: &dyn Store,
    llm: &dyn CompletionClient,
    sessions: &SessionStore,
    request: NlRequest,
    now: DateTime<Utc>,
) -> Result<NlOutcome, NlError> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(NlError::EmptyQuestion);
    }

    let session = sessions
        .get(request.session_id)
        .await
        .ok_or(NlError::SessionNotFound)?;

    if !session.is_admin {
        let check = session.quota.check(now);
        if !check.allowed {
            return Err(NlError::QuotaExceeded(QuotaError::LimitExceeded {
                limit: check.limit,
                current: check.current,
                reset_at: check.reset_at,
            }));
        }
    }

    let schema = store
        .find_user_schema(&session.email)
        .await?
        .ok_or(NlError::SchemaMissing)?;

    let email = session.email;
    let query_length = question.chars().count() as i64;
    let prompt = build_prompt(&schema.schema_text, question, request.include_explanation);

    info!(
        user = %email,
        model = llm.model(),
        query_length,
        include_explanation = request.include_explanation,
        "Generating SQL from question"
    );

    let completion_request = CompletionRequest {
        prompt,
        temperature: DEFAULT_TEMPERATURE,
        max_tokens: NL_MAX_TOKENS,
    };
    let completion = match llm.complete(completion_request).await {
        Ok(completion) => completion,
        Err(e) => {
            let message = e.to_string();
            warn!(user = %email, error = %message, "SQL generation failed");

            let log = log_row(&email, query_length, None, Some(message.clone()), now);
            if let Err(log_err) = store.insert_query_log(log).await {
                warn!(error = %log_err, "Failed to record failed generation");
            }

            return Err(NlError::CompletionFailed(message));
        }
    };

    let query = parse_response(question, &completion.text);

    let generated = query.clone();
    let quota = sessions
        .update(request.session_id, |session| {
            session.last_generated = Some(generated);
            if session.is_admin {
                None
            } else {
                // A concurrent request may have used the last unit meanwhile
                Some(
                    session
                        .quota
                        .try_consume(now)
                        .unwrap_or_else(|_| session.quota.check(now)),
                )
            }
        })
        .await
        .flatten();

    let log = log_row(&email, query_length, completion.tokens_used, None, now);
    if let Err(e) = store.insert_query_log(log).await {
        warn!(error = %e, "Failed to record generation");
    }

    info!(
        user = %email,
        tokens_used = ?completion.tokens_used,
        sql_length = query.sql.len(),
        "SQL generated"
    );

    Ok(NlOutcome {
        query,
        tokens_used: completion.tokens_used,
        quota,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_sql_with_explanation_and_assumptions() {
        let reply = "SQL:\n```sql\nSELECT c.first_name\nFROM customers c\nWHERE c.state = 'CA';\n```\n\n\
                     Explanation: Finds Californian customers.\n\n\
                     Assumptions: state holds two-letter codes";
        let generated = parse_response("customers in california", reply);

        assert_eq!(generated.question, "customers in california");
        assert_eq!(
            generated.sql,
            "SELECT c.first_name\nFROM customers c\nWHERE c.state = 'CA';"
        );
        assert_eq!(generated.explanation.as_deref(), Some("Finds Californian customers."));
        assert_eq!(
            generated.assumptions.as_deref(),
            Some("state holds two-letter codes")
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end() {
        let generated = parse_response("q", "```sql\nSELECT 1\n");
        assert_eq!(generated.sql, "SELECT 1");
        assert_eq!(generated.explanation, None);
        assert_eq!(generated.assumptions, None);
    }

    #[test]
    fn test_unfenced_reply_falls_back_to_sql_marker() {
        let reply = "Here you go.\nSQL:\nSELECT *\n\nFROM t\nExplanation: all rows\nSELECT ignored";
        let generated = parse_response("q", reply);

        assert_eq!(generated.sql, "SELECT *\nFROM t");
        assert_eq!(generated.explanation.as_deref(), Some("all rows\nSELECT ignored"));
    }

    #[test]
    fn test_extract_without_marker_is_empty() {
        assert_eq!(extract_sql_from_response("I cannot answer that."), "");
    }

    #[test]
    fn test_validate_schema() {
        assert!(validate_schema("create table t (a int)"));
        assert!(!validate_schema("CREATE TABLE t"));
        assert!(!validate_schema("SELECT (1)"));
        for (name, ddl) in SAMPLE_SCHEMAS {
            assert!(validate_schema(ddl), "{name} sample should validate");
        }
    }

    #[test]
    fn test_resolve_schema() {
        assert_eq!(
            resolve_schema(SchemaSource::Sample("HR Database".to_string())).unwrap(),
            HR_SCHEMA
        );
        assert!(matches!(
            resolve_schema(SchemaSource::Sample("Payroll".to_string())),
            Err(NlError::UnknownSample(name)) if name == "Payroll"
        ));
        assert!(matches!(
            resolve_schema(SchemaSource::Text("  \n".to_string())),
            Err(NlError::EmptySchema)
        ));
        assert!(matches!(
            resolve_schema(SchemaSource::Text("users(id)".to_string())),
            Err(NlError::InvalidSchema)
        ));
    }

    #[test]
    fn test_example_questions_follow_schema() {
        assert_eq!(example_questions(ECOMMERCE_SCHEMA)[0], "Show me all customers from California");
        assert_eq!(example_questions(HR_SCHEMA), HR_EXAMPLES);
        assert_eq!(example_questions(SCHOOL_SCHEMA), SCHOOL_EXAMPLES);
        assert_eq!(example_questions("CREATE TABLE widgets (id INT)"), GENERIC_EXAMPLES);
    }

    #[test]
    fn test_prompt_includes_explanation_only_when_asked() {
        let with = build_prompt("CREATE TABLE t (a INT)", "count rows", true);
        assert!(with.starts_with("Given the following database schema:\n\nCREATE TABLE t (a INT)\n\n"));
        assert!(with.contains("\"count rows\""));
        assert!(with.contains("Also provide a brief explanation"));
        assert!(with.ends_with("Assumptions: [list any assumptions]\n"));

        let without = build_prompt("CREATE TABLE t (a INT)", "count rows", false);
        assert!(!without.contains("Explanation:"));
        assert!(!without.contains("Also provide"));
    }

    #[test]
    fn test_history_entry_truncates_name() {
        let question = "x".repeat(80);
        let generated = GeneratedQuery {
            question: question.clone(),
            sql: "SELECT 1".to_string(),
            explanation: None,
            assumptions: None,
        };

        let entry = generated.history_entry("ada@example.com", Utc::now());
        assert_eq!(entry.task_type, NL_TASK_NAME);
        assert_eq!(entry.query_text, "SELECT 1");
        assert_eq!(entry.result_text, Some(format!("Generated from: {}", question)));
        assert_eq!(entry.query_name, Some(format!("NL: {}", "x".repeat(50))));
    }
}
