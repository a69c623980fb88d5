/// Analysis task types and their prompt templates
///
/// Each analysis runs one of four fixed tasks. A task selects the template the
/// SQL is interpolated into before it is sent to the completion API.
///
/// # Tasks
///
/// | Task | Description |
/// |------|-------------|
/// | `Explain` | Get a detailed step-by-step explanation |
/// | `Optimize` | Improve performance and efficiency |
/// | `Detect Issues` | Find problems and bad practices |
/// | `Test` | Generate test data and expected results |
///
/// # Example
///
/// ```
/// use sqlopt_shared::prompt::{build_prompt, TaskType};
///
/// let task: TaskType = "Detect Issues".parse().unwrap();
/// let prompt = build_prompt(task, "SELECT * FROM users");
/// assert!(prompt.ends_with("SELECT * FROM users"));
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const QUERY_PLACEHOLDER: &str = "{sql_query}";

const EXPLAIN_TEMPLATE: &str = "Provide a comprehensive analysis of this SQL query.

Structure your response:
1. QUERY PURPOSE - What problem it solves
2. EXECUTION BREAKDOWN - Step-by-step processing
3. TECHNICAL ANALYSIS - Table relationships and logic
4. PERFORMANCE CONSIDERATIONS - Bottlenecks and scalability
5. ASSUMPTIONS & DEPENDENCIES

SQL Query:
{sql_query}";

const OPTIMIZE_TEMPLATE: &str = "Optimize this SQL query for better performance.

Provide:
1. PERFORMANCE ANALYSIS
2. OPTIMIZATION STRATEGY
3. OPTIMIZED VERSION
4. IMPLEMENTATION NOTES
5. TRADE-OFF ANALYSIS

Original SQL Query:
{sql_query}";

const DETECT_ISSUES_TEMPLATE: &str = "Analyze this query for issues.

Check for:
1. PERFORMANCE ISSUES - Inefficiencies
2. SECURITY VULNERABILITIES - Injection risks
3. MAINTAINABILITY PROBLEMS - Readability issues
4. BEST PRACTICE VIOLATIONS

Rate severity: CRITICAL, HIGH, MEDIUM, LOW

SQL Query:
{sql_query}";

const TEST_TEMPLATE: &str = "Create a test suite for this query.

Include:
1. TEST DATA DESIGN - Sample data with edge cases
2. EXPECTED RESULTS - Complete output
3. EDGE CASE SCENARIOS
4. VALIDATION CRITERIA
5. TEST EXECUTION PLAN

SQL Query to Test:
{sql_query}";

/// Analysis task selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    /// Step-by-step explanation
    #[serde(rename = "Explain")]
    Explain,

    /// Performance rewrite
    #[serde(rename = "Optimize")]
    Optimize,

    /// Problems and bad practices
    #[serde(rename = "Detect Issues")]
    DetectIssues,

    /// Test data and expected results
    #[serde(rename = "Test")]
    Test,
}

impl TaskType {
    /// All tasks in display order
    pub const ALL: [TaskType; 4] = [
        TaskType::Explain,
        TaskType::Optimize,
        TaskType::DetectIssues,
        TaskType::Test,
    ];

    /// Name as stored in `query_logs.task_type` and shown to users
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Explain => "Explain",
            TaskType::Optimize => "Optimize",
            TaskType::DetectIssues => "Detect Issues",
            TaskType::Test => "Test",
        }
    }

    /// One-line description shown next to the task selector
    pub fn description(&self) -> &'static str {
        match self {
            TaskType::Explain => "Get a detailed step-by-step explanation",
            TaskType::Optimize => "Improve performance and efficiency",
            TaskType::DetectIssues => "Find problems and bad practices",
            TaskType::Test => "Generate test data and expected results",
        }
    }

    /// Prompt template containing a `{sql_query}` placeholder
    pub fn template(&self) -> &'static str {
        match self {
            TaskType::Explain => EXPLAIN_TEMPLATE,
            TaskType::Optimize => OPTIMIZE_TEMPLATE,
            TaskType::DetectIssues => DETECT_ISSUES_TEMPLATE,
            TaskType::Test => TEST_TEMPLATE,
        }
    }

    /// File name used when a result is downloaded
    pub fn download_filename(&self) -> String {
        format!("sql_analysis_{}.txt", self.as_str().to_lowercase().replace(' ', "_"))
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown task name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown task type: {0}")]
pub struct UnknownTaskType(pub String);

impl FromStr for TaskType {
    type Err = UnknownTaskType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .iter()
            .copied()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| UnknownTaskType(s.to_string()))
    }
}

/// Interpolates the SQL into the task's template
///
/// The SQL is inserted once, verbatim. Braces inside the SQL are not
/// interpreted.
pub fn build_prompt(task: TaskType, sql: &str) -> String {
    task.template().replacen(QUERY_PLACEHOLDER, sql, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_has_one_placeholder() {
        for task in TaskType::ALL {
            assert_eq!(
                task.template().matches(QUERY_PLACEHOLDER).count(),
                1,
                "{} template",
                task
            );
        }
    }

    #[test]
    fn test_build_prompt_interpolates_once() {
        let sql = "SELECT '{sql_query}' FROM t";
        let prompt = build_prompt(TaskType::Optimize, sql);

        assert!(prompt.starts_with("Optimize this SQL query for better performance."));
        assert!(prompt.ends_with("Original SQL Query:\nSELECT '{sql_query}' FROM t"));
    }

    #[test]
    fn test_parse_task_names() {
        assert_eq!("Explain".parse::<TaskType>().unwrap(), TaskType::Explain);
        assert_eq!("Detect Issues".parse::<TaskType>().unwrap(), TaskType::DetectIssues);
        assert!("explain".parse::<TaskType>().is_err());
        assert!("Refactor".parse::<TaskType>().is_err());
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&TaskType::DetectIssues).unwrap();
        assert_eq!(json, "\"Detect Issues\"");

        let task: TaskType = serde_json::from_str("\"Test\"").unwrap();
        assert_eq!(task, TaskType::Test);
    }

    #[test]
    fn test_download_filename() {
        assert_eq!(TaskType::Explain.download_filename(), "sql_analysis_explain.txt");
        assert_eq!(
            TaskType::DetectIssues.download_filename(),
            "sql_analysis_detect_issues.txt"
        );
    }
}
