//! Merging per-adapter results into one `CombinedResult`.

use chrono::Utc;

use bastion_core::models::{CombinedResult, ResultStatus, TaskResult};

/// `ok` when every result is ok, `error` when none succeeded, otherwise
/// `partial`. No results at all is an error.
pub fn merge_status(results: &[TaskResult]) -> ResultStatus {
    if results.is_empty() {
        return ResultStatus::Error;
    }
    if results.iter().all(|r| r.status == ResultStatus::Ok) {
        ResultStatus::Ok
    } else if results.iter().all(|r| r.status == ResultStatus::Error) {
        ResultStatus::Error
    } else {
        ResultStatus::Partial
    }
}

/// `"2 adapter(s): a=ok, b=error (1 ok, 0 partial, 1 error)"`.
pub fn summarize(results: &[TaskResult]) -> String {
    let count = |status: ResultStatus| results.iter().filter(|r| r.status == status).count();
    let parts: Vec<String> = results
        .iter()
        .map(|r| format!("{}={}", r.source_adapter, r.status))
        .collect();
    format!(
        "{} adapter(s): {} ({} ok, {} partial, {} error)",
        results.len(),
        parts.join(", "),
        count(ResultStatus::Ok),
        count(ResultStatus::Partial),
        count(ResultStatus::Error),
    )
}

pub fn merge_results(task_id: &str, task_type: &str, results: Vec<TaskResult>) -> CombinedResult {
    CombinedResult {
        task_id: task_id.to_string(),
        task_type: task_type.to_string(),
        status: merge_status(&results),
        summary: summarize(&results),
        results,
        completed_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::errors::AdapterError;
    use serde_json::Map;

    fn ok(name: &str) -> TaskResult {
        TaskResult::ok(name, Map::new())
    }

    fn err(name: &str) -> TaskResult {
        TaskResult::failed(
            name,
            &AdapterError::Timeout {
                adapter: name.to_string(),
                timeout_secs: 1.0,
            },
        )
    }

    #[test]
    fn status_table() {
        assert_eq!(merge_status(&[ok("a"), ok("b")]), ResultStatus::Ok);
        assert_eq!(merge_status(&[ok("a"), err("b")]), ResultStatus::Partial);
        assert_eq!(merge_status(&[err("a"), err("b")]), ResultStatus::Error);
        assert_eq!(
            merge_status(&[TaskResult::partial("a", Map::new())]),
            ResultStatus::Partial
        );
        assert_eq!(merge_status(&[]), ResultStatus::Error);
    }

    #[test]
    fn summary_format() {
        assert_eq!(
            summarize(&[ok("pentest_reasoning"), err("tool_execution")]),
            "2 adapter(s): pentest_reasoning=ok, tool_execution=error (1 ok, 0 partial, 1 error)"
        );
    }

    #[test]
    fn merge_keeps_result_order() {
        let merged = merge_results("t1", "reconnaissance", vec![err("b"), ok("a")]);
        assert_eq!(merged.results[0].source_adapter, "b");
        assert_eq!(merged.status, ResultStatus::Partial);
        assert_eq!(merged.task_type, "reconnaissance");
    }
}
