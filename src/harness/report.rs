//! Rendering of run outcomes into user-facing views.
//!
//! Pure functions from a result (or a short-circuit error) to an HTML
//! fragment plus status class. All learner-controlled text is escaped before
//! it reaches markup; error messages and test descriptions can echo
//! submission content.

use serde::Serialize;

use crate::error::HarnessError;
use crate::harness::executor::ExecutionResult;

/// Status class of a rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewStatus {
    Success,
    Failure,
}

/// A rendered, injection-safe HTML fragment plus its status class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub status: ViewStatus,
    pub html: String,
}

const EMPTY_HINTS: &[&str] = &[
    "Type your solution into the editor before running the checks",
    "Start from the exercise's starter code if you are unsure where to begin",
];

const SAFETY_HINTS: &[&str] = &[
    "Exercises run in a shared sandbox; file, process and network access are disabled",
    "Solve the task with plain functions and the allowed standard library modules",
];

const RUNTIME_HINTS: &[&str] = &[
    "The Python runtime could not be loaded; check your connection and try again",
    "If the problem persists, the runtime asset may be missing or corrupted",
];

const TIMEOUT_HINTS: &[&str] = &[
    "Your code ran past the time limit; look for loops that never finish",
    "Make sure every while loop changes its own condition",
];

const ERROR_HINTS: &[&str] = &[
    "Read the error message; it names what failed",
    "Check for typos, missing colons and unbalanced parentheses",
    "Run the smallest piece of code you are unsure about first",
];

const TEST_FAILURE_HINTS: &[&str] = &[
    "Compare each failing check's description with what your function returns",
    "Add a print call to inspect intermediate values",
    "Re-read the exercise statement; an edge case may be missing",
];

/// Escape text for insertion into markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render the outcome of a completed run.
pub fn present(result: &ExecutionResult) -> RenderedView {
    if result.success {
        let mut html =
            String::from("<div class=\"exercise-output success\"><h5>All checks passed</h5>");
        if result.total_tests > 0 {
            html.push_str(&format!(
                "<p>{}/{} tests passed</p>",
                result.tests_passed, result.total_tests
            ));
            html.push_str(&detail_list(result));
        }
        html.push_str(&program_output(result));
        html.push_str("</div>");
        return RenderedView {
            status: ViewStatus::Success,
            html,
        };
    }

    if let Some(error) = &result.error {
        let mut html = String::from(
            "<div class=\"exercise-output error\"><h5>Your code raised an error</h5>",
        );
        html.push_str(&format!(
            "<pre class=\"error-detail\">{}</pre>",
            escape_html(error)
        ));
        html.push_str(&program_output(result));
        html.push_str(&hint_list(ERROR_HINTS));
        html.push_str("</div>");
        return RenderedView {
            status: ViewStatus::Failure,
            html,
        };
    }

    let mut html = String::from("<div class=\"exercise-output error\"><h5>Some checks failed</h5>");
    html.push_str(&format!(
        "<p>{}/{} tests passed</p>",
        result.tests_passed, result.total_tests
    ));
    html.push_str(&detail_list(result));
    html.push_str(&program_output(result));
    html.push_str(&hint_list(TEST_FAILURE_HINTS));
    html.push_str("</div>");
    RenderedView {
        status: ViewStatus::Failure,
        html,
    }
}

/// Render a run that never produced a result.
pub fn present_failure(error: &HarnessError) -> RenderedView {
    match error {
        HarnessError::EmptySubmission => failure_view("Nothing to run", None, EMPTY_HINTS),
        HarnessError::UnsafeSubmission { construct } => {
            failure_view("Submission not allowed", Some(construct), SAFETY_HINTS)
        }
        e if e.is_runtime_unavailable() => {
            failure_view("Python runtime unavailable", Some(&e.to_string()), RUNTIME_HINTS)
        }
        HarnessError::Timeout(_) | HarnessError::OutOfFuel => {
            failure_view("Execution took too long", Some(&error.to_string()), TIMEOUT_HINTS)
        }
        e => failure_view("Could not run your code", Some(&e.to_string()), ERROR_HINTS),
    }
}

fn failure_view(banner: &str, detail: Option<&str>, hints: &[&str]) -> RenderedView {
    let mut html = format!(
        "<div class=\"exercise-output error\"><h5>{}</h5>",
        escape_html(banner)
    );
    if let Some(detail) = detail {
        html.push_str(&format!(
            "<pre class=\"error-detail\">{}</pre>",
            escape_html(detail)
        ));
    }
    html.push_str(&hint_list(hints));
    html.push_str("</div>");
    RenderedView {
        status: ViewStatus::Failure,
        html,
    }
}

fn detail_list(result: &ExecutionResult) -> String {
    let mut html = String::from("<ul class=\"test-details\">");
    for outcome in &result.details {
        if outcome.passed {
            html.push_str(&format!(
                "<li class=\"pass\">\u{2705} {}</li>",
                escape_html(&outcome.description)
            ));
        } else {
            let message = outcome.message.as_deref().unwrap_or("failed");
            html.push_str(&format!(
                "<li class=\"fail\">\u{274c} {} &mdash; {}</li>",
                escape_html(&outcome.description),
                escape_html(message)
            ));
        }
    }
    html.push_str("</ul>");
    html
}

fn program_output(result: &ExecutionResult) -> String {
    if result.stdout.is_empty() {
        return String::new();
    }
    format!(
        "<pre class=\"program-output\">{}</pre>",
        escape_html(&result.stdout)
    )
}

fn hint_list(hints: &[&str]) -> String {
    let items: String = hints
        .iter()
        .map(|hint| format!("<li>{}</li>", escape_html(hint)))
        .collect();
    format!("<div class=\"hints\"><h6>Hints</h6><ul>{items}</ul></div>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::executor::TestOutcome;

    fn passing_result() -> ExecutionResult {
        ExecutionResult {
            success: true,
            tests_passed: 2,
            total_tests: 2,
            details: vec![
                TestOutcome {
                    description: "adds".to_string(),
                    passed: true,
                    message: None,
                },
                TestOutcome {
                    description: "handles zero".to_string(),
                    passed: true,
                    message: None,
                },
            ],
            error: None,
            stdout: String::new(),
        }
    }

    #[test]
    fn test_success_view_summarizes_tests() {
        let view = present(&passing_result());
        assert_eq!(view.status, ViewStatus::Success);
        assert!(view.html.contains("2/2 tests passed"));
        assert!(view.html.contains("adds"));
    }

    #[test]
    fn test_bare_success_has_no_test_summary() {
        let result = ExecutionResult {
            success: true,
            tests_passed: 0,
            total_tests: 0,
            details: Vec::new(),
            error: None,
            stdout: "ran\n".to_string(),
        };
        let view = present(&result);
        assert_eq!(view.status, ViewStatus::Success);
        assert!(!view.html.contains("tests passed"));
        assert!(view.html.contains("ran"));
    }

    #[test]
    fn test_partial_failure_lists_every_test_and_hints() {
        let result = ExecutionResult {
            success: false,
            tests_passed: 1,
            total_tests: 2,
            details: vec![
                TestOutcome {
                    description: "adds".to_string(),
                    passed: false,
                    message: Some("AssertionError".to_string()),
                },
                TestOutcome {
                    description: "handles zero".to_string(),
                    passed: true,
                    message: None,
                },
            ],
            error: None,
            stdout: String::new(),
        };
        let view = present(&result);
        assert_eq!(view.status, ViewStatus::Failure);
        assert!(view.html.contains("1/2 tests passed"));
        assert!(view.html.contains("AssertionError"));
        assert!(view.html.contains("class=\"hints\""));
    }

    #[test]
    fn test_user_error_view_escapes_the_message() {
        let result = ExecutionResult {
            success: false,
            tests_passed: 0,
            total_tests: 0,
            details: Vec::new(),
            error: Some("NameError: name '<script>alert(1)</script>' is not defined".to_string()),
            stdout: String::new(),
        };
        let view = present(&result);
        assert!(!view.html.contains("<script>"));
        assert!(view.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_descriptions_are_escaped() {
        let result = ExecutionResult {
            success: false,
            tests_passed: 0,
            total_tests: 1,
            details: vec![TestOutcome {
                description: "<img src=x>".to_string(),
                passed: false,
                message: Some("failed".to_string()),
            }],
            error: None,
            stdout: String::new(),
        };
        let view = present(&result);
        assert!(!view.html.contains("<img"));
    }

    #[test]
    fn test_each_failure_kind_gets_its_own_hints() {
        let empty = present_failure(&HarnessError::EmptySubmission);
        assert!(empty.html.contains("Nothing to run"));

        let unsafe_sub = present_failure(&HarnessError::UnsafeSubmission {
            construct: "use of `eval` is not allowed in exercises".to_string(),
        });
        assert!(unsafe_sub.html.contains("sandbox"));
        assert!(unsafe_sub.html.contains("eval"));

        let unavailable = present_failure(&HarnessError::RuntimeUnavailable(anyhow::anyhow!(
            "fetch failed"
        )));
        assert!(unavailable.html.contains("connection"));

        let timeout =
            present_failure(&HarnessError::Timeout(std::time::Duration::from_secs(10)));
        assert!(timeout.html.contains("time limit"));

        for view in [&empty, &unsafe_sub, &unavailable, &timeout] {
            assert_eq!(view.status, ViewStatus::Failure);
            assert!(view.html.contains("class=\"hints\""));
        }
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let result = passing_result();
        assert_eq!(present(&result), present(&result));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }
}
