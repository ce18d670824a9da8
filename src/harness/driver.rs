//! Driver program composition and run reporting.
//!
//! A run is a single interpreter invocation. The harness composes a small
//! driver program that executes the submission, then each test case, all in
//! one shared namespace, and reports per-phase outcomes over a reserved line
//! protocol on stderr. Stdout stays reserved for the learner's own output,
//! so what the capture buffer holds after a run is exactly what the
//! submission and its tests printed, in order.
//!
//! Submissions cannot forge report lines: reaching stderr requires `sys`,
//! which the safety filter denies, and every exception a submission raises
//! is caught inside the driver before it could produce a traceback.

use crate::harness::executor::TestCase;

/// Prefix of harness report lines on the interpreter's stderr.
pub const REPORT_PREFIX: &str = "::tdd-harness::";

const DRIVER_PRELUDE: &str = r#"import io as __h_io
import sys as __h_sys

__h_ns = {"__name__": "__main__"}

def __h_report(line):
    __h_sys.stderr.write("@PREFIX@" + line + "\n")
    __h_sys.stderr.flush()

def __h_describe(exc):
    name = type(exc).__name__
    try:
        text = str(exc)
    except BaseException:
        text = ""
    msg = name + ": " + text if text else name
    return msg.replace("\\", "\\\\").replace("\r", "").replace("\n", "\\n")
"#;

const SESSION_BLOCK: &str = r#"
__h_saved = __h_sys.stdout
__h_sys.stdout = __h_io.StringIO()
try:
    exec(compile(@CODE@, "<session>", "exec"), __h_ns)
except BaseException:
    pass
finally:
    __h_sys.stdout = __h_saved
"#;

const USER_BLOCK: &str = r#"
__h_ok = False
try:
    exec(compile(@CODE@, "<exercise>", "exec"), __h_ns)
except BaseException as __h_exc:
    __h_report("user error " + __h_describe(__h_exc))
else:
    __h_ok = True
    __h_report("user ok")
"#;

const TEST_BLOCK: &str = r#"
if __h_ok:
    try:
        exec(compile(@CODE@, "<test @NUM@>", "exec"), __h_ns)
    except BaseException as __h_exc:
        __h_report("test @INDEX@ fail " + __h_describe(__h_exc))
    else:
        __h_report("test @INDEX@ pass")
"#;

/// Escape arbitrary source text into a Python double-quoted string literal.
pub fn py_string_literal(source: &str) -> String {
    let mut literal = String::with_capacity(source.len() + 16);
    literal.push('"');
    for ch in source.chars() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if (c as u32) < 0x20 => literal.push_str(&format!("\\x{:02x}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// Compose the driver program for one run.
///
/// The submission executes first; test cases only run when it completed
/// without raising, each in submission order, each reported individually so
/// one failing test never stops the rest. `session_prelude` carries earlier
/// accepted submissions when the session preserves its namespace; it runs
/// before the submission with its output swallowed.
pub fn compose_driver(
    user_code: &str,
    tests: &[TestCase],
    session_prelude: Option<&str>,
) -> String {
    let mut program = DRIVER_PRELUDE.replace("@PREFIX@", REPORT_PREFIX);

    if let Some(prelude) = session_prelude {
        program.push_str(&SESSION_BLOCK.replace("@CODE@", &py_string_literal(prelude)));
    }

    program.push_str(&USER_BLOCK.replace("@CODE@", &py_string_literal(user_code)));

    for (index, test) in tests.iter().enumerate() {
        // The code literal goes in last; it may itself contain placeholder
        // lookalikes.
        program.push_str(
            &TEST_BLOCK
                .replace("@NUM@", &(index + 1).to_string())
                .replace("@INDEX@", &index.to_string())
                .replace("@CODE@", &py_string_literal(&test.code)),
        );
    }

    program
}

/// Outcome of one test case as reported by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedTest {
    Passed,
    Failed(String),
}

/// Everything the driver reported during one run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// The submission completed without raising.
    pub user_ok: bool,
    /// The error the submission raised, if it did.
    pub user_error: Option<String>,
    /// Per-test outcomes, tagged with the test's index.
    pub tests: Vec<(usize, ReportedTest)>,
}

/// Parse the report lines out of captured stderr.
///
/// Lines without the report prefix are ignored; the interpreter may write
/// its own diagnostics to stderr around them.
pub fn parse_run_report(stderr: &str) -> RunReport {
    let mut report = RunReport::default();

    for line in stderr.lines() {
        let Some(rest) = line.strip_prefix(REPORT_PREFIX) else {
            continue;
        };

        if rest == "user ok" {
            report.user_ok = true;
        } else if let Some(message) = rest.strip_prefix("user error ") {
            report.user_error = Some(unescape_message(message));
        } else if let Some(rest) = rest.strip_prefix("test ") {
            let mut parts = rest.splitn(2, ' ');
            let Some(Ok(index)) = parts.next().map(str::parse::<usize>) else {
                continue;
            };
            match parts.next() {
                Some("pass") => report.tests.push((index, ReportedTest::Passed)),
                Some(tail) => {
                    if let Some(message) = tail.strip_prefix("fail ") {
                        report
                            .tests
                            .push((index, ReportedTest::Failed(unescape_message(message))));
                    } else if tail == "fail" {
                        report
                            .tests
                            .push((index, ReportedTest::Failed(String::new())));
                    }
                }
                None => {}
            }
        }
    }

    report
}

/// Reverse the newline/backslash escaping applied by the driver's reporter.
fn unescape_message(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut chars = message.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Last non-report line of stderr, for runs where the interpreter died
/// before the driver could report anything.
pub fn last_exception_line(stderr: &str) -> Option<String> {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with(REPORT_PREFIX))
        .map(str::to_string)
}
