//! Static safety filtering of submissions.
//!
//! A lexical scan over the raw source text, run before anything reaches the
//! interpreter. The deny list is deliberately conservative: obfuscated code
//! can slip past it, but it must never reject a legitimate exercise
//! solution. The actual security boundary is the Wasm/WASI isolation the
//! interpreter runs under; this filter only keeps obviously hostile
//! submissions out of the shared sandbox early, with a message a learner can
//! act on.

use std::sync::LazyLock;

use regex::Regex;

/// Verdict of the static safety scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    /// Whether the source may be executed.
    pub safe: bool,
    /// Diagnostic naming the offending construct; empty when safe.
    pub reason: String,
}

impl SafetyVerdict {
    fn accept() -> Self {
        Self {
            safe: true,
            reason: String::new(),
        }
    }

    fn reject(reason: String) -> Self {
        Self {
            safe: false,
            reason,
        }
    }

    /// Whether the source may be executed.
    pub fn is_safe(&self) -> bool {
        self.safe
    }
}

/// Forbidden constructs, scanned in order. First match wins.
const DENY_RULES: &[(&str, &str)] = &[
    // Dynamic evaluation
    (r"\beval\s*\(", "eval"),
    (r"\bexec\s*\(", "exec"),
    (r"\bcompile\s*\(", "compile"),
    (r"\b__import__\b", "__import__"),
    // File access
    (r"\bopen\s*\(", "open"),
    (r"\bfile\s*\(", "file"),
    // Process and OS interaction
    (r"\bos\s*\.\s*system\b", "os.system"),
    (r"\bos\s*\.\s*popen\b", "os.popen"),
    (r"\bos\s*\.\s*_exit\b", "os._exit"),
    (r"\bsys\s*\.\s*exit\b", "sys.exit"),
    (r"\bsubprocess\b", "subprocess"),
    // Interpreter internals
    (r"__builtins__", "__builtins__"),
    (r"__globals__", "__globals__"),
    (r"__subclasses__", "__subclasses__"),
    (r"__dict__", "__dict__"),
];

/// Modules a submission may not import. Anything not listed (math, unittest,
/// typing, dataclasses, ...) is allowed.
const DENIED_MODULES: &[&str] = &[
    "os",
    "sys",
    "subprocess",
    "socket",
    "ctypes",
    "urllib",
    "http",
    "ftplib",
    "smtplib",
    "ssl",
    "shutil",
    "pathlib",
    "glob",
    "tempfile",
    "pickle",
    "shelve",
    "marshal",
    "importlib",
    "runpy",
    "multiprocessing",
    "threading",
    "_thread",
    "signal",
    "resource",
    "pty",
    "fcntl",
    "mmap",
    "webbrowser",
];

static COMPILED_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    DENY_RULES
        .iter()
        .map(|(pattern, construct)| (Regex::new(pattern).unwrap(), *construct))
        .collect()
});

/// Matches the root module of `import x` / `import x.y` / `from x import y`.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:import|from)\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap()
});

/// Scan submitted source against the deny list.
///
/// Pure function of its input: no side effects, same verdict on every call.
/// Stops at the first violation.
pub fn check_safety(source: &str) -> SafetyVerdict {
    for (regex, construct) in COMPILED_RULES.iter() {
        if regex.is_match(source) {
            return SafetyVerdict::reject(format!(
                "use of `{construct}` is not allowed in exercises"
            ));
        }
    }

    for captures in IMPORT_RE.captures_iter(source) {
        let module = &captures[1];
        if DENIED_MODULES.contains(&module) {
            return SafetyVerdict::reject(format!(
                "importing `{module}` is not allowed in exercises"
            ));
        }
    }

    SafetyVerdict::accept()
}
