//! Submissions that never reach the interpreter.
//!
//! Run with: cargo run --example rejected_submissions
//!
//! No interpreter asset needed; every submission here is stopped by the
//! pipeline before execution.

use wasm_exercise_harness::prelude::*;
use wasm_exercise_harness::check_safety;

#[tokio::main]
async fn main() {
    let session = ExerciseSession::new(HarnessConfig::default());
    let tests = vec![TestCase::new("assert add(2, 3) == 5", "adds")];

    let submissions = [
        ("", "an empty buffer"),
        ("import os\nos.system('ls')", "an os import"),
        ("eval(\"__import__('sys')\")", "dynamic evaluation"),
        ("open('/etc/passwd').read()", "file access"),
    ];

    for (code, label) in submissions {
        println!("--- {label} ---");
        let verdict = check_safety(code);
        if !code.trim().is_empty() {
            println!("filter verdict: safe={} reason={:?}", verdict.safe, verdict.reason);
        }

        let view = session.submit_rendered(code, &tests).await;
        println!("status: {:?}", view.status);
        println!("{}\n", view.html);
    }
}
