//! Checking a submission against an exercise's test cases.
//!
//! Run with: cargo run --example run_exercise
//!
//! Note: Requires rustpython.wasm to be present in assets/

use std::time::Duration;
use wasm_exercise_harness::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let config = HarnessConfig::builder()
        .timeout(Duration::from_secs(5))
        .max_memory(64 * 1024 * 1024)
        .interpreter_path("assets/rustpython.wasm")
        .build();

    let session = ExerciseSession::new(config);

    let tests = vec![
        TestCase::new("assert add(2, 3) == 5", "adds two numbers"),
        TestCase::new("assert add(-1, 1) == 0", "handles negatives"),
        TestCase::new("assert add(0, 0) == 0", "handles zero"),
    ];

    println!("--- A correct solution ---");
    let result = session
        .submit("def add(a, b):\n    return a + b", &tests)
        .await?;
    println!(
        "success: {}, {}/{} tests passed",
        result.success, result.tests_passed, result.total_tests
    );

    println!("\n--- An incorrect solution ---");
    let result = session
        .submit("def add(a, b):\n    return a - b", &tests)
        .await?;
    println!(
        "success: {}, {}/{} tests passed",
        result.success, result.tests_passed, result.total_tests
    );
    for outcome in &result.details {
        let mark = if outcome.passed { "pass" } else { "fail" };
        println!("  [{mark}] {}", outcome.description);
    }

    println!("\n--- A solution that raises ---");
    let result = session.submit("x = 1/0", &tests).await?;
    println!("error: {}", result.error.as_deref().unwrap_or("<none>"));

    println!("\n--- Rendered view of the failing run ---");
    let view = session
        .submit_rendered("def add(a, b):\n    return a - b", &tests)
        .await;
    println!("{}", view.html);

    Ok(())
}
