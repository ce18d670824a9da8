//! Benchmarks for the exercise harness.
//!
//! Run with: cargo bench
//!
//! The execution benchmarks require rustpython.wasm to be present at
//! assets/rustpython.wasm; everything else runs without it.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use tokio::runtime::Runtime;
use wasm_exercise_harness::check_safety;
use wasm_exercise_harness::harness::driver::{compose_driver, parse_run_report, REPORT_PREFIX};
use wasm_exercise_harness::prelude::*;

const SOLUTION: &str = r#"
def add(a, b):
    return a + b

def total(values):
    result = 0
    for value in values:
        result = add(result, value)
    return result
"#;

fn exercise_tests() -> Vec<TestCase> {
    vec![
        TestCase::new("assert add(2, 3) == 5", "adds"),
        TestCase::new("assert total([1, 2, 3]) == 6", "totals a list"),
        TestCase::new("assert total([]) == 0", "handles the empty list"),
    ]
}

/// Get the path to the interpreter, checking if it exists.
fn get_interpreter_path() -> Option<std::path::PathBuf> {
    let path = std::path::PathBuf::from("assets/rustpython.wasm");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Benchmark the static safety filter.
fn bench_safety_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("safety_filter");

    group.bench_function("clean_solution", |b| {
        b.iter(|| black_box(check_safety(black_box(SOLUTION))));
    });

    group.bench_function("flagged_solution", |b| {
        b.iter(|| black_box(check_safety(black_box("import os\nos.system('ls')"))));
    });

    group.finish();
}

/// Benchmark driver composition and report parsing.
fn bench_driver(c: &mut Criterion) {
    let tests = exercise_tests();

    let mut group = c.benchmark_group("driver");

    group.bench_function("compose", |b| {
        b.iter(|| black_box(compose_driver(black_box(SOLUTION), black_box(&tests), None)));
    });

    let stderr = format!(
        "{p}user ok\n{p}test 0 pass\n{p}test 1 fail AssertionError: got 7\n{p}test 2 pass\n",
        p = REPORT_PREFIX
    );
    group.bench_function("parse_report", |b| {
        b.iter(|| black_box(parse_run_report(black_box(&stderr))));
    });

    group.finish();
}

/// Benchmark result rendering.
fn bench_rendering(c: &mut Criterion) {
    let result = ExecutionResult {
        success: false,
        tests_passed: 2,
        total_tests: 3,
        details: vec![
            wasm_exercise_harness::TestOutcome {
                description: "adds".to_string(),
                passed: true,
                message: None,
            },
            wasm_exercise_harness::TestOutcome {
                description: "totals a list".to_string(),
                passed: false,
                message: Some("AssertionError: got 7".to_string()),
            },
            wasm_exercise_harness::TestOutcome {
                description: "handles the empty list".to_string(),
                passed: true,
                message: None,
            },
        ],
        error: None,
        stdout: "debugging output\n".to_string(),
    };

    c.bench_function("render_partial_failure", |b| {
        b.iter(|| black_box(present(black_box(&result))));
    });
}

/// Benchmark full submission checks against the real interpreter.
fn bench_execution(c: &mut Criterion) {
    let Some(interpreter_path) = get_interpreter_path() else {
        eprintln!("Skipping execution benchmark: rustpython.wasm not found");
        return;
    };

    let rt = Runtime::new().unwrap();
    let config = HarnessConfig::builder()
        .interpreter_path(&interpreter_path)
        .timeout(Duration::from_secs(30))
        .max_memory(64 * 1024 * 1024)
        .build();
    let session = ExerciseSession::new(config);
    let tests = exercise_tests();

    let mut group = c.benchmark_group("execution");
    group.sample_size(10);

    group.bench_function("check_solution", |b| {
        b.iter(|| {
            let result = rt.block_on(session.submit(SOLUTION, &tests)).unwrap();
            black_box(result)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_safety_filter,
    bench_driver,
    bench_rendering,
    bench_execution,
);

criterion_main!(benches);
