//! Shared test infrastructure for integration tests.

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

/// Run the compiled binary in `cwd` with credentials scrubbed from the environment.
pub fn amenrich(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_amenrich"))
        .args(args)
        .current_dir(cwd)
        .env_remove("GOOGLE_API_KEY")
        .env_remove("API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn amenrich")
}

/// Panic with both streams when the command failed.
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command failed: {:?}\nstdout:\n{}\nstderr:\n{}",
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn read_json(path: &Path) -> Value {
    let bytes = std::fs::read(path).expect("read JSON file");
    serde_json::from_slice(&bytes).expect("parse JSON file")
}

pub fn write_json(path: &Path, value: &Value) {
    let text = serde_json::to_string_pretty(value).expect("serialize JSON");
    std::fs::write(path, text).expect("write JSON file");
}
