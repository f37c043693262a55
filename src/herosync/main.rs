//! The `herosync` binary. All of the CLI lives in `cli/`; this file only runs
//! it and turns a fatal error into an exit code.

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error [{}]: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}
