//! fixproj - normalizes MSBuild project files

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = fixproj::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
