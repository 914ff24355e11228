//! flow - kanban boards with approval workflows

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = flowboard::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
