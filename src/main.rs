//! gopin binary entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match gopin::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            gopin::ui::output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
