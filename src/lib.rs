pub mod app_error;
pub mod cli;
pub mod config;
pub mod model;
pub mod output;
pub mod version;

pub fn run() -> i32 {
    match cli::run_cli() {
        Ok(()) => app_error::ExitCode::Success as i32,
        Err(err) => {
            if !err.is_reported() {
                eprintln!("{} {err}", output::failure("error"));
            }
            err.code()
        }
    }
}
