use std::process::ExitCode;

fn main() -> ExitCode {
    modelgen::cli::run()
}
