use std::process::ExitCode;

fn main() -> ExitCode {
    perfumery_cli::run()
}
