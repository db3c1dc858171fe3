use std::process::ExitCode;

fn main() -> ExitCode {
    matchbot_cli::run()
}
