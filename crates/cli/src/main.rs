use std::process::ExitCode;

fn main() -> ExitCode {
    agriwiz_cli::run()
}
