use std::process::ExitCode;

fn main() -> ExitCode {
    vendorly_cli::run()
}
