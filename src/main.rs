use std::process::ExitCode;

fn main() -> ExitCode {
    medlens_lib::run()
}
