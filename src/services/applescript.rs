use std::process::{Command, Output};

/// Run an AppleScript snippet through `osascript -e`.
pub fn run_osascript_output(script: &str) -> std::io::Result<Output> {
    Command::new("osascript").arg("-e").arg(script).output()
}

pub fn osascript_stdout(output: Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
