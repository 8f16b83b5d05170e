use std::process::{Command, Output};

/// Split a configured command line into program and leading arguments.
pub fn split_command(command_line: &str) -> Option<(String, Vec<String>)> {
    let mut parts = command_line.split_whitespace().map(str::to_string);
    let program = parts.next()?;
    Some((program, parts.collect()))
}

/// Execute a command and return its output
pub fn execute_command(program: &str, args: &[String]) -> std::io::Result<Output> {
    Command::new(program).args(args).output()
}
