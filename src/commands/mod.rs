//! Subcommand implementations.

pub mod paths;
pub mod reset;
pub mod residuals;

use std::io::{self, Write};

/// Exit code for a run that finished below the success threshold.
pub const EXIT_PARTIAL_FAILURE: i32 = 5;

/// Ask a yes/no question on stdin, defaulting to no.
pub(crate) fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
