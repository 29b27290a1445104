use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Asks a yes/no question on the terminal. Anything but `y`/`yes` declines.
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    confirm_with(&mut stdin.lock(), &mut stdout.lock(), question)
}

pub fn confirm_with<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, question: &str) -> Result<bool> {
    write!(writer, "{} [y/N] ", question)?;
    writer.flush()?;

    let mut answer = String::new();
    reader.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Blocks until a line arrives on the terminal. Returns `false` on end of input.
pub fn wait_for_enter() -> Result<bool> {
    let stdin = io::stdin();
    wait_for_line(&mut stdin.lock())
}

pub fn wait_for_line<R: BufRead>(reader: &mut R) -> Result<bool> {
    let mut line = String::new();
    Ok(reader.read_line(&mut line)? > 0)
}
