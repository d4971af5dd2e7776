/**
 * Helper functions for input and output.
 *
 * Version: October 2026
 */
use colored::*;
use std::io::Write;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use super::common::{QuizError, Result};

#[macro_export]
macro_rules! my_println {
    ($($arg:tt)*) => (
        writeln!(std::io::stdout(), $($arg)*).map_err($crate::common::QuizError::Io)
    );
}

#[macro_export]
macro_rules! my_print {
    ($($arg:tt)*) => (
        write!(std::io::stdout(), $($arg)*).map_err($crate::common::QuizError::Io)
    );
}

/// Display a prompt and read a line from standard input continually until the user
/// enters a line with at least one non-whitespace character. If the user presses Ctrl+D
/// then `Ok(None)` is returned. If the user pressed Ctrl+C then
/// `Err(QuizError::ReadlineInterrupted)` is returned. Otherwise, `Ok(Some(line))` is
/// returned where `line` is the last line of input the user entered without leading and
/// trailing whitespace.
pub fn prompt(message: &str) -> Result<Option<String>> {
    let mut rl = DefaultEditor::new()?;
    loop {
        let result = rl.readline(message);
        match result {
            Ok(response) => {
                let response = response.trim();
                if !response.is_empty() {
                    return Ok(Some(response.to_string()));
                }
            }
            // Return immediately if the user hits Ctrl+D or Ctrl+C.
            Err(ReadlineError::Interrupted) => {
                return Err(QuizError::ReadlineInterrupted);
            }
            Err(ReadlineError::Eof) => {
                return Ok(None);
            }
            Err(e) => {
                return Err(QuizError::Readline(e));
            }
        }
    }
}

/// Which part of a wrapped message is colored.
#[derive(Debug, Clone, Copy)]
pub enum Highlight {
    Plain,
    Prefix(Color),
    Message(Color),
}

/// Print `message` to standard output, breaking lines according to the current width
/// of the terminal. Prepend `prefix` to the first line and indent all subsequent lines
/// by its length.
pub fn prettyprint(message: &str, prefix: &str) -> Result<()> {
    prettyprint_colored(message, prefix, Highlight::Plain)
}

pub fn prettyprint_colored(message: &str, prefix: &str, highlight: Highlight) -> Result<()> {
    let width = textwrap::termwidth().saturating_sub(prefix.len()).max(20);
    let indent = " ".repeat(prefix.len());
    for (i, line) in wrap(message, width).iter().enumerate() {
        let lead = if i == 0 { prefix } else { indent.as_str() };
        match highlight {
            Highlight::Plain => my_println!("{}{}", lead, line)?,
            Highlight::Prefix(color) => my_println!("{}{}", lead.color(color), line)?,
            Highlight::Message(color) => my_println!("{}{}", lead, line.as_str().color(color))?,
        }
    }
    Ok(())
}

/// Break `message` into lines of at most `width` columns.
fn wrap(message: &str, width: usize) -> Vec<String> {
    textwrap::wrap_iter(message, width)
        .map(|line| line.into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_questions_are_wrapped() {
        let lines = wrap("Do you check the fuel quantity before every flight?", 20);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|line| line.len() <= 20));
        assert_eq!(lines.join(" "), "Do you check the fuel quantity before every flight?");
    }
}
