/**
 * The command-line user interface for playing rounds.
 *
 * Version: October 2026
 */
use std::io::Write;

use colored::*;

use super::common::{Answer, Category, Result};
use super::iohelper::{prettyprint, prettyprint_colored, prompt, Highlight};

pub struct CmdUI {
    number: usize,
}

impl Default for CmdUI {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdUI {
    pub fn new() -> Self {
        Self { number: 0 }
    }

    pub fn next(&mut self) {
        self.number += 1;
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        my_print!("\n")?;
        let prefix = format!("  ({}) ", self.number);
        prettyprint_colored(text, &prefix, Highlight::Prefix(Color::Cyan))?;
        my_print!("\n")
    }

    /// Prompt until the user answers yes or no. `Ok(None)` means the user pressed
    /// Ctrl+D.
    pub fn prompt_answer(&mut self) -> Result<Option<Answer>> {
        loop {
            match prompt("> ")? {
                Some(response) => {
                    if let Some(answer) = parse_answer(&response) {
                        return Ok(Some(answer));
                    }
                    self.status("Please answer yes or no.")?;
                }
                None => return Ok(None),
            }
        }
    }

    pub fn status(&mut self, text: &str) -> Result<()> {
        my_println!("{}", text)
    }

    pub fn warning(&mut self, text: &str) -> Result<()> {
        my_print!("\n")?;
        prettyprint_colored(
            &format!("Warning: {}", text),
            "  ",
            Highlight::Message(Color::Red),
        )?;
        my_print!("\n")
    }

    pub fn results(
        &mut self,
        category: &Category,
        score: i64,
        answered: usize,
        total: i64,
        average: Option<i64>,
    ) -> Result<()> {
        my_print!("\n\n")?;
        my_print!("Score: ")?;
        my_print!("{}", format!("{}%", score).cyan())?;
        my_print!(" over ")?;
        my_print!("{}", format!("{}", answered).cyan())?;
        if answered == 1 {
            my_println!(" question")?;
        } else {
            my_println!(" questions")?;
        }

        let average = average
            .map(|average| format!("{}%", average))
            .unwrap_or_else(|| String::from("-"));
        prettyprint(
            &format!(
                "All {} rounds: {} points in total, {} on average",
                category,
                total.to_string().green(),
                average.green()
            ),
            "  ",
        )
    }

    pub fn stats_header(&mut self) -> Result<()> {
        my_println!(
            "{}",
            format!("{:<16}{:>8}{:>10}{:>10}", "category", "rounds", "total", "average").bold()
        )
    }

    pub fn stats_line(
        &mut self,
        category: &Category,
        rounds: u64,
        total: i64,
        average: Option<i64>,
    ) -> Result<()> {
        let average = average
            .map(|average| format!("{}%", average))
            .unwrap_or_else(|| String::from("-"));
        my_println!(
            "{:<16}{:>8}{:>10}{:>10}",
            category.as_str(),
            rounds,
            total,
            average
        )
    }
}

/// Interpret a response to a yes/no question, ignoring case.
pub fn parse_answer(response: &str) -> Option<Answer> {
    match response.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(Answer::Yes),
        "n" | "no" => Some(Answer::No),
        _ => None,
    }
}
