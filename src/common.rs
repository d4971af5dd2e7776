/**
 * Definitions of data structures used by several modules, such as `QuizError`, the
 * `Question` record and the structs that hold command-line arguments.
 *
 * Version: October 2026
 */
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub type Result<T> = ::std::result::Result<T, QuizError>;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// An operation needed an active round but the engine was idle.
    #[error("no round is in progress")]
    RoundNotStarted,
    /// An answer was submitted after the last queued question.
    #[error("there is no current question to answer")]
    NoCurrentQuestion,
    #[error("storage error ({0})")]
    Storage(#[from] rusqlite::Error),
    /// A round type or category has no entry in the configuration.
    #[error("nothing configured for '{0}'")]
    ConfigurationMissing(String),
    #[error("'{0}' is not a valid partition name")]
    InvalidPartition(String),
    #[error("unable to create application directory at {}", .0.display())]
    CannotMakeAppDir(PathBuf),
    #[error("could not parse JSON ({0})")]
    Json(#[from] serde_json::Error),
    #[error("IO error ({0})")]
    Io(#[from] io::Error),
    #[error("terminal error ({0})")]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error("")]
    ReadlineInterrupted,
}

/// A tag partitioning questions and scores. `Other` holds any category beyond the
/// built-in ones, in lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    General,
    Engineering,
    Pilot,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::General => "general",
            Category::Engineering => "engineering",
            Category::Pilot => "pilot",
            Category::Other(tag) => tag,
        }
    }
}

impl FromStr for Category {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Self> {
        let tag = s.trim().to_lowercase();
        match tag.as_str() {
            "" => Err(QuizError::ConfigurationMissing(String::from(s))),
            "general" => Ok(Category::General),
            "engineering" => Ok(Category::Engineering),
            "pilot" => Ok(Category::Pilot),
            _ => Ok(Category::Other(tag)),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A yes/no question as held in memory. Point values may be negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub category: Category,
    pub text: String,
    pub yes_value: i64,
    pub no_value: i64,
    /// How many completed rounds this question was answered in. Never decreases.
    pub used_count: u64,
}

impl Question {
    /// Build a `Question` from a row of its category's partition.
    pub fn from_row(category: &Category, row: QuestionRow) -> Self {
        Question {
            id: row.id,
            category: category.clone(),
            text: row.text,
            yes_value: row.yes_value,
            no_value: row.no_value,
            used_count: row.used_count,
        }
    }

    pub fn to_row(&self) -> QuestionRow {
        QuestionRow {
            id: self.id,
            text: self.text.clone(),
            yes_value: self.yes_value,
            no_value: self.no_value,
            used_count: self.used_count,
        }
    }

    /// The value of whichever answer is worth more.
    pub fn best_value(&self) -> i64 {
        ::std::cmp::max(self.yes_value, self.no_value)
    }
}

/// A question exactly as stored, without its category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRow {
    pub id: i64,
    pub text: String,
    pub yes_value: i64,
    pub no_value: i64,
    pub used_count: u64,
}

/// A question from the import source that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    #[serde(rename = "yes")]
    pub yes_value: i64,
    #[serde(rename = "no")]
    pub no_value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

/// Divide and round to the nearest integer, with ties going away from zero.
///
/// `denominator` must not be zero.
pub fn round_div(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if 2 * remainder.abs() >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}

/// Holds the command-line configuration for the application.
#[derive(Parser)]
#[command(name = "preflight", about = "Answer yes/no quiz rounds from the command line.")]
pub struct Options {
    /// Keep the database and configuration in a particular directory.
    #[arg(short = 'd', long = "directory")]
    pub directory: Option<PathBuf>,
    /// Do not emit colorized output.
    #[arg(long = "no-color")]
    pub no_color: bool,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Play a round.
    #[command(name = "take")]
    Take(TakeOptions),
    /// Show score statistics for each category.
    #[command(name = "stats")]
    Stats,
    /// List the configured round types.
    #[command(name = "rounds")]
    Rounds,
}

#[derive(clap::Args)]
pub struct TakeOptions {
    /// Name of the round type to play.
    #[arg(default_value = "general")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_div_rounds_half_away_from_zero() {
        assert_eq!(round_div(95, 2), 48);
        assert_eq!(round_div(-95, 2), -48);
        assert_eq!(round_div(5, -2), -3);
        assert_eq!(round_div(2300, 26), 88);
        assert_eq!(round_div(196, 3), 65);
        assert_eq!(round_div(194, 3), 65);
        assert_eq!(round_div(-194, 3), -65);
        assert_eq!(round_div(0, 7), 0);
    }

    #[test]
    fn categories_parse_case_insensitively() {
        assert_eq!("General".parse::<Category>().unwrap(), Category::General);
        assert_eq!(" PILOT ".parse::<Category>().unwrap(), Category::Pilot);
        assert_eq!(
            "Avionics".parse::<Category>().unwrap(),
            Category::Other(String::from("avionics"))
        );
        assert!("  ".parse::<Category>().is_err());
    }

    #[test]
    fn best_value_handles_negative_points() {
        let q = Question {
            id: 1,
            category: Category::Pilot,
            text: String::from("Is it safe to take off with frost on the wings?"),
            yes_value: -5,
            no_value: -1,
            used_count: 0,
        };
        assert_eq!(q.best_value(), -1);
    }
}
