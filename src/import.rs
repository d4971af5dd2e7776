/**
 * The initial question banks. A category's questions are imported the first time its
 * partition turns out to be empty.
 *
 * A bank is a JSON array of `{ "text": ..., "yes": ..., "no": ... }` objects.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use log::{debug, warn};
use unicode_normalization::UnicodeNormalization;

use super::common::{Category, NewQuestion, QuizError, Result};

/// Supplies the initial set of questions for a category.
pub trait Importer {
    fn load(&self, category: &Category) -> Result<Vec<NewQuestion>>;
}

/// The question banks compiled into the binary. Categories without a bundled bank
/// have no questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledImporter;

impl Importer for BundledImporter {
    fn load(&self, category: &Category) -> Result<Vec<NewQuestion>> {
        let data = match category {
            Category::General => include_str!("../data/general.json"),
            Category::Engineering => include_str!("../data/engineering.json"),
            Category::Pilot => include_str!("../data/pilot.json"),
            Category::Other(_) => {
                debug!("No bundled questions for {}", category);
                return Ok(Vec::new());
            }
        };
        parse_bank(data)
    }
}

/// Reads `<dir>/<category>.json`, using the bundled bank when that file is missing.
#[derive(Debug, Clone)]
pub struct DirectoryImporter {
    dir: PathBuf,
}

impl DirectoryImporter {
    pub fn new(dir: PathBuf) -> Self {
        DirectoryImporter { dir }
    }
}

impl Importer for DirectoryImporter {
    fn load(&self, category: &Category) -> Result<Vec<NewQuestion>> {
        let path = self.dir.join(format!("{}.json", category));
        match fs::read_to_string(&path) {
            Ok(data) => {
                debug!("Importing questions from {}", path.display());
                parse_bank(&data)
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => BundledImporter.load(category),
            Err(e) => Err(QuizError::Io(e)),
        }
    }
}

impl Importer for BTreeMap<Category, Vec<NewQuestion>> {
    fn load(&self, category: &Category) -> Result<Vec<NewQuestion>> {
        Ok(self.get(category).cloned().unwrap_or_default())
    }
}

/// Parse a question bank, normalizing each question's text and dropping blank ones.
pub fn parse_bank(data: &str) -> Result<Vec<NewQuestion>> {
    let raw: Vec<NewQuestion> = serde_json::from_str(data)?;
    let mut questions = Vec::with_capacity(raw.len());
    for (i, question) in raw.into_iter().enumerate() {
        let text = question.text.trim().nfc().collect::<String>();
        if text.is_empty() {
            warn!("Skipping question {} of the bank because its text is blank", i + 1);
            continue;
        }
        questions.push(NewQuestion { text, ..question });
    }
    Ok(questions)
}
