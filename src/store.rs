/**
 * Durable question records, fetched least-used first.
 *
 * Questions used equally often come back in the order they were imported.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

use super::common::{Category, Question, QuestionRow, Result};
use super::config::Config;
use super::import::Importer;
use super::persistence::Storage;

pub struct QuestionStore<S> {
    storage: Arc<S>,
    importer: Box<dyn Importer>,
    config: Arc<Config>,
}

impl<S: Storage> QuestionStore<S> {
    pub fn new(storage: Arc<S>, importer: Box<dyn Importer>, config: Arc<Config>) -> Self {
        QuestionStore {
            storage,
            importer,
            config,
        }
    }

    /// Create the category's partition if it does not exist yet.
    pub fn ensure_category_exists(&self, category: &Category) -> Result<()> {
        let partition = self.config.partition(category)?;
        self.storage.create_table(partition)
    }

    /// Return up to `count` questions of `category`, least used first.
    ///
    /// An empty partition is filled from the importer before querying it.
    pub fn fetch(&self, category: &Category, count: i64) -> Result<Vec<Question>> {
        if count <= 0 {
            return Ok(Vec::new());
        }
        let limit = usize::try_from(count).unwrap_or(usize::MAX);

        self.ensure_category_exists(category)?;
        let partition = self.config.partition(category)?;
        let mut rows = self.storage.select_ordered_by_used_count(partition, limit)?;
        if rows.is_empty() {
            let imported = self.importer.load(category)?;
            if !imported.is_empty() {
                self.storage.insert_rows(partition, &imported)?;
                info!("Imported {} {} questions", imported.len(), category);
                rows = self.storage.select_ordered_by_used_count(partition, limit)?;
            }
        }

        debug!("Fetched {} of {} requested {} questions", rows.len(), count, category);
        Ok(rows
            .into_iter()
            .map(|row| Question::from_row(category, row))
            .collect())
    }

    /// Write every field of `question` back to storage.
    pub fn persist(&self, question: &Question) -> Result<()> {
        self.ensure_category_exists(&question.category)?;
        let partition = self.config.partition(&question.category)?;
        self.storage.update_rows(partition, &[question.to_row()])
    }

    /// Write back many questions with one transaction per category.
    pub fn persist_all(&self, questions: &[Question]) -> Result<()> {
        let mut by_category: BTreeMap<&Category, Vec<QuestionRow>> = BTreeMap::new();
        for question in questions.iter() {
            by_category
                .entry(&question.category)
                .or_default()
                .push(question.to_row());
        }

        for (category, rows) in by_category.iter() {
            self.ensure_category_exists(category)?;
            let partition = self.config.partition(category)?;
            self.storage.update_rows(partition, rows)?;
            debug!("Persisted {} {} questions", rows.len(), category);
        }
        Ok(())
    }

    /// How many questions of `category` are stored.
    pub fn count(&self, category: &Category) -> Result<u64> {
        self.ensure_category_exists(category)?;
        let partition = self.config.partition(category)?;
        self.storage.count_rows(partition)
    }
}
