/**
 * Wiring: choose the storage, importer and configuration once at startup and hand
 * them to a `RoundEngine`.
 *
 * Version: October 2026
 */
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use super::common::Result;
use super::config::{Config, DATABASE_FILE, QUESTIONS_DIR};
use super::import::{BundledImporter, DirectoryImporter, Importer};
use super::persistence::SqliteStorage;
use super::round::RoundEngine;
use super::scores::ScoreBoard;
use super::store::QuestionStore;

pub struct SessionBuilder {
    config: Config,
    /// `None` keeps everything in memory.
    database: Option<PathBuf>,
    importer: Box<dyn Importer>,
}

impl SessionBuilder {
    /// An in-memory session with the bundled question banks.
    pub fn new(config: Config) -> Self {
        SessionBuilder {
            config,
            database: None,
            importer: Box::new(BundledImporter),
        }
    }

    /// A session that keeps its database, configuration and question banks in `dir`.
    pub fn for_app_dir(dir: &Path) -> Result<Self> {
        let config = Config::load(dir)?;
        Ok(SessionBuilder::new(config)
            .database(dir.join(DATABASE_FILE))
            .importer(Box::new(DirectoryImporter::new(dir.join(QUESTIONS_DIR)))))
    }

    pub fn database(mut self, path: PathBuf) -> Self {
        self.database = Some(path);
        self
    }

    pub fn importer(mut self, importer: Box<dyn Importer>) -> Self {
        self.importer = importer;
        self
    }

    pub fn build(self) -> Result<RoundEngine<SqliteStorage>> {
        self.config.validate()?;
        let storage = Arc::new(match &self.database {
            Some(path) => SqliteStorage::open(path)?,
            None => {
                debug!("Using an in-memory database");
                SqliteStorage::open_in_memory()?
            }
        });

        let config = Arc::new(self.config);
        let questions = QuestionStore::new(Arc::clone(&storage), self.importer, Arc::clone(&config));
        let scores = ScoreBoard::new(storage);
        Ok(RoundEngine::new(questions, scores, config))
    }
}
