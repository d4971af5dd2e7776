/**
 * Round types, the mapping from categories to storage partitions, and the location of
 * the application directory.
 *
 * The configuration is read once from `config.json` in the application directory. If
 * that file does not exist, the built-in defaults below are used.
 *
 * Version: October 2026
 */
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::common::{Category, QuizError, Result};
use super::persistence::check_partition;

pub const CONFIG_FILE: &str = "config.json";
pub const DATABASE_FILE: &str = "preflight.sqlite3";
pub const QUESTIONS_DIR: &str = "questions";

/// How many questions of each kind a round type asks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSpec {
    /// The category the round is about. Its score is recorded under this category.
    pub category: Category,
    /// Number of questions drawn from `category`.
    #[serde(rename = "specific")]
    pub specific_count: u32,
    /// Number of questions drawn from the general pool.
    #[serde(rename = "general")]
    pub general_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Table name for each category's questions.
    partitions: BTreeMap<Category, String>,
    rounds: BTreeMap<String, RoundSpec>,
}

impl Default for Config {
    fn default() -> Self {
        let mut partitions = BTreeMap::new();
        let mut rounds = BTreeMap::new();
        let defaults = [
            (Category::General, 10, 0),
            (Category::Engineering, 7, 3),
            (Category::Pilot, 7, 3),
        ];
        for (category, specific_count, general_count) in defaults.iter() {
            partitions.insert(category.clone(), format!("{}_questions", category));
            rounds.insert(
                String::from(category.as_str()),
                RoundSpec {
                    category: category.clone(),
                    specific_count: *specific_count,
                    general_count: *general_count,
                },
            );
        }
        Config { partitions, rounds }
    }
}

impl Config {
    /// Load the configuration in `dir`, falling back to the defaults when there is no
    /// configuration file.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(data) => {
                info!("Loading configuration from {}", path.display());
                Config::from_json(&data)
            }
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(e) => Err(QuizError::Io(e)),
        }
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Every partition must be a usable table name owned by exactly one category, and
    /// every round type must refer to a category with a partition.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for partition in self.partitions.values() {
            check_partition(partition)?;
            if !seen.insert(partition.to_ascii_lowercase()) {
                return Err(QuizError::InvalidPartition(partition.clone()));
            }
        }
        for spec in self.rounds.values() {
            self.partition(&spec.category)?;
        }
        // General questions fill out every round, so they always need somewhere to live.
        self.partition(&Category::General)?;
        Ok(())
    }

    pub fn round_type(&self, name: &str) -> Result<&RoundSpec> {
        self.rounds
            .get(name)
            .ok_or_else(|| QuizError::ConfigurationMissing(String::from(name)))
    }

    pub fn round_types(&self) -> impl Iterator<Item = (&str, &RoundSpec)> {
        self.rounds.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn partition(&self, category: &Category) -> Result<&str> {
        self.partitions
            .get(category)
            .map(|partition| partition.as_str())
            .ok_or_else(|| QuizError::ConfigurationMissing(String::from(category.as_str())))
    }

    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.partitions.keys()
    }
}

/// Return the default application directory.
pub fn default_app_dir() -> Result<PathBuf> {
    let mut dirpath = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| QuizError::CannotMakeAppDir(PathBuf::from("preflight")))?;
    dirpath.push("preflight");
    Ok(dirpath)
}

/// Return the path to the application directory, creating it if it doesn't exist.
pub fn require_app_dir(dirpath: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dirpath).or(Err(QuizError::CannotMakeAppDir(dirpath.to_path_buf())))?;
    Ok(dirpath.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_built_in_category() {
        let config = Config::default();
        config.validate().unwrap();

        let pilot = config.round_type("pilot").unwrap();
        assert_eq!(pilot.category, Category::Pilot);
        assert_eq!((pilot.specific_count, pilot.general_count), (7, 3));
        assert_eq!(config.partition(&Category::Engineering).unwrap(), "engineering_questions");
        assert_eq!(config.round_types().count(), 3);
    }

    #[test]
    fn unknown_round_type_is_missing() {
        let config = Config::default();
        match config.round_type("astronaut") {
            Err(QuizError::ConfigurationMissing(name)) => assert_eq!(name, "astronaut"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn can_parse_custom_configuration() {
        let config = Config::from_json(
            r#"{
                "partitions": {
                    "general": "general_questions",
                    "Avionics": "avionics_questions"
                },
                "rounds": {
                    "checkride": { "category": "avionics", "specific": 4, "general": 1 }
                }
            }"#,
        )
        .unwrap();

        let spec = config.round_type("checkride").unwrap();
        assert_eq!(spec.category, Category::Other(String::from("avionics")));
        assert_eq!(
            config.partition(&spec.category).unwrap(),
            "avionics_questions"
        );
        assert!(config.round_type("pilot").is_err());
    }

    #[test]
    fn rejects_round_without_partition() {
        let result = Config::from_json(
            r#"{
                "partitions": { "general": "general_questions" },
                "rounds": { "pilot": { "category": "pilot", "specific": 4, "general": 1 } }
            }"#,
        );
        assert!(matches!(result, Err(QuizError::ConfigurationMissing(_))));
    }

    #[test]
    fn rejects_unsafe_partition_names() {
        let result = Config::from_json(
            r#"{
                "partitions": { "general": "general; DROP TABLE scores" },
                "rounds": {}
            }"#,
        );
        assert!(matches!(result, Err(QuizError::InvalidPartition(_))));
    }

    #[test]
    fn rejects_shared_partitions() {
        let result = Config::from_json(
            r#"{
                "partitions": { "general": "shared", "pilot": "Shared" },
                "rounds": { "pilot": { "category": "pilot", "specific": 2, "general": 1 } }
            }"#,
        );
        match result {
            Err(QuizError::InvalidPartition(name)) => assert_eq!(name.to_lowercase(), "shared"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());

        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "partitions": { "general": "g" }, "rounds": {} }"#,
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.partition(&Category::General).unwrap(), "g");
        assert_eq!(config.round_types().count(), 0);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(matches!(Config::load(dir.path()), Err(QuizError::Io(_))));
    }
}
