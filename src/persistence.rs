/**
 * The storage collaborator: question partitions and the score log, kept in SQLite.
 *
 * Every question category lives in its own table (its "partition"). Scores from all
 * categories share the `scores` table.
 *
 * Version: October 2026
 */
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{params, Connection};

use super::common::{NewQuestion, QuestionRow, QuizError, Result};

/// The operations the question store and the score board need from durable storage.
/// Each call is atomic: batched writes either land completely or not at all.
pub trait Storage {
    /// Create the partition if it does not already exist.
    fn create_table(&self, partition: &str) -> Result<()>;
    /// Insert all of `rows` in one transaction and return their new ids in order.
    fn insert_rows(&self, partition: &str, rows: &[NewQuestion]) -> Result<Vec<i64>>;
    /// Return up to `limit` rows, least used first, ties broken by id.
    fn select_ordered_by_used_count(&self, partition: &str, limit: usize)
        -> Result<Vec<QuestionRow>>;
    /// Number of rows in the partition.
    fn count_rows(&self, partition: &str) -> Result<u64>;
    /// Write every field of each row keyed by its id, in one transaction.
    fn update_rows(&self, partition: &str, rows: &[QuestionRow]) -> Result<()>;
    fn insert_score(&self, category: &str, score: i64, timestamp: DateTime<Utc>) -> Result<()>;
    fn sum_scores(&self, category: &str) -> Result<i64>;
    fn count_scores(&self, category: &str) -> Result<u64>;
}

/// `Storage` backed by a single SQLite connection.
pub struct SqliteStorage {
    connection: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(connection: Connection) -> Result<Self> {
        connection.execute(
            "
            CREATE TABLE IF NOT EXISTS scores(
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              category TEXT NOT NULL CHECK(category != ''),
              score INTEGER NOT NULL,
              time_recorded TEXT NOT NULL
            )
            ",
            [],
        )?;
        Ok(SqliteStorage {
            connection: Mutex::new(connection),
        })
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for SqliteStorage {
    fn create_table(&self, partition: &str) -> Result<()> {
        check_partition(partition)?;
        let sql = format!(
            "
            CREATE TABLE IF NOT EXISTS {}(
              id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
              text TEXT NOT NULL CHECK(text != ''),
              yes_value INTEGER NOT NULL,
              no_value INTEGER NOT NULL,
              used_count INTEGER NOT NULL DEFAULT 0 CHECK(used_count >= 0)
            )
            ",
            partition
        );
        self.connection().execute(&sql, [])?;
        Ok(())
    }

    fn insert_rows(&self, partition: &str, rows: &[NewQuestion]) -> Result<Vec<i64>> {
        check_partition(partition)?;
        let sql = format!(
            "INSERT INTO {}(text, yes_value, no_value) VALUES (?1, ?2, ?3)",
            partition
        );

        let mut connection = self.connection();
        let tx = connection.transaction()?;
        let mut ids = Vec::with_capacity(rows.len());
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows.iter() {
                stmt.execute(params![row.text, row.yes_value, row.no_value])?;
                ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        Ok(ids)
    }

    fn select_ordered_by_used_count(
        &self,
        partition: &str,
        limit: usize,
    ) -> Result<Vec<QuestionRow>> {
        check_partition(partition)?;
        let sql = format!(
            "
            SELECT
              id, text, yes_value, no_value, used_count
            FROM
              {}
            ORDER BY
              used_count ASC, id ASC
            LIMIT ?1
            ",
            partition
        );

        let connection = self.connection();
        let mut stmt = connection.prepare(&sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            let used_count: i64 = row.get(4)?;
            Ok(QuestionRow {
                id: row.get(0)?,
                text: row.get(1)?,
                yes_value: row.get(2)?,
                no_value: row.get(3)?,
                used_count: used_count.max(0) as u64,
            })
        })?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    fn count_rows(&self, partition: &str) -> Result<u64> {
        check_partition(partition)?;
        let sql = format!("SELECT COUNT(*) FROM {}", partition);
        let count: i64 = self.connection().query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn update_rows(&self, partition: &str, rows: &[QuestionRow]) -> Result<()> {
        check_partition(partition)?;
        let sql = format!(
            "
            INSERT OR REPLACE INTO
              {}(id, text, yes_value, no_value, used_count)
            VALUES
              (?1, ?2, ?3, ?4, ?5)
            ",
            partition
        );

        let mut connection = self.connection();
        let tx = connection.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows.iter() {
                stmt.execute(params![
                    row.id,
                    row.text,
                    row.yes_value,
                    row.no_value,
                    (row.used_count as i64)
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn insert_score(&self, category: &str, score: i64, timestamp: DateTime<Utc>) -> Result<()> {
        self.connection().execute(
            "INSERT INTO scores(category, score, time_recorded) VALUES (?1, ?2, ?3)",
            params![category, score, timestamp.to_rfc3339()],
        )?;
        Ok(())
    }

    fn sum_scores(&self, category: &str) -> Result<i64> {
        let sum = self.connection().query_row(
            "SELECT COALESCE(SUM(score), 0) FROM scores WHERE category = ?1",
            params![category],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    fn count_scores(&self, category: &str) -> Result<u64> {
        let count: i64 = self.connection().query_row(
            "SELECT COUNT(*) FROM scores WHERE category = ?1",
            params![category],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

/// Partition names are spliced into SQL, so only plain identifiers are allowed.
pub fn check_partition(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid && !name.eq_ignore_ascii_case("scores") {
        Ok(())
    } else {
        Err(QuizError::InvalidPartition(String::from(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str, yes_value: i64, no_value: i64) -> NewQuestion {
        NewQuestion {
            text: String::from(text),
            yes_value,
            no_value,
        }
    }

    #[test]
    fn rows_come_back_least_used_first() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.create_table("pilot_questions").unwrap();
        let ids = storage
            .insert_rows(
                "pilot_questions",
                &[q("Is VFR flight allowed at night?", 1, 2), q("Is a flight plan required?", 3, 0)],
            )
            .unwrap();
        assert_eq!(ids.len(), 2);

        let mut rows = storage.select_ordered_by_used_count("pilot_questions", 10).unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), ids);

        rows[0].used_count = 1;
        storage.update_rows("pilot_questions", &rows[..1]).unwrap();

        let rows = storage.select_ordered_by_used_count("pilot_questions", 10).unwrap();
        assert_eq!(rows[0].id, ids[1]);
        assert_eq!(rows[1].id, ids[0]);
        assert_eq!(rows[1].used_count, 1);
    }

    #[test]
    fn create_table_is_idempotent() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.create_table("general_questions").unwrap();
        storage.insert_rows("general_questions", &[q("Is the sky blue?", 1, 0)]).unwrap();
        storage.create_table("general_questions").unwrap();
        assert_eq!(
            storage.select_ordered_by_used_count("general_questions", 5).unwrap().len(),
            1
        );
        assert_eq!(storage.count_rows("general_questions").unwrap(), 1);
    }

    #[test]
    fn failed_batch_leaves_no_rows_behind() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        storage.create_table("general_questions").unwrap();
        // The empty text violates the CHECK constraint on the second insert.
        let result = storage.insert_rows(
            "general_questions",
            &[q("Is the sky blue?", 1, 0), q("", 1, 0)],
        );
        assert!(matches!(result, Err(QuizError::Storage(_))));
        assert!(storage
            .select_ordered_by_used_count("general_questions", 5)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn scores_are_summed_per_category() {
        let storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.sum_scores("pilot").unwrap(), 0);
        assert_eq!(storage.count_scores("pilot").unwrap(), 0);

        let now = Utc::now();
        storage.insert_score("pilot", 80, now).unwrap();
        storage.insert_score("pilot", -10, now).unwrap();
        storage.insert_score("engineering", 55, now).unwrap();

        assert_eq!(storage.sum_scores("pilot").unwrap(), 70);
        assert_eq!(storage.count_scores("pilot").unwrap(), 2);
        assert_eq!(storage.sum_scores("engineering").unwrap(), 55);
    }

    #[test]
    fn partition_names_must_be_identifiers() {
        assert!(check_partition("pilot_questions").is_ok());
        assert!(check_partition("_x1").is_ok());
        assert!(check_partition("").is_err());
        assert!(check_partition("1abc").is_err());
        assert!(check_partition("pilot; DROP TABLE scores").is_err());
        assert!(check_partition("scores").is_err());
    }
}
