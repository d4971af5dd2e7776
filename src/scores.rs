/**
 * Running score statistics per category.
 *
 * `ScoreCache` keeps a running total and a running average for each key so that
 * reading them never requires rescanning the score log. `ScoreBoard` puts the cache in
 * front of the durable log and fills it lazily.
 *
 * Version: October 2026
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::debug;

use super::common::{round_div, Category, Result};
use super::persistence::Storage;

/// A snapshot of everything cached for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreAggregate {
    pub total: Option<i64>,
    pub average: Option<i64>,
    /// How many scores have been folded into `average`.
    pub samples: u64,
}

#[derive(Debug, Default)]
struct Slot {
    total: Option<i64>,
    average: Option<(i64, u64)>,
}

/// Incrementally maintained totals and averages, keyed by category name.
///
/// Each key has its own lock, so folds on different keys never wait on each other.
#[derive(Debug, Default)]
pub struct ScoreCache {
    slots: RwLock<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_total(&self, key: &str) -> Option<i64> {
        self.read(key, |slot| slot.total).flatten()
    }

    pub fn get_average(&self, key: &str) -> Option<i64> {
        self.read(key, |slot| slot.average)
            .flatten()
            .map(|(average, _)| average)
    }

    pub fn is_total_in_cache(&self, key: &str) -> bool {
        self.get_total(key).is_some()
    }

    pub fn is_average_in_cache(&self, key: &str) -> bool {
        self.get_average(key).is_some()
    }

    pub fn aggregate(&self, key: &str) -> ScoreAggregate {
        self.read(key, |slot| ScoreAggregate {
            total: slot.total,
            average: slot.average.map(|(average, _)| average),
            samples: slot.average.map(|(_, samples)| samples).unwrap_or(0),
        })
        .unwrap_or_default()
    }

    /// Overwrite the cached total unconditionally.
    pub fn load_total(&self, key: &str, value: i64) {
        lock(&self.slot(key)).total = Some(value);
    }

    /// Overwrite the cached average and its sample count unconditionally.
    pub fn load_average(&self, key: &str, value: i64, samples: u64) {
        lock(&self.slot(key)).average = Some((value, samples));
    }

    /// Add `delta` to the total. With nothing cached yet, `delta` becomes the total.
    pub fn factor_into_total(&self, key: &str, delta: i64) {
        let slot = self.slot(key);
        let mut slot = lock(&slot);
        slot.total = match slot.total {
            None => Some(delta),
            Some(total) => Some(total + delta),
        };
    }

    /// Fold `value` into the average using the previous (already rounded) average and
    /// its sample count. With nothing cached yet, `value` becomes the average.
    ///
    /// Because the previous average is rounded, repeated folds can drift away from
    /// the exact mean of the values folded in.
    pub fn factor_into_average(&self, key: &str, value: i64) {
        let slot = self.slot(key);
        let mut slot = lock(&slot);
        slot.average = match slot.average {
            None => Some((value, 1)),
            Some((average, samples)) => {
                let samples = samples as i64;
                let folded = round_div(average * samples + value, samples + 1);
                Some((folded, samples as u64 + 1))
            }
        };
    }

    fn read<T>(&self, key: &str, f: impl FnOnce(&Slot) -> T) -> Option<T> {
        let slot = self.existing(key)?;
        let guard = lock(&slot);
        Some(f(&*guard))
    }

    fn existing(&self, key: &str) -> Option<Arc<Mutex<Slot>>> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn slot(&self, key: &str) -> Arc<Mutex<Slot>> {
        if let Some(slot) = self.existing(key) {
            return slot;
        }
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(String::from(key))
            .or_default()
            .clone()
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The durable score log with a `ScoreCache` in front of it.
pub struct ScoreBoard<S> {
    storage: Arc<S>,
    cache: ScoreCache,
}

impl<S: Storage> ScoreBoard<S> {
    pub fn new(storage: Arc<S>) -> Self {
        ScoreBoard {
            storage,
            cache: ScoreCache::new(),
        }
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    /// Append `score` to the log and fold it into whatever is already cached.
    ///
    /// Keys that have not been read yet are left out of the cache: the next read
    /// derives them from the log, which by then includes this score.
    pub fn record(&self, category: &Category, score: i64) -> Result<()> {
        let key = category.as_str();
        self.storage.insert_score(key, score, chrono::Utc::now())?;
        debug!("Recorded score {} for {}", score, key);

        if self.cache.is_total_in_cache(key) {
            self.cache.factor_into_total(key, score);
        }
        if self.cache.is_average_in_cache(key) {
            self.cache.factor_into_average(key, score);
        }
        Ok(())
    }

    pub fn total(&self, category: &Category) -> Result<i64> {
        let key = category.as_str();
        if let Some(total) = self.cache.get_total(key) {
            return Ok(total);
        }

        let total = self.storage.sum_scores(key)?;
        debug!("Loaded total {} for {} from the score log", total, key);
        self.cache.load_total(key, total);
        Ok(total)
    }

    /// The average score, or `None` if no round of this category was ever scored.
    pub fn average(&self, category: &Category) -> Result<Option<i64>> {
        let key = category.as_str();
        if let Some(average) = self.cache.get_average(key) {
            return Ok(Some(average));
        }

        let count = self.storage.count_scores(key)?;
        if count == 0 {
            return Ok(None);
        }
        let sum = self.storage.sum_scores(key)?;
        let average = round_div(sum, count as i64);
        debug!("Loaded average {} over {} scores for {}", average, count, key);
        self.cache.load_average(key, average, count);
        Ok(Some(average))
    }

    /// How many scores have been recorded for this category.
    pub fn samples(&self, category: &Category) -> Result<u64> {
        let key = category.as_str();
        if self.cache.is_average_in_cache(key) {
            return Ok(self.cache.aggregate(key).samples);
        }
        self.storage.count_scores(key)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::persistence::SqliteStorage;

    #[test]
    fn first_factor_into_total_seeds_the_total() {
        let cache = ScoreCache::new();
        assert!(!cache.is_total_in_cache("pilot"));
        assert_eq!(cache.get_total("pilot"), None);

        cache.factor_into_total("pilot", 25);
        assert_eq!(cache.get_total("pilot"), Some(25));
        cache.factor_into_total("pilot", 50);
        assert_eq!(cache.get_total("pilot"), Some(75));
        cache.factor_into_total("pilot", -50);
        assert_eq!(cache.get_total("pilot"), Some(25));
        assert!(cache.is_total_in_cache("pilot"));
    }

    #[test]
    fn average_folds_use_the_rounded_previous_average() {
        let cache = ScoreCache::new();
        cache.factor_into_average("engineering", 25);
        assert_eq!(cache.get_average("engineering"), Some(25));
        cache.factor_into_average("engineering", 70);
        assert_eq!(cache.get_average("engineering"), Some(48));
        cache.factor_into_average("engineering", 100);
        assert_eq!(cache.get_average("engineering"), Some(65));
        assert_eq!(cache.aggregate("engineering").samples, 3);
    }

    #[test]
    fn average_drifts_from_the_exact_mean() {
        // 1 -> round(1/2) = 1 -> round(2/3) = 1, while the exact mean of 1, 0, 0 is
        // 0.33 and would round to 0.
        let cache = ScoreCache::new();
        for value in [1, 0, 0].iter() {
            cache.factor_into_average("general", *value);
        }
        assert_eq!(cache.get_average("general"), Some(1));
    }

    #[test]
    fn loads_overwrite_cached_values() {
        let cache = ScoreCache::new();
        cache.factor_into_total("pilot", 10);
        cache.load_total("pilot", 300);
        assert_eq!(cache.get_total("pilot"), Some(300));

        cache.load_average("pilot", 60, 5);
        cache.factor_into_average("pilot", 90);
        // round((60 * 5 + 90) / 6) = 65
        assert_eq!(
            cache.aggregate("pilot"),
            ScoreAggregate {
                total: Some(300),
                average: Some(65),
                samples: 6
            }
        );
    }

    #[test]
    fn keys_are_independent() {
        let cache = ScoreCache::new();
        cache.factor_into_total("pilot", 10);
        assert_eq!(cache.get_total("engineering"), None);
        assert!(!cache.is_average_in_cache("pilot"));
        assert_eq!(cache.aggregate("general"), ScoreAggregate::default());
    }

    #[test]
    fn concurrent_folds_are_not_lost() {
        let cache = Arc::new(ScoreCache::new());
        cache.load_total("pilot", 0);
        cache.load_total("engineering", 0);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let key = if i % 2 == 0 { "pilot" } else { "engineering" };
                    for _ in 0..1000 {
                        cache.factor_into_total(key, 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.get_total("pilot"), Some(4000));
        assert_eq!(cache.get_total("engineering"), Some(4000));
    }

    #[test]
    fn board_loads_lazily_from_the_log() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        let board = ScoreBoard::new(Arc::clone(&storage));
        assert_eq!(board.total(&Category::Pilot).unwrap(), 0);
        assert_eq!(board.average(&Category::Pilot).unwrap(), None);

        board.record(&Category::Pilot, 25).unwrap();
        board.record(&Category::Pilot, 70).unwrap();
        // The total was cached at 0 above, so both scores were folded in.
        assert_eq!(board.cache().get_total("pilot"), Some(95));
        // The average was never cached, so it comes straight from the log.
        assert!(!board.cache().is_average_in_cache("pilot"));
        assert_eq!(board.average(&Category::Pilot).unwrap(), Some(48));
        assert_eq!(board.samples(&Category::Pilot).unwrap(), 2);

        board.record(&Category::Pilot, 100).unwrap();
        assert_eq!(board.average(&Category::Pilot).unwrap(), Some(65));
        assert_eq!(board.total(&Category::Pilot).unwrap(), 195);
        assert_eq!(board.samples(&Category::Pilot).unwrap(), 3);
    }

    #[test]
    fn fresh_board_rederives_from_the_log() {
        let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
        {
            let board = ScoreBoard::new(Arc::clone(&storage));
            board.record(&Category::Engineering, 40).unwrap();
            board.record(&Category::Engineering, 41).unwrap();
        }

        let board = ScoreBoard::new(storage);
        assert_eq!(board.total(&Category::Engineering).unwrap(), 81);
        // round(81 / 2) = 41
        assert_eq!(board.average(&Category::Engineering).unwrap(), Some(41));
        assert_eq!(board.total(&Category::General).unwrap(), 0);
    }
}
