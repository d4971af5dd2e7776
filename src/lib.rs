/**
 * Yes/no quiz rounds with least-used question selection and running score statistics.
 *
 * A `RoundEngine` draws the least-used questions of a category from a `QuestionStore`,
 * collects yes/no answers, scores them as a percentage, and commits the results back to
 * the store and to a `ScoreBoard` that keeps running totals and averages per category.
 *
 * Version: October 2026
 */
#[macro_use]
pub mod iohelper;
pub mod common;
pub mod config;
pub mod import;
pub mod persistence;
pub mod round;
pub mod scores;
pub mod session;
pub mod store;
pub mod ui;

pub use common::{Answer, Category, NewQuestion, Question, QuizError, Result};
pub use config::{Config, RoundSpec};
pub use import::{BundledImporter, DirectoryImporter, Importer};
pub use persistence::{SqliteStorage, Storage};
pub use round::{Round, RoundEngine, RoundState};
pub use scores::{ScoreAggregate, ScoreBoard, ScoreCache};
pub use session::SessionBuilder;
pub use store::QuestionStore;
