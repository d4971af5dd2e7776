/**
 * Playing a round: draw a shuffled batch of questions, collect yes/no answers, score
 * them and commit the results.
 *
 * Version: October 2026
 */
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::thread_rng;

use super::common::{round_div, Answer, Category, Question, QuizError, Result};
use super::config::Config;
use super::persistence::Storage;
use super::scores::ScoreBoard;
use super::store::QuestionStore;

/// One play-through of a batch of questions.
#[derive(Debug, Clone)]
pub struct Round {
    category: Category,
    queue: VecDeque<Question>,
    yes_answers: Vec<Question>,
    no_answers: Vec<Question>,
    score: Option<i64>,
    // Progress through `RoundEngine::end_round`, so that a failed commit can be retried
    // without repeating the steps that already succeeded.
    committed: BTreeSet<Category>,
    score_recorded: bool,
}

impl Round {
    pub fn new(category: Category, questions: Vec<Question>) -> Self {
        Round {
            category,
            queue: questions.into(),
            yes_answers: Vec::new(),
            no_answers: Vec::new(),
            score: None,
            committed: BTreeSet::new(),
            score_recorded: false,
        }
    }

    /// The category the round's score is recorded under.
    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn current(&self) -> Option<&Question> {
        self.queue.front()
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Record `answer` for the current question and move on to the next one.
    pub fn answer(&mut self, answer: Answer) -> Result<()> {
        let question = self.queue.pop_front().ok_or(QuizError::NoCurrentQuestion)?;
        match answer {
            Answer::Yes => self.yes_answers.push(question),
            Answer::No => self.no_answers.push(question),
        }
        Ok(())
    }

    /// Questions answered "yes", in the order they were answered.
    pub fn yes_answers(&self) -> &[Question] {
        &self.yes_answers
    }

    /// Questions answered "no", in the order they were answered.
    pub fn no_answers(&self) -> &[Question] {
        &self.no_answers
    }

    pub fn answered(&self) -> usize {
        self.yes_answers.len() + self.no_answers.len()
    }

    /// The score, once the round has been ended.
    pub fn final_score(&self) -> Option<i64> {
        self.score
    }

    pub fn compute_score(&self) -> i64 {
        score(&self.yes_answers, &self.no_answers)
    }
}

/// Score a set of answers as a percentage of the best possible result.
///
/// Each answered question earns the value of the answer given, out of the larger of
/// its two values. Nothing answered scores 0, and so does a round where nothing could
/// have been earned.
pub fn score(yes_answers: &[Question], no_answers: &[Question]) -> i64 {
    if yes_answers.is_empty() && no_answers.is_empty() {
        return 0;
    }

    let earned = yes_answers.iter().map(|q| q.yes_value).sum::<i64>()
        + no_answers.iter().map(|q| q.no_value).sum::<i64>();
    let possible: i64 = yes_answers
        .iter()
        .chain(no_answers.iter())
        .map(Question::best_value)
        .sum();

    if possible == 0 {
        return 0;
    }
    round_div(earned * 100, possible)
}

#[derive(Debug, Clone)]
pub enum RoundState {
    Idle,
    InProgress(Round),
}

/// Runs rounds against a question store and a score board.
///
/// Every operation that changes the round takes `&mut self`, so at most one caller
/// drives a round at a time. Share an engine between threads behind a `Mutex`.
pub struct RoundEngine<S> {
    questions: QuestionStore<S>,
    scores: ScoreBoard<S>,
    config: Arc<Config>,
    state: RoundState,
}

impl<S: Storage> RoundEngine<S> {
    pub fn new(questions: QuestionStore<S>, scores: ScoreBoard<S>, config: Arc<Config>) -> Self {
        RoundEngine {
            questions,
            scores,
            config,
            state: RoundState::Idle,
        }
    }

    /// Draw the questions for a round of type `round_type` and start it.
    ///
    /// A round already in progress is discarded along with its answers. If drawing
    /// the questions fails, the engine is left as it was.
    pub fn start_round(&mut self, round_type: &str) -> Result<()> {
        let spec = self.config.round_type(round_type)?.clone();
        let specific_count = i64::from(spec.specific_count);
        let general_count = i64::from(spec.general_count);

        let mut batch = if spec.category == Category::General {
            self.questions
                .fetch(&Category::General, specific_count + general_count)?
        } else {
            let mut batch = self.questions.fetch(&spec.category, specific_count)?;
            batch.extend(self.questions.fetch(&Category::General, general_count)?);
            batch
        };
        batch.shuffle(&mut thread_rng());

        if let RoundState::InProgress(previous) = &self.state {
            if previous.answered() > 0 {
                warn!(
                    "Discarding {} unsaved answers from the previous {} round",
                    previous.answered(),
                    previous.category()
                );
            }
        }

        info!(
            "Starting {} round with {} questions",
            round_type,
            batch.len()
        );
        self.state = RoundState::InProgress(Round::new(spec.category, batch));
        Ok(())
    }

    pub fn answer_current_yes(&mut self) -> Result<()> {
        self.round_mut()?.answer(Answer::Yes)
    }

    pub fn answer_current_no(&mut self) -> Result<()> {
        self.round_mut()?.answer(Answer::No)
    }

    pub fn answer_current(&mut self, answer: Answer) -> Result<()> {
        self.round_mut()?.answer(answer)
    }

    pub fn has_more_questions(&self) -> Result<bool> {
        Ok(self.round()?.remaining() > 0)
    }

    /// The question waiting for an answer, or `None` once all have been answered.
    pub fn current_question(&self) -> Result<Option<&Question>> {
        Ok(self.round()?.current())
    }

    /// Score the round, commit usage counts and the score, and go back to idle.
    ///
    /// If a commit fails, the round stays in progress and calling `end_round` again
    /// retries only the steps that have not succeeded yet.
    pub fn end_round(&mut self) -> Result<i64> {
        let round = match &mut self.state {
            RoundState::Idle => return Err(QuizError::RoundNotStarted),
            RoundState::InProgress(round) => round,
        };

        let score = round.compute_score();
        round.score = Some(score);

        // One transaction per category; categories already committed are skipped.
        let mut pending: BTreeMap<Category, Vec<Question>> = BTreeMap::new();
        for question in round.yes_answers.iter().chain(round.no_answers.iter()) {
            if round.committed.contains(&question.category) {
                continue;
            }
            pending
                .entry(question.category.clone())
                .or_default()
                .push(Question {
                    used_count: question.used_count + 1,
                    ..question.clone()
                });
        }
        for (category, used) in pending.into_iter() {
            self.questions.persist_all(&used)?;
            debug!("Committed usage of {} {} questions", used.len(), category);
            round.committed.insert(category);
        }

        if !round.score_recorded {
            self.scores.record(&round.category, score)?;
            round.score_recorded = true;
        }

        info!(
            "Finished {} round: {} answered, score {}",
            round.category,
            round.answered(),
            score
        );
        self.state = RoundState::Idle;
        Ok(score)
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.state, RoundState::InProgress(_))
    }

    pub fn round(&self) -> Result<&Round> {
        match &self.state {
            RoundState::Idle => Err(QuizError::RoundNotStarted),
            RoundState::InProgress(round) => Ok(round),
        }
    }

    fn round_mut(&mut self) -> Result<&mut Round> {
        match &mut self.state {
            RoundState::Idle => Err(QuizError::RoundNotStarted),
            RoundState::InProgress(round) => Ok(round),
        }
    }

    pub fn questions(&self) -> &QuestionStore<S> {
        &self.questions
    }

    pub fn scores(&self) -> &ScoreBoard<S> {
        &self.scores
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
