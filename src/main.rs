/**
 * Play yes/no quiz rounds from the command line.
 *
 * Version: October 2026
 */
use std::io::Write;

use clap::Parser;
use colored::*;

use preflight::common::{Command, Options, TakeOptions};
use preflight::config::{default_app_dir, require_app_dir};
use preflight::ui::CmdUI;
use preflight::{my_println, QuizError, Result, RoundEngine, SessionBuilder, Storage};

fn main() {
    env_logger::init();
    let options = Options::parse();

    if options.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(options) {
        eprintln!("{}: {}", "Error".red(), e);
        ::std::process::exit(2);
    }
}

fn run(options: Options) -> Result<()> {
    let dir = match options.directory {
        Some(dir) => dir,
        None => default_app_dir()?,
    };
    let dir = require_app_dir(&dir)?;
    let mut engine = SessionBuilder::for_app_dir(&dir)?.build()?;

    match options.cmd {
        Command::Take(options) => main_take(&mut engine, &options),
        Command::Stats => main_stats(&engine),
        Command::Rounds => main_rounds(&engine),
    }
}

/// The main function for the `take` subcommand.
fn main_take<S: Storage>(engine: &mut RoundEngine<S>, options: &TakeOptions) -> Result<()> {
    engine.start_round(&options.name)?;

    let mut ui = CmdUI::new();
    if !engine.has_more_questions()? {
        return ui.warning(&format!("There are no questions for a {} round.", options.name));
    }

    while let Some(question) = engine.current_question()?.cloned() {
        ui.next();
        ui.text(&question.text)?;
        match ui.prompt_answer() {
            Ok(Some(answer)) => {
                engine.answer_current(answer)?;
            }
            // Ctrl+D ends the round early and scores what was answered.
            Ok(None) => {
                break;
            }
            // Ctrl+C abandons the round without saving anything.
            Err(QuizError::ReadlineInterrupted) => {
                my_println!()?;
                return ui.status("Round abandoned.");
            }
            Err(e) => {
                return Err(e);
            }
        }
    }

    let round = engine.round()?;
    let category = round.category().clone();
    let answered = round.answered();
    let score = engine.end_round()?;

    let total = engine.scores().total(&category)?;
    let average = engine.scores().average(&category)?;
    ui.results(&category, score, answered, total, average)
}

/// The main function for the `stats` subcommand.
fn main_stats<S: Storage>(engine: &RoundEngine<S>) -> Result<()> {
    let mut ui = CmdUI::new();
    ui.stats_header()?;
    for category in engine.config().categories() {
        let scores = engine.scores();
        let rounds = scores.samples(category)?;
        let total = scores.total(category)?;
        let average = scores.average(category)?;
        ui.stats_line(category, rounds, total, average)?;
    }
    Ok(())
}

/// The main function for the `rounds` subcommand.
fn main_rounds<S: Storage>(engine: &RoundEngine<S>) -> Result<()> {
    for (name, spec) in engine.config().round_types() {
        let stored = engine.questions().count(&spec.category)?;
        if spec.category == preflight::Category::General {
            my_println!(
                "{}: {} general questions ({} stored)",
                name.cyan(),
                spec.specific_count + spec.general_count,
                stored
            )?;
        } else {
            my_println!(
                "{}: {} {} + {} general questions ({} stored)",
                name.cyan(),
                spec.specific_count,
                spec.category,
                spec.general_count,
                stored
            )?;
        }
    }
    Ok(())
}
