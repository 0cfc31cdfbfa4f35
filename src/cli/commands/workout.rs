//! Workout command implementation.
//!
//! Handles active workout tracking commands.

use std::sync::Arc;

use colored::Colorize;

use super::Context;
use crate::cli::args::{OutputFormat, WorkoutCommands};
use crate::error::RepsyncError;
use crate::features::workout::{WorkoutSession, WorkoutTracker};
use crate::output::{format_history, format_workout, to_json};
use crate::storage::KvStore;

/// Execute workout subcommands.
pub fn workout(ctx: &Context, cmd: WorkoutCommands) -> Result<String, RepsyncError> {
    let kv = KvStore::open(&ctx.paths.database)?;
    let mut tracker = WorkoutTracker::new(Arc::new(kv), &ctx.config.session)?;
    tracker.restore_on_launch();
    tracker.expand();

    let output = run(&mut tracker, cmd, ctx.format);

    // Debounced set edits must land before the process exits.
    tracker.flush()?;
    output
}

fn run(
    tracker: &mut WorkoutTracker,
    cmd: WorkoutCommands,
    format: OutputFormat,
) -> Result<String, RepsyncError> {
    match cmd {
        WorkoutCommands::Start { notes } => {
            let session = tracker.start_workout(notes)?;
            match format {
                OutputFormat::Json => to_json(session),
                OutputFormat::Pretty => Ok(format!(
                    "{} Workout started\n  {}: {}",
                    "▶".green(),
                    "ID".dimmed(),
                    session.id
                )),
            }
        },

        WorkoutCommands::AddExercise { name } => {
            let index = tracker.add_exercise(name.clone())?;
            updated(tracker, format, &format!("Added exercise #{} {}", index + 1, name.bold()))
        },

        WorkoutCommands::AddSet {
            exercise,
            weight,
            reps,
        } => {
            let set = tracker.add_set(index(exercise, "exercise")?, weight, reps)?;
            updated(
                tracker,
                format,
                &format!("Added set #{} to exercise #{exercise}: {weight} x {reps}", set + 1),
            )
        },

        WorkoutCommands::Set {
            exercise,
            set,
            weight,
            reps,
        } => {
            if weight.is_none() && reps.is_none() {
                return Err(RepsyncError::Config("Nothing to change; pass --weight or --reps".to_string()));
            }
            tracker.update_set(index(exercise, "exercise")?, index(set, "set")?, weight, reps)?;
            updated(tracker, format, &format!("Updated set #{set} of exercise #{exercise}"))
        },

        WorkoutCommands::CompleteSet { exercise, set } => {
            let done = tracker.toggle_set_completed(index(exercise, "exercise")?, index(set, "set")?)?;
            let verb = if done { "Completed" } else { "Reopened" };
            updated(tracker, format, &format!("{verb} set #{set} of exercise #{exercise}"))
        },

        WorkoutCommands::Pause => {
            tracker.pause()?;
            updated(tracker, format, &format!("{} Workout paused", "⏸".yellow()))
        },

        WorkoutCommands::Resume => {
            tracker.resume()?;
            updated(tracker, format, &format!("{} Workout resumed", "▶".green()))
        },

        WorkoutCommands::Status => match tracker.active() {
            Some(session) => format_workout(session, format),
            None => match format {
                OutputFormat::Json => to_json(&serde_json::json!({ "active": false })),
                OutputFormat::Pretty => Ok("No active workout".to_string()),
            },
        },

        WorkoutCommands::Finish => {
            let session = tracker.finish_workout()?;
            finished(&session, format, "Workout finished")
        },

        WorkoutCommands::Discard => {
            let session = tracker.discard_workout()?;
            finished(&session, format, "Workout discarded")
        },

        WorkoutCommands::History { limit } => {
            let history = tracker.history();
            let skip = history.len().saturating_sub(limit);
            format_history(&history[skip..], format)
        },
    }
}

/// Convert a 1-based number from the command line into an index.
fn index(number: usize, what: &str) -> Result<usize, RepsyncError> {
    number
        .checked_sub(1)
        .ok_or_else(|| RepsyncError::NotFound(format!("{what} #0; numbering starts at 1")))
}

fn updated(tracker: &WorkoutTracker, format: OutputFormat, message: &str) -> Result<String, RepsyncError> {
    let session = tracker.active().ok_or(RepsyncError::NoActiveSession)?;
    match format {
        OutputFormat::Json => to_json(session),
        OutputFormat::Pretty => Ok(format!("{message}\n\n{}", format_workout(session, format)?)),
    }
}

fn finished(session: &WorkoutSession, format: OutputFormat, message: &str) -> Result<String, RepsyncError> {
    match format {
        OutputFormat::Json => to_json(session),
        OutputFormat::Pretty => Ok(format!("{message}\n\n{}", format_workout(session, format)?)),
    }
}
