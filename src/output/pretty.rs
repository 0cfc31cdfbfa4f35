use colored::Colorize;

use crate::features::workout::{format_duration_short, WorkoutSession, WorkoutStatus};
use crate::features::sync::is_temp_id;
use crate::library::{Folder, Routine};

fn pending_marker(id: &str) -> String {
    if is_temp_id(id) {
        format!("  {}", "(unsynced)".yellow())
    } else {
        String::new()
    }
}

/// Format a list of folders as pretty output
pub fn format_folders_pretty(folders: &[Folder], routines: &[Routine]) -> String {
    if folders.is_empty() {
        return "Folders (0)\n  No folders".to_string();
    }

    let mut output = format!("Folders ({})\n", folders.len());
    output.push_str(&"─".repeat(40));
    output.push('\n');

    for folder in folders {
        let count = routines
            .iter()
            .filter(|r| r.folder_id.as_deref() == Some(folder.id.as_str()))
            .count();
        let mut line = format!("  {}  {}", folder.name.bold(), folder.id.dimmed());
        if folder.is_default {
            line.push_str(&format!("  {}", "default".cyan()));
        }
        line.push_str(&format!("  {}", format!("{count} routines").dimmed()));
        line.push_str(&pending_marker(&folder.id));
        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Format a list of routines as pretty output
pub fn format_routines_pretty(routines: &[Routine]) -> String {
    if routines.is_empty() {
        return "Routines (0)\n  No routines".to_string();
    }

    let mut output = format!("Routines ({})\n", routines.len());
    output.push_str(&"─".repeat(40));
    output.push('\n');

    for routine in routines {
        let mut line = format!("  {}  {}", routine.name.bold(), routine.id.dimmed());
        if let Some(folder_id) = &routine.folder_id {
            line.push_str(&format!("  {}", format!("in {folder_id}").dimmed()));
        }
        line.push_str(&pending_marker(&routine.id));
        output.push_str(&line);
        output.push('\n');

        for exercise in &routine.exercises {
            let summary = exercise.sets.first().map_or_else(String::new, |set| {
                format!("{}x{} @ {}", exercise.sets.len(), set.reps, set.weight)
            });
            output.push_str(&format!("    - {}  {}\n", exercise.name, summary.dimmed()));
        }
    }

    output
}

/// Format a workout with its exercises and sets
pub fn format_workout_pretty(session: &WorkoutSession) -> String {
    let status = match session.status {
        WorkoutStatus::Active if session.is_paused() => "Paused".yellow(),
        WorkoutStatus::Active => "Active".green(),
        WorkoutStatus::Completed => "Completed".cyan(),
        WorkoutStatus::Discarded => "Discarded".red(),
    };

    let mut output = format!(
        "{} {}  {}\n",
        "Workout".bold(),
        status,
        format_duration_short(session.elapsed()).dimmed()
    );
    output.push_str(&format!(
        "  {}: {}\n",
        "Started".dimmed(),
        session.start_time_local().format("%Y-%m-%d %H:%M")
    ));
    if let Some(notes) = &session.notes {
        output.push_str(&format!("  {}: {}\n", "Notes".dimmed(), notes));
    }
    output.push_str(&format!(
        "  {}: {}/{}  {}: {}\n",
        "Sets".dimmed(),
        session.completed_sets(),
        session.total_sets(),
        "Volume".dimmed(),
        session.volume()
    ));

    for (i, exercise) in session.exercises.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, exercise.name.bold()));
        for (j, set) in exercise.sets.iter().enumerate() {
            let icon = if set.completed { "[x]".green() } else { "[ ]".white() };
            output.push_str(&format!("     {} {}  {} x {}\n", icon, j + 1, set.weight, set.reps));
        }
    }

    output
}

/// Format completed workouts as pretty output
pub fn format_history_pretty(sessions: &[WorkoutSession]) -> String {
    if sessions.is_empty() {
        return "Workouts (0)\n  No completed workouts".to_string();
    }

    let mut output = format!("Workouts ({})\n", sessions.len());
    output.push_str(&"─".repeat(40));
    output.push('\n');

    for session in sessions {
        let mut line = format!(
            "  {}  {}  {}/{} sets",
            session.start_time_local().format("%Y-%m-%d %H:%M"),
            format_duration_short(session.elapsed()).bold(),
            session.completed_sets(),
            session.total_sets()
        );
        if let Some(notes) = &session.notes {
            line.push_str(&format!("  {}", notes.dimmed()));
        }
        output.push_str(&line);
        output.push('\n');
    }

    output
}
