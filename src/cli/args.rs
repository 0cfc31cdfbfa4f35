use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::library::Exercise;

#[derive(Parser)]
#[command(name = "repsync")]
#[command(about = "Offline-first workout routines and live workout tracking")]
#[command(long_about = "repsync - offline-first workout routines

Organize routines into folders and track live workouts. Edits are applied
locally first and replayed against the backend in order, with retries.

QUICK START:
  repsync folder create \"Push\"                  Create a folder
  repsync routine create \"Bench day\" --folder <ID> --exercise \"Bench:3x5@80\"
  repsync workout start                          Start tracking a workout

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  repsync <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    /// Principal to act as against the backend
    ///
    /// Overrides `backend.principal` from the config file.
    #[arg(short, long, env = "REPSYNC_USER", global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage routine folders
    ///
    /// Every change is applied locally, queued, and synced before the
    /// command exits. The sync report shows what reached the backend.
    #[command(alias = "f")]
    Folder(FolderArgs),

    /// Manage routines
    #[command(alias = "r")]
    Routine(RoutineArgs),

    /// Track a live workout
    ///
    /// The active workout survives restarts; set edits are saved after a
    /// short quiet window, everything else immediately.
    #[command(alias = "w")]
    Workout(WorkoutArgs),
}

/// Arguments for folder commands.
#[derive(Args)]
pub struct FolderArgs {
    #[command(subcommand)]
    pub command: FolderCommands,
}

/// Folder subcommands.
#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder
    Create {
        /// Folder name
        name: String,

        /// Mark as the default folder
        #[arg(long)]
        default: bool,
    },

    /// Rename a folder
    Rename {
        /// Folder ID
        id: String,

        /// New name
        name: String,
    },

    /// Delete a folder and every routine in it
    Delete {
        /// Folder ID
        id: String,
    },

    /// List folders
    #[command(alias = "ls")]
    List,
}

/// Arguments for routine commands.
#[derive(Args)]
pub struct RoutineArgs {
    #[command(subcommand)]
    pub command: RoutineCommands,
}

/// Routine subcommands.
#[derive(Subcommand)]
pub enum RoutineCommands {
    /// Create a routine
    ///
    /// Examples:
    ///   repsync routine create "Upper" --exercise "Bench:3x5@80" --exercise "Row:3x8@60"
    ///   repsync routine create "Legs" --folder <FOLDER_ID>
    Create {
        /// Routine name
        name: String,

        /// Folder to file the routine under
        #[arg(long, short = 'f')]
        folder: Option<String>,

        /// Exercise as NAME:SETSxREPS@WEIGHT (repeatable)
        #[arg(long, short = 'e', value_parser = parse_exercise)]
        exercise: Vec<Exercise>,

        /// Mark as a default routine
        #[arg(long)]
        default: bool,
    },

    /// Rename a routine, optionally moving it or replacing its exercises
    Rename {
        /// Routine ID
        id: String,

        /// New name
        name: String,

        /// Move to this folder
        #[arg(long, short = 'f')]
        folder: Option<String>,

        /// Replacement exercises as NAME:SETSxREPS@WEIGHT (repeatable)
        #[arg(long, short = 'e', value_parser = parse_exercise)]
        exercise: Vec<Exercise>,
    },

    /// Delete a routine
    Delete {
        /// Routine ID
        id: String,
    },

    /// List routines
    #[command(alias = "ls")]
    List {
        /// Only routines in this folder
        #[arg(long, short = 'f')]
        folder: Option<String>,
    },
}

/// Arguments for workout commands.
#[derive(Args)]
pub struct WorkoutArgs {
    #[command(subcommand)]
    pub command: WorkoutCommands,
}

/// Workout subcommands. Exercise and set numbers start at 1.
#[derive(Subcommand)]
pub enum WorkoutCommands {
    /// Start a new workout
    Start {
        /// Notes for this workout
        #[arg(long, short = 'n')]
        notes: Option<String>,
    },

    /// Add an exercise to the active workout
    AddExercise {
        /// Exercise name
        name: String,
    },

    /// Add a set to an exercise
    AddSet {
        /// Exercise number
        exercise: usize,

        /// Weight
        #[arg(long, short = 'w', default_value = "0")]
        weight: f64,

        /// Repetitions
        #[arg(long, short = 'r', default_value = "0")]
        reps: u32,
    },

    /// Change a set's weight or reps
    Set {
        /// Exercise number
        exercise: usize,

        /// Set number
        set: usize,

        /// New weight
        #[arg(long, short = 'w')]
        weight: Option<f64>,

        /// New repetitions
        #[arg(long, short = 'r')]
        reps: Option<u32>,
    },

    /// Toggle a set's completed mark
    CompleteSet {
        /// Exercise number
        exercise: usize,

        /// Set number
        set: usize,
    },

    /// Pause the active workout
    Pause,

    /// Resume a paused workout
    Resume,

    /// Show the active workout
    Status,

    /// Finish the workout and record it in history
    Finish,

    /// Throw the active workout away
    Discard,

    /// Show completed workouts
    History {
        /// Number of workouts to show
        #[arg(long, short = 'n', default_value = "10")]
        limit: usize,
    },
}

/// Parse `NAME:SETSxREPS@WEIGHT`. Reps and weight are optional: `Plank:3`,
/// `Pull-up:3x8`, `Squat:5x5@100`. A bare name gets no sets.
pub fn parse_exercise(input: &str) -> Result<Exercise, String> {
    let (name, scheme) = match input.rsplit_once(':') {
        Some((name, scheme)) => (name.trim(), Some(scheme.trim())),
        None => (input.trim(), None),
    };
    if name.is_empty() {
        return Err(format!("exercise name is empty in '{input}'"));
    }
    let Some(scheme) = scheme else {
        return Ok(Exercise::new(name));
    };

    let (volume, weight) = match scheme.split_once('@') {
        Some((volume, weight)) => {
            let weight = weight
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid weight in '{input}'"))?;
            (volume, weight)
        },
        None => (scheme, 0.0),
    };
    let (sets, reps) = match volume.split_once(['x', 'X']) {
        Some((sets, reps)) => (sets, reps.trim().parse::<u32>().map_err(|_| format!("invalid reps in '{input}'"))?),
        None => (volume, 0),
    };
    let sets = sets
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid set count in '{input}'"))?;

    Ok(Exercise::with_sets(name, sets, weight, reps))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_folder_create() {
        let cli = Cli::try_parse_from(["repsync", "folder", "create", "Push"]).unwrap();
        if let Commands::Folder(args) = cli.command {
            if let FolderCommands::Create { name, default } = args.command {
                assert_eq!(name, "Push");
                assert!(!default);
            } else {
                panic!("Expected Create subcommand");
            }
        } else {
            panic!("Expected Folder command");
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["repsync", "folder", "list", "-o", "json", "--user", "u1"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.user.as_deref(), Some("u1"));
    }

    #[test]
    fn test_cli_routine_create_with_exercises() {
        let cli = Cli::try_parse_from([
            "repsync",
            "routine",
            "create",
            "Upper",
            "--folder",
            "f-1",
            "-e",
            "Bench:3x5@80",
            "-e",
            "Row:2x8",
        ])
        .unwrap();
        if let Commands::Routine(args) = cli.command {
            if let RoutineCommands::Create { folder, exercise, .. } = args.command {
                assert_eq!(folder.as_deref(), Some("f-1"));
                assert_eq!(exercise.len(), 2);
                assert_eq!(exercise[0].sets.len(), 3);
            } else {
                panic!("Expected Create subcommand");
            }
        } else {
            panic!("Expected Routine command");
        }
    }

    #[test]
    fn test_cli_workout_set() {
        let cli = Cli::try_parse_from(["repsync", "workout", "set", "1", "2", "--weight", "62.5"]).unwrap();
        if let Commands::Workout(args) = cli.command {
            assert!(matches!(
                args.command,
                WorkoutCommands::Set { exercise: 1, set: 2, weight: Some(_), reps: None }
            ));
        } else {
            panic!("Expected Workout command");
        }
    }

    #[test]
    fn test_parse_exercise_full() {
        let exercise = parse_exercise("Bench press:5x5@102.5").unwrap();
        assert_eq!(exercise.name, "Bench press");
        assert_eq!(exercise.sets.len(), 5);
        assert_eq!(exercise.sets[0].reps, 5);
        assert_eq!(exercise.sets[0].weight, 102.5);
    }

    #[test]
    fn test_parse_exercise_partial() {
        assert!(parse_exercise("Plank").unwrap().sets.is_empty());
        let pullups = parse_exercise("Pull-up:3x8").unwrap();
        assert_eq!(pullups.sets.len(), 3);
        assert_eq!(pullups.sets[0].weight, 0.0);
    }

    #[test]
    fn test_parse_exercise_errors() {
        assert!(parse_exercise(":3x5").is_err());
        assert!(parse_exercise("Squat:ax5").is_err());
        assert!(parse_exercise("Squat:3x5@heavy").is_err());
    }

    #[test]
    fn test_output_format_default() {
        assert!(matches!(OutputFormat::default(), OutputFormat::Pretty));
    }
}
