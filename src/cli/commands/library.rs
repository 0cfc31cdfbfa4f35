//! Folder and routine command implementations.

use colored::Colorize;
use serde_json::json;

use super::sync::{format_sync_report, SyncSession};
use super::Context;
use crate::cli::args::{FolderCommands, RoutineCommands};
use crate::error::RepsyncError;
use crate::library::{Exercise, FolderDraft, FolderPatch, RoutineDraft, RoutinePatch};
use crate::output::{format_folders, format_routines};

/// Execute folder subcommands.
pub async fn folder(ctx: &Context, cmd: FolderCommands) -> Result<String, RepsyncError> {
    let session = SyncSession::open(ctx)?;

    match cmd {
        FolderCommands::Create { name, default } => {
            let temp = session.engine().create_folder_optimistic(FolderDraft {
                name: name.clone(),
                is_default: default,
            });
            let report = session.finish().await;
            let id = report.resolved_id(&temp).unwrap_or(temp.as_str()).to_string();

            format_sync_report(
                &format!("Created folder {} ({})", name.bold(), id.dimmed()),
                json!({ "id": id, "tempId": temp, "name": name }),
                &report,
                ctx.format,
            )
        },

        FolderCommands::Rename { id, name } => {
            require_folder(&session, &id)?;
            session
                .engine()
                .update_folder_optimistic(&id, FolderPatch::rename(name.clone()));
            let report = session.finish().await;

            format_sync_report(
                &format!("Renamed folder {} to {}", id.dimmed(), name.bold()),
                json!({ "id": id, "name": name }),
                &report,
                ctx.format,
            )
        },

        FolderCommands::Delete { id } => {
            let folder = require_folder(&session, &id)?;
            let routines = session.engine().library().routines_in_folder(&id).len();
            session.engine().delete_folder_optimistic(&id);
            let report = session.finish().await;

            format_sync_report(
                &format!(
                    "Deleted folder {} and {routines} routines",
                    folder.bold()
                ),
                json!({ "id": id, "deletedRoutines": routines }),
                &report,
                ctx.format,
            )
        },

        FolderCommands::List => {
            session.principal()?;
            let library = session.engine().library();
            format_folders(&library.folders(), &library.routines(), ctx.format)
        },
    }
}

/// Execute routine subcommands.
pub async fn routine(ctx: &Context, cmd: RoutineCommands) -> Result<String, RepsyncError> {
    let session = SyncSession::open(ctx)?;

    match cmd {
        RoutineCommands::Create {
            name,
            folder,
            exercise,
            default,
        } => {
            if let Some(folder_id) = &folder {
                require_folder(&session, folder_id)?;
            }
            let temp = session.engine().create_routine_optimistic(RoutineDraft {
                name: name.clone(),
                folder_id: folder.clone(),
                is_default: default,
                exercises: exercise,
            });
            let report = session.finish().await;
            let id = report.resolved_id(&temp).unwrap_or(temp.as_str()).to_string();

            format_sync_report(
                &format!("Created routine {} ({})", name.bold(), id.dimmed()),
                json!({ "id": id, "tempId": temp, "name": name, "folderId": folder }),
                &report,
                ctx.format,
            )
        },

        RoutineCommands::Rename {
            id,
            name,
            folder,
            exercise,
        } => {
            require_routine(&session, &id)?;
            if let Some(folder_id) = &folder {
                require_folder(&session, folder_id)?;
            }
            session.engine().update_routine_optimistic(
                &id,
                RoutinePatch {
                    name: Some(name.clone()),
                    folder_id: folder,
                    exercises: replacement(exercise),
                },
            );
            let report = session.finish().await;

            format_sync_report(
                &format!("Updated routine {} ({})", name.bold(), id.dimmed()),
                json!({ "id": id, "name": name }),
                &report,
                ctx.format,
            )
        },

        RoutineCommands::Delete { id } => {
            let name = require_routine(&session, &id)?;
            session.engine().delete_routine_optimistic(&id);
            let report = session.finish().await;

            format_sync_report(
                &format!("Deleted routine {}", name.bold()),
                json!({ "id": id }),
                &report,
                ctx.format,
            )
        },

        RoutineCommands::List { folder } => {
            session.principal()?;
            let library = session.engine().library();
            let routines = match folder {
                Some(folder_id) => library.routines_in_folder(&folder_id),
                None => library.routines(),
            };
            format_routines(&routines, ctx.format)
        },
    }
}

fn replacement(exercises: Vec<Exercise>) -> Option<Vec<Exercise>> {
    (!exercises.is_empty()).then_some(exercises)
}

/// Name of folder `id`, or `NotFound`.
fn require_folder(session: &SyncSession, id: &str) -> Result<String, RepsyncError> {
    session
        .engine()
        .library()
        .folder(id)
        .map(|f| f.name)
        .ok_or_else(|| RepsyncError::NotFound(format!("folder {id}")))
}

/// Name of routine `id`, or `NotFound`.
fn require_routine(session: &SyncSession, id: &str) -> Result<String, RepsyncError> {
    session
        .engine()
        .library()
        .routine(id)
        .map(|r| r.name)
        .ok_or_else(|| RepsyncError::NotFound(format!("routine {id}")))
}
