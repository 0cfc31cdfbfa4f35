//! Sync session plumbing shared by the folder and routine commands.
//!
//! Each mutating command opens the backend, seeds the local library,
//! applies its change optimistically, then drains the queue and reports.

use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::warn;

use super::Context;
use crate::backend::SqliteBackend;
use crate::cli::args::OutputFormat;
use crate::error::RepsyncError;
use crate::features::sync::{SyncEngine, SyncEvent, SyncStatus, TempId};
use crate::output::to_json;

/// A backend connection plus a sync engine writing to it.
pub struct SyncSession {
    backend: Arc<SqliteBackend>,
    engine: SyncEngine,
    events: broadcast::Receiver<SyncEvent>,
    principal: Option<String>,
}

impl SyncSession {
    /// Open the backend and load the principal's library into the engine.
    pub fn open(ctx: &Context) -> Result<Self, RepsyncError> {
        let backend = Arc::new(SqliteBackend::open(
            &ctx.paths.backend_database,
            ctx.principal.clone(),
        )?);
        let engine = SyncEngine::new(backend.clone(), &ctx.config.sync)?;

        if let Some(principal) = &ctx.principal {
            engine
                .library()
                .load(backend.list_folders(principal)?, backend.list_routines(principal)?);
        } else {
            warn!("no principal configured; queued writes cannot sync");
        }

        let events = engine.subscribe();
        Ok(Self {
            backend,
            engine,
            events,
            principal: ctx.principal.clone(),
        })
    }

    pub const fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// The principal, required for reads.
    pub fn principal(&self) -> Result<&str, RepsyncError> {
        self.principal
            .as_deref()
            .ok_or_else(|| RepsyncError::Config("No user set; pass --user or set backend.principal".to_string()))
    }

    pub fn backend(&self) -> &SqliteBackend {
        &self.backend
    }

    /// Drain the queue and collect what happened.
    pub async fn finish(mut self) -> SyncReport {
        let status = self.engine.flush().await;

        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Lagged(missed)) => warn!(missed, "sync events lagged"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        SyncReport { events, status }
    }
}

/// Outcome of draining the queue for one command.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub events: Vec<SyncEvent>,
    pub status: SyncStatus,
}

impl SyncReport {
    /// The real id that replaced `temp`, if its create synced.
    #[must_use]
    pub fn resolved_id(&self, temp: &TempId) -> Option<&str> {
        self.events.iter().find_map(|event| match event {
            SyncEvent::Reconciled { temp_id, real_id } if temp_id == temp => Some(real_id.as_str()),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&SyncEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.count(|e| matches!(e, SyncEvent::Completed { .. }))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|e| matches!(e, SyncEvent::Skipped { .. }))
    }

    #[must_use]
    pub fn dropped(&self) -> usize {
        self.count(|e| matches!(e, SyncEvent::Dropped { .. }))
    }

    #[must_use]
    pub fn retries(&self) -> usize {
        self.count(|e| matches!(e, SyncEvent::Retrying { .. }))
    }
}

/// Format a command result followed by its sync report.
pub fn format_sync_report(
    headline: &str,
    subject: serde_json::Value,
    report: &SyncReport,
    format: OutputFormat,
) -> Result<String, RepsyncError> {
    match format {
        OutputFormat::Json => to_json(&serde_json::json!({
            "result": subject,
            "sync": report,
        })),
        OutputFormat::Pretty => Ok(format!("{headline}\n{}", format_sync_report_pretty(report))),
    }
}

fn format_sync_report_pretty(report: &SyncReport) -> String {
    let mut lines = Vec::new();

    let operations = report.succeeded() + report.skipped() + report.dropped();
    lines.push(format!("Sync: {operations} operations"));
    lines.push("─".repeat(40));

    if report.succeeded() > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} synced", report.succeeded()).green()
        ));
    }

    if report.retries() > 0 {
        lines.push(format!(
            "  {} {}",
            "↻".yellow(),
            format!("{} retries", report.retries()).yellow()
        ));
    }

    if report.dropped() > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} dropped", report.dropped()).red()
        ));
    }

    if report.skipped() > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} skipped", report.skipped()).yellow()
        ));
    }

    let problems: Vec<_> = report
        .events
        .iter()
        .filter_map(|event| match event {
            SyncEvent::Dropped { kind, reason, .. } | SyncEvent::Skipped { kind, reason, .. } => {
                Some(format!("  - {kind}: {reason}"))
            },
            _ => None,
        })
        .take(3)
        .collect();

    if !problems.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        lines.extend(problems);
    }

    if report.status.queue_length > 0 {
        lines.push(format!(
            "  {} still queued",
            report.status.queue_length.to_string().yellow()
        ));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sync::OperationKind;

    fn report(events: Vec<SyncEvent>) -> SyncReport {
        SyncReport {
            events,
            status: SyncStatus {
                queue_length: 0,
                is_processing: false,
                pending_operations: Vec::new(),
            },
        }
    }

    #[test]
    fn test_resolved_id() {
        let temp = TempId::mint();
        let report = report(vec![
            SyncEvent::Completed {
                id: 1,
                kind: OperationKind::CreateFolder,
                produced_id: Some("f-1".to_string()),
            },
            SyncEvent::Reconciled {
                temp_id: temp.clone(),
                real_id: "f-1".to_string(),
            },
        ]);

        assert_eq!(report.resolved_id(&temp), Some("f-1"));
        assert_eq!(report.resolved_id(&TempId::mint()), None);
        assert_eq!(report.succeeded(), 1);
    }

    #[test]
    fn test_pretty_report_lists_drops() {
        let report = report(vec![
            SyncEvent::Retrying {
                id: 1,
                kind: OperationKind::CreateFolder,
                retry_count: 1,
                reason: "not authenticated".to_string(),
            },
            SyncEvent::Dropped {
                id: 1,
                kind: OperationKind::CreateFolder,
                retry_count: 4,
                reason: "not authenticated".to_string(),
            },
        ]);

        let output = format_sync_report_pretty(&report);
        assert!(output.contains("Sync: 1 operations"));
        assert!(output.contains("1 dropped"));
        assert!(output.contains("Create Folder: not authenticated"));
    }

    #[test]
    fn test_json_report_shape() {
        let output = format_sync_report(
            "ignored",
            serde_json::json!({"id": "f-1"}),
            &report(Vec::new()),
            OutputFormat::Json,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["result"]["id"], "f-1");
        assert_eq!(value["sync"]["status"]["queue_length"], 0);
    }
}
