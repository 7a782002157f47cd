//! Background job runner with per-operation view state
//!
//! Every operation owns one view. A view runs at most one job at a time; a
//! second request while busy is rejected instead of queued.

use crate::error::{Error, Result};
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The operations offered by the toolkit, one view each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Merge,
    Split,
    ExtractPages,
    ExtractText,
    ExtractImages,
    Compress,
    AddPassword,
    RemovePassword,
    Watermark,
    ConvertToDocx,
    ConvertToXlsx,
    ConvertToImages,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::Merge,
        Operation::Split,
        Operation::ExtractPages,
        Operation::ExtractText,
        Operation::ExtractImages,
        Operation::Compress,
        Operation::AddPassword,
        Operation::RemovePassword,
        Operation::Watermark,
        Operation::ConvertToDocx,
        Operation::ConvertToXlsx,
        Operation::ConvertToImages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Merge => "merge",
            Operation::Split => "split",
            Operation::ExtractPages => "extract_pages",
            Operation::ExtractText => "extract_text",
            Operation::ExtractImages => "extract_images",
            Operation::Compress => "compress",
            Operation::AddPassword => "add_password",
            Operation::RemovePassword => "remove_password",
            Operation::Watermark => "watermark",
            Operation::ConvertToDocx => "convert_to_docx",
            Operation::ConvertToXlsx => "convert_to_xlsx",
            Operation::ConvertToImages => "convert_to_images",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
}

/// Snapshot of one view
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct ViewState {
    pub busy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub completed_runs: u64,
}

type Views = Arc<Mutex<HashMap<Operation, ViewState>>>;

/// Progress callback handed to a running job
#[derive(Clone)]
pub struct ProgressSink {
    operation: Operation,
    views: Views,
}

impl ProgressSink {
    pub fn report(&self, current: u32, total: u32) {
        tracing::debug!(operation = %self.operation, current, total, "progress");
        self.views.lock().entry(self.operation).or_default().progress =
            Some(Progress { current, total });
    }
}

/// Marks a view busy for its lifetime
struct ActiveJob {
    operation: Operation,
    views: Views,
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        let mut views = self.views.lock();
        let view = views.entry(self.operation).or_default();
        view.busy = false;
        view.completed_runs += 1;
    }
}

/// Owner of all views; cheap to clone
#[derive(Clone, Default)]
pub struct Workbench {
    views: Views,
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_begin(&self, operation: Operation) -> Result<ActiveJob> {
        let mut views = self.views.lock();
        let view = views.entry(operation).or_default();
        if view.busy {
            return Err(Error::Busy {
                operation: operation.to_string(),
            });
        }
        view.busy = true;
        view.progress = None;
        view.last_error = None;
        Ok(ActiveJob {
            operation,
            views: Arc::clone(&self.views),
        })
    }

    /// Current state of one view
    pub fn state(&self, operation: Operation) -> ViewState {
        self.views
            .lock()
            .get(&operation)
            .cloned()
            .unwrap_or_default()
    }

    /// Run `job` on the blocking pool, rejecting it if the view is busy.
    pub async fn run<T, F>(&self, operation: Operation, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(ProgressSink) -> Result<T> + Send + 'static,
    {
        let active = self.try_begin(operation)?;
        let sink = ProgressSink {
            operation,
            views: Arc::clone(&self.views),
        };

        tracing::debug!(%operation, "job started");
        let outcome = tokio::task::spawn_blocking(move || {
            // The guard travels with the job so the view frees even on panic
            let _active = active;
            job(sink)
        })
        .await
        .map_err(|e| Error::WorkerFailed {
            reason: format!("Task join error: {}", e),
        })
        .and_then(|result| result);

        if let Err(e) = &outcome {
            self.views.lock().entry(operation).or_default().last_error = Some(e.client_message());
        }
        outcome
    }
}
