//! crates/study_assistant_core/src/monitor.rs
//!
//! The call monitor: wraps asynchronous operations, times them, and keeps an
//! in-memory log of every outcome for the admin dashboard.
//!
//! A `CallMonitor` is an ordinary value. Clones share one log, so the binary
//! builds a single monitor at startup and hands clones to whoever needs it.

use crate::domain::{CallStatus, LogEntry, OperationName};
use chrono::Utc;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// The Monitor
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct CallMonitor {
    log: Arc<Mutex<Vec<LogEntry>>>,
}

impl CallMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `call` to completion and records its timing and outcome.
    ///
    /// The result is returned exactly as `call` produced it; an `Err` is logged
    /// with its `Display` text and then handed back unchanged.
    pub async fn track<F, T, E>(&self, operation: OperationName, call: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        let start_time = now_millis();
        let outcome = call.await;
        // Wall-clock time can step backwards; clamp so the duration stays non-negative.
        let end_time = now_millis().max(start_time);

        let (status, error_message) = match &outcome {
            Ok(_) => (CallStatus::Success, None),
            Err(e) => (CallStatus::Error, Some(e.to_string())),
        };
        self.record(LogEntry {
            id: format!("{}-{}", start_time, Uuid::new_v4().simple()),
            operation,
            start_time,
            end_time,
            duration_ms: end_time - start_time,
            status,
            error_message,
        });

        outcome
    }

    /// Wraps `operation` so every invocation is tracked under `name`.
    ///
    /// The returned callable takes the same argument and yields the same result
    /// as `operation`. Operations with several arguments take them as a tuple.
    pub fn wrap<F, A, Fut, T, E>(
        &self,
        name: OperationName,
        operation: F,
    ) -> impl Fn(A) -> BoxFuture<'static, Result<T, E>> + Clone + Send + Sync + 'static
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        A: Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let monitor = self.clone();
        let operation = Arc::new(operation);
        move |args: A| -> BoxFuture<'static, Result<T, E>> {
            let monitor = monitor.clone();
            let operation = Arc::clone(&operation);
            Box::pin(async move { monitor.track(name, async move { operation(args).await }).await })
        }
    }

    /// Returns a copy of every entry, newest `start_time` first.
    pub fn get_log(&self) -> Vec<LogEntry> {
        let mut entries = self.entries().clone();
        entries.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        entries
    }

    /// Drops the whole log. Calls already in flight still record when they finish.
    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Aggregates the log into per-operation counts and durations.
    pub fn summary(&self) -> LogSummary {
        LogSummary::from_entries(&self.entries())
    }

    fn record(&self, entry: LogEntry) {
        debug!(
            operation = %entry.operation,
            duration_ms = entry.duration_ms,
            status = ?entry.status,
            "Recorded monitored call"
        );
        self.entries().push(entry);
    }

    // A panic while holding the lock must not take monitoring down with it.
    fn entries(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

//=========================================================================================
// Dashboard Aggregates
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    pub operation: OperationName,
    pub calls: usize,
    pub errors: usize,
    pub total_duration_ms: i64,
    pub average_duration_ms: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    pub total_calls: usize,
    pub total_errors: usize,
    pub average_duration_ms: i64,
    /// Only operations that appear in the log, in `OperationName` order.
    pub operations: Vec<OperationStats>,
}

impl LogSummary {
    pub fn from_entries(entries: &[LogEntry]) -> Self {
        let total_calls = entries.len();
        let total_errors = entries.iter().filter(|e| e.is_error()).count();
        let total_duration: i64 = entries.iter().map(|e| e.duration_ms).sum();

        let operations = OperationName::ALL
            .iter()
            .filter_map(|&operation| {
                let matching: Vec<&LogEntry> =
                    entries.iter().filter(|e| e.operation == operation).collect();
                if matching.is_empty() {
                    return None;
                }
                let total_duration_ms = matching.iter().map(|e| e.duration_ms).sum();
                Some(OperationStats {
                    operation,
                    calls: matching.len(),
                    errors: matching.iter().filter(|e| e.is_error()).count(),
                    total_duration_ms,
                    average_duration_ms: rounded_average(total_duration_ms, matching.len()),
                })
            })
            .collect();

        Self {
            total_calls,
            total_errors,
            average_duration_ms: rounded_average(total_duration, total_calls),
            operations,
        }
    }
}

fn rounded_average(total: i64, count: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    (total as f64 / count as f64).round() as i64
}

/// Renders a duration the way the dashboard table shows it: `850ms`, `1.50s`.
pub fn format_duration(ms: i64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.2}s", ms as f64 / 1000.0)
    }
}

//=========================================================================================
// Tests
//=========================================================================================
