//! Calculation audit trail.
//!
//! Every financial calculation is reported here: one entry per call,
//! success or failure, with timing. Storage sits behind [`AuditSink`] so
//! the in-memory ring used in production (most recent 1000 entries) can be
//! swapped without touching the reporting layer.

use chrono::{DateTime, Utc};
use queen_of_hearts_shared::constants::MAX_AUDIT_LOG_ENTRIES;
use queen_of_hearts_shared::types::AuditOperation;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use uuid::Uuid;

use crate::calculations::CalculationResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub operation: AuditOperation,
    pub game_id: Option<Uuid>,
    pub week_id: Option<Uuid>,
    /// Free-form identity of whoever triggered the operation.
    pub operator: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Filters for reading the audit trail back. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub operation: Option<AuditOperation>,
    pub game_id: Option<Uuid>,
    pub week_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

/// Append-only audit storage.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: AuditLogEntry);

    /// Matching entries, newest first.
    fn query(&self, query: &AuditQuery) -> Vec<AuditLogEntry>;

    /// Every retained entry in chronological order.
    fn export(&self) -> Vec<AuditLogEntry>;
}

/// In-memory ring buffer sink retaining the most recent entries.
pub struct MemoryAuditSink {
    entries: RwLock<VecDeque<AuditLogEntry>>,
    capacity: usize,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::with_capacity(MAX_AUDIT_LOG_ENTRIES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, entry: AuditLogEntry) {
        // Recover from poisoning: a panicked writer must not stop the trail.
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    fn query(&self, query: &AuditQuery) -> Vec<AuditLogEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let matches = entries.iter().rev().filter(|entry| {
            query.operation.map_or(true, |op| entry.operation == op)
                && query.game_id.map_or(true, |id| entry.game_id == Some(id))
                && query.week_id.map_or(true, |id| entry.week_id == Some(id))
                && query.from.map_or(true, |from| entry.created_at >= from)
                && query.to.map_or(true, |to| entry.created_at <= to)
        });

        match query.limit {
            Some(limit) => matches.take(limit).cloned().collect(),
            None => matches.cloned().collect(),
        }
    }

    fn export(&self) -> Vec<AuditLogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

/// Runs calculations and reports each call to the sink.
///
/// Validation failures are reported but never swallowed: the result goes
/// back to the caller either way, and the caller decides what to persist.
#[derive(Clone)]
pub struct AuditReporter {
    sink: Arc<dyn AuditSink>,
}

impl AuditReporter {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn AuditSink> {
        &self.sink
    }

    /// Run a validating calculation and report its outcome.
    pub fn record_validated<F>(
        &self,
        operation: AuditOperation,
        game_id: Option<Uuid>,
        week_id: Option<Uuid>,
        operator: Option<String>,
        calculation: F,
    ) -> CalculationResult
    where
        F: FnOnce() -> CalculationResult,
    {
        let start = Instant::now();
        let result = calculation();
        let duration_ms = start.elapsed().as_millis() as u64;

        let error = if result.errors.is_empty() {
            None
        } else {
            Some(result.errors.join("; "))
        };

        self.sink.append(AuditLogEntry {
            id: Uuid::new_v4(),
            operation,
            game_id,
            week_id,
            operator,
            success: result.is_valid,
            error,
            duration_ms,
            details: serde_json::to_value(&result).unwrap_or(serde_json::Value::Null),
            created_at: Utc::now(),
        });

        result
    }

    /// Run a calculation with no validation step and report its value.
    pub fn record<T, F>(
        &self,
        operation: AuditOperation,
        game_id: Option<Uuid>,
        week_id: Option<Uuid>,
        operator: Option<String>,
        calculation: F,
    ) -> T
    where
        T: Serialize,
        F: FnOnce() -> T,
    {
        let start = Instant::now();
        let value = calculation();
        let duration_ms = start.elapsed().as_millis() as u64;

        self.sink.append(AuditLogEntry {
            id: Uuid::new_v4(),
            operation,
            game_id,
            week_id,
            operator,
            success: true,
            error: None,
            duration_ms,
            details: serde_json::to_value(&value).unwrap_or(serde_json::Value::Null),
            created_at: Utc::now(),
        });

        value
    }

    /// Start a span for an operation whose data loading can fail before any
    /// calculation runs. The failure path still produces an audit entry.
    pub fn begin(
        &self,
        operation: AuditOperation,
        game_id: Option<Uuid>,
        week_id: Option<Uuid>,
        operator: Option<String>,
    ) -> AuditSpan {
        AuditSpan {
            sink: Arc::clone(&self.sink),
            operation,
            game_id,
            week_id,
            operator,
            start: Instant::now(),
        }
    }
}

/// In-flight audit record; finish with [`complete`](Self::complete) or
/// [`fail`](Self::fail).
pub struct AuditSpan {
    sink: Arc<dyn AuditSink>,
    operation: AuditOperation,
    game_id: Option<Uuid>,
    week_id: Option<Uuid>,
    operator: Option<String>,
    start: Instant,
}

impl AuditSpan {
    pub fn complete(self, details: serde_json::Value) {
        self.finish(true, None, details);
    }

    pub fn fail(self, error: &str) {
        self.finish(false, Some(error.to_string()), serde_json::Value::Null);
    }

    fn finish(self, success: bool, error: Option<String>, details: serde_json::Value) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        self.sink.append(AuditLogEntry {
            id: Uuid::new_v4(),
            operation: self.operation,
            game_id: self.game_id,
            week_id: self.week_id,
            operator: self.operator,
            success,
            error,
            duration_ms,
            details,
            created_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::validate_ticket_sale_split;
    use rust_decimal::Decimal;

    fn entry(operation: AuditOperation, game_id: Option<Uuid>) -> AuditLogEntry {
        AuditLogEntry {
            id: Uuid::new_v4(),
            operation,
            game_id,
            week_id: None,
            operator: None,
            success: true,
            error: None,
            duration_ms: 0,
            details: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_sink_retains_most_recent_entries_only() {
        let sink = MemoryAuditSink::with_capacity(3);
        for _ in 0..5 {
            sink.append(entry(AuditOperation::TicketSaleSplit, None));
        }

        assert_eq!(sink.export().len(), 3);
    }

    #[test]
    fn test_default_capacity_matches_retention_policy() {
        let sink = MemoryAuditSink::new();
        assert_eq!(sink.capacity, MAX_AUDIT_LOG_ENTRIES);
    }

    #[test]
    fn test_query_filters_by_operation_and_game() {
        let sink = MemoryAuditSink::new();
        let game_id = Uuid::new_v4();

        sink.append(entry(AuditOperation::TicketSaleSplit, Some(game_id)));
        sink.append(entry(AuditOperation::WeekEndingJackpot, Some(game_id)));
        sink.append(entry(AuditOperation::TicketSaleSplit, Some(Uuid::new_v4())));

        let by_operation = sink.query(&AuditQuery {
            operation: Some(AuditOperation::TicketSaleSplit),
            ..Default::default()
        });
        assert_eq!(by_operation.len(), 2);

        let by_game = sink.query(&AuditQuery {
            game_id: Some(game_id),
            ..Default::default()
        });
        assert_eq!(by_game.len(), 2);

        let both = sink.query(&AuditQuery {
            operation: Some(AuditOperation::WeekEndingJackpot),
            game_id: Some(game_id),
            ..Default::default()
        });
        assert_eq!(both.len(), 1);
    }

    #[test]
    fn test_query_returns_newest_first_with_limit() {
        let sink = MemoryAuditSink::new();
        let first = entry(AuditOperation::TicketSaleSplit, None);
        let second = entry(AuditOperation::TicketSaleSplit, None);
        let second_id = second.id;

        sink.append(first);
        sink.append(second);

        let limited = sink.query(&AuditQuery {
            limit: Some(1),
            ..Default::default()
        });
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, second_id);
    }

    #[test]
    fn test_reporter_logs_valid_calculation() {
        let sink = Arc::new(MemoryAuditSink::new());
        let reporter = AuditReporter::new(sink.clone());
        let game_id = Uuid::new_v4();

        let result = reporter.record_validated(
            AuditOperation::TicketSaleSplit,
            Some(game_id),
            None,
            Some("treasurer".to_string()),
            || validate_ticket_sale_split(10, Decimal::from(2), Decimal::from(60), Decimal::from(40)),
        );
        assert!(result.is_valid);

        let entries = sink.export();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].success);
        assert!(entries[0].error.is_none());
        assert_eq!(entries[0].operator.as_deref(), Some("treasurer"));
        assert_eq!(entries[0].game_id, Some(game_id));
    }

    #[test]
    fn test_reporter_logs_failure_but_returns_result() {
        let sink = Arc::new(MemoryAuditSink::new());
        let reporter = AuditReporter::new(sink.clone());

        let result = reporter.record_validated(
            AuditOperation::TicketSaleSplit,
            None,
            None,
            None,
            || validate_ticket_sale_split(10, Decimal::from(2), Decimal::from(40), Decimal::from(55)),
        );

        // Validation failed, yet the caller still holds the full result.
        assert!(!result.is_valid);
        assert!(!result.errors.is_empty());

        let entries = sink.export();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
        assert!(entries[0]
            .error
            .as_deref()
            .unwrap()
            .contains("percentages must sum to 100"));
    }

    #[test]
    fn test_span_failure_path_still_logs() {
        let sink = Arc::new(MemoryAuditSink::new());
        let reporter = AuditReporter::new(sink.clone());
        let game_id = Uuid::new_v4();

        let span = reporter.begin(
            AuditOperation::GameCompletion,
            Some(game_id),
            None,
            Some("treasurer".to_string()),
        );
        span.fail("Game not found");

        let entries = sink.export();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
        assert_eq!(entries[0].error.as_deref(), Some("Game not found"));
        assert_eq!(entries[0].operation, AuditOperation::GameCompletion);
    }

    #[test]
    fn test_record_stores_calculated_value_as_details() {
        let sink = Arc::new(MemoryAuditSink::new());
        let reporter = AuditReporter::new(sink.clone());

        let value = reporter.record(
            AuditOperation::DisplayedJackpot,
            None,
            None,
            None,
            || Decimal::from(650),
        );
        assert_eq!(value, Decimal::from(650));

        let entries = sink.export();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].success);
        assert_eq!(entries[0].details, serde_json::json!(650.0));
    }

    #[test]
    fn test_time_range_filter() {
        let sink = MemoryAuditSink::new();
        let mut old = entry(AuditOperation::TicketSaleSplit, None);
        old.created_at = Utc::now() - chrono::Duration::hours(2);
        let recent = entry(AuditOperation::TicketSaleSplit, None);

        sink.append(old);
        sink.append(recent);

        let last_hour = sink.query(&AuditQuery {
            from: Some(Utc::now() - chrono::Duration::hours(1)),
            ..Default::default()
        });
        assert_eq!(last_hour.len(), 1);
    }
}
