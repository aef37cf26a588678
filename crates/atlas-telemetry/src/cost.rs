//! AI cost aggregation: hourly-bucketed counters keyed by `(modelId,
//! hourStart)` (§9 Design Notes). Retains only token counts and
//! micro-dollar totals; never raw prompt or completion text.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Timelike, Utc};

/// Truncates `timestamp` down to the start of its hour, the bucket key.
fn hour_start(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(timestamp)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostBucketTotals {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub micro_dollars: u64,
    pub call_count: u64,
}

/// An in-memory hourly cost ledger. Flushed (read and optionally cleared)
/// on bucket rollover or explicit shutdown by the caller; this type does
/// not schedule its own flush.
#[derive(Default)]
pub struct AiCostLedger {
    buckets: Mutex<HashMap<(String, DateTime<Utc>), CostBucketTotals>>,
}

impl AiCostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one AI call's token usage and estimated cost against the
    /// bucket for `timestamp`'s hour.
    pub fn record(
        &self,
        model_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        prompt_tokens: u64,
        completion_tokens: u64,
        micro_dollars: u64,
    ) {
        let key = (model_id.into(), hour_start(timestamp));
        let mut guard = self.buckets.lock().unwrap();
        let entry = guard.entry(key).or_default();
        entry.prompt_tokens += prompt_tokens;
        entry.completion_tokens += completion_tokens;
        entry.micro_dollars += micro_dollars;
        entry.call_count += 1;
    }

    /// Returns the current totals for `model_id`'s bucket at `timestamp`'s
    /// hour, without clearing it.
    pub fn totals_for(
        &self,
        model_id: &str,
        timestamp: DateTime<Utc>,
    ) -> CostBucketTotals {
        let key = (model_id.to_string(), hour_start(timestamp));
        self.buckets
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// Drains every bucket older than `now - retain_recent`, returning
    /// them for a `AI.Cost.WindowSummary` emission. Buckets within the
    /// retention window are left in place.
    pub fn drain_rolled_over(
        &self,
        now: DateTime<Utc>,
        retain_recent: Duration,
    ) -> Vec<(String, DateTime<Utc>, CostBucketTotals)> {
        let cutoff = now - retain_recent;
        let mut guard = self.buckets.lock().unwrap();
        let to_drain: Vec<(String, DateTime<Utc>)> = guard
            .keys()
            .filter(|(_, bucket_start)| *bucket_start < cutoff)
            .cloned()
            .collect();
        to_drain
            .into_iter()
            .filter_map(|key| guard.remove(&key).map(|totals| (key.0, key.1, totals)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_accumulate_within_the_same_hour() {
        let ledger = AiCostLedger::new();
        let ts = Utc::now();
        ledger.record("gpt-x", ts, 100, 50, 10);
        ledger.record("gpt-x", ts + Duration::minutes(5), 200, 75, 20);
        let totals = ledger.totals_for("gpt-x", ts);
        assert_eq!(totals.prompt_tokens, 300);
        assert_eq!(totals.completion_tokens, 125);
        assert_eq!(totals.micro_dollars, 30);
        assert_eq!(totals.call_count, 2);
    }

    #[test]
    fn distinct_models_are_independent_buckets() {
        let ledger = AiCostLedger::new();
        let ts = Utc::now();
        ledger.record("gpt-x", ts, 100, 0, 0);
        ledger.record("gpt-y", ts, 50, 0, 0);
        assert_eq!(ledger.totals_for("gpt-x", ts).prompt_tokens, 100);
        assert_eq!(ledger.totals_for("gpt-y", ts).prompt_tokens, 50);
    }

    #[test]
    fn drain_rolled_over_only_removes_buckets_past_retention() {
        let ledger = AiCostLedger::new();
        let old = Utc::now() - Duration::hours(3);
        let recent = Utc::now();
        ledger.record("gpt-x", old, 10, 0, 0);
        ledger.record("gpt-x", recent, 20, 0, 0);

        let drained = ledger.drain_rolled_over(Utc::now(), Duration::hours(1));
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].2.prompt_tokens, 10);
        // The recent bucket survives.
        assert_eq!(ledger.totals_for("gpt-x", recent).prompt_tokens, 20);
    }
}
