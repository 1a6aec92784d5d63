use chrono::{DateTime, Utc};

/// The closed set of ways a pull request can end.
///
/// Classification happens once, up front; merge takes priority over close
/// because a merged PR also carries a `closed_at` timestamp but must never
/// count as closed-unmerged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrOutcome {
    Merged(DateTime<Utc>),
    ClosedUnmerged(DateTime<Utc>),
    Open,
}

impl PrOutcome {
    pub fn classify(merged_at: Option<DateTime<Utc>>, closed_at: Option<DateTime<Utc>>) -> Self {
        match (merged_at, closed_at) {
            (Some(at), _) => PrOutcome::Merged(at),
            (None, Some(at)) => PrOutcome::ClosedUnmerged(at),
            (None, None) => PrOutcome::Open,
        }
    }
}

/// Whole days between creation and the terminal event, fractional days
/// truncated toward zero.
///
/// Open pull requests measure against `now`, so their lifetime grows across
/// runs — intentional, not a bug. `now` is an explicit parameter so one run
/// uses a single consistent instant and tests can pin it.
pub fn lifetime_days(created_at: DateTime<Utc>, outcome: PrOutcome, now: DateTime<Utc>) -> i64 {
    let end = match outcome {
        PrOutcome::Merged(at) => at,
        PrOutcome::ClosedUnmerged(at) => at,
        PrOutcome::Open => now,
    };
    (end - created_at).num_days().max(0)
}
