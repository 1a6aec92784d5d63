/// One output row: the derived metrics for a single qualifying pull
/// request. Built once from the list record plus the detail record, then
/// never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricRow {
    pub repo: String,
    /// The pull request author's login
    pub engineer: String,
    /// Unique within its repository
    pub pr_number: u64,
    /// Creation date, ISO `YYYY-MM-DD`
    pub created_at: String,
    /// "open" or "closed", as reported by the API
    pub pr_state: String,
    /// Whole days from creation to merge, close, or now (if still open)
    pub pr_lifetime_days: i64,
    pub commits: u64,
    pub comments: u64,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
}
