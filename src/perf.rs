// ==========================================
// IPO Validation - Stage Timing
// ==========================================
// PerfGuard logs elapsed time, row count and SQL statement count for one
// pipeline stage. SQL counting uses rusqlite trace/profile hooks.
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub const PERF_SQL_ENV: &str = "IPO_VALIDATION_PERF_SQL";
pub const SLOW_SQL_MS_ENV: &str = "IPO_VALIDATION_SLOW_SQL_MS";

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = const { Cell::new(0) };
    static SQL_COUNT: Cell<u64> = const { Cell::new(0) };
    static SLOW_SQL_COUNT: Cell<u64> = const { Cell::new(0) };
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn truncate_sql(sql: &str, max_len: usize) -> String {
    let s = sql.trim().replace('\n', " ");
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

/// Install statement trace/profile hooks on a source or metadata connection.
///
/// - on by default in debug builds, off in release
/// - `IPO_VALIDATION_PERF_SQL=1` forces it on
/// - `IPO_VALIDATION_SLOW_SQL_MS=50` sets the slow query threshold
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = match std::env::var(PERF_SQL_ENV) {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    };

    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var(SLOW_SQL_MS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.trace(Some(sql_trace_callback));
    conn.profile(Some(sql_profile_callback));
}

fn sql_trace_callback(_sql: &str) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
}

fn sql_profile_callback(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold > 0 && ms >= threshold {
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %truncate_sql(sql, 420),
            "slow sql"
        );
        if PERF_DEPTH.with(|d| d.get() > 0) {
            SLOW_SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
        }
    }
}

/// Stage timing guard: logs on drop.
///
/// ```ignore
/// let mut perf = ipo_validation::perf::PerfGuard::new("extract_part_usage");
/// let rows = source.fetch_part_usage(start, end)?;
/// perf.set_rows(rows.len());
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    rows: Option<usize>,
    sql_start: u64,
    slow_sql_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            rows: None,
            sql_start: SQL_COUNT.with(|c| c.get()),
            slow_sql_start: SLOW_SQL_COUNT.with(|c| c.get()),
        }
    }

    /// Rows produced by the stage
    pub fn set_rows(&mut self, rows: usize) {
        self.rows = Some(rows);
    }

    /// Statements traced on this thread since the guard was created
    pub fn sql_count(&self) -> u64 {
        SQL_COUNT.with(|c| c.get()).saturating_sub(self.sql_start)
    }

    pub fn slow_sql_count(&self) -> u64 {
        SLOW_SQL_COUNT
            .with(|c| c.get())
            .saturating_sub(self.slow_sql_start)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let sql_count = self.sql_count();
        let slow_sql_count = self.slow_sql_count();

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms,
            rows = self.rows,
            sql_count,
            slow_sql_count,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1\nFROM t", 100), "SELECT 1 FROM t");
        assert_eq!(truncate_sql("SELECT * FROM PartUsage", 6), "SELECT…");
    }

    #[test]
    fn test_guard_depth_restored() {
        {
            let mut guard = PerfGuard::new("test_stage");
            guard.set_rows(3);
            assert!(PERF_DEPTH.with(|d| d.get()) >= 1);
        }
        assert_eq!(PERF_DEPTH.with(|d| d.get()), 0);
    }

    #[test]
    fn test_sql_tracing_counts_statements_inside_guard() {
        std::env::set_var(PERF_SQL_ENV, "1");
        std::env::set_var(SLOW_SQL_MS_ENV, "1000");

        let mut conn = Connection::open_in_memory().unwrap();
        install_sqlite_tracing(&mut conn);
        assert!(PERF_SQL_ENABLED.load(Ordering::Relaxed));

        // nothing is counted outside a guard
        let before = SQL_COUNT.with(|c| c.get());
        conn.execute_batch("CREATE TABLE part_usage (qty REAL)").unwrap();
        assert_eq!(SQL_COUNT.with(|c| c.get()), before);

        let guard = PerfGuard::new("insert_usage");
        for qty in [1.0, 2.5, 4.0] {
            conn.execute("INSERT INTO part_usage (qty) VALUES (?1)", [qty])
                .unwrap();
        }
        assert_eq!(guard.sql_count(), 3);
        assert_eq!(guard.slow_sql_count(), 0);

        // any configured threshold is below ten seconds
        sql_profile_callback("SELECT qty FROM part_usage", Duration::from_secs(10));
        assert_eq!(guard.slow_sql_count(), 1);
    }
}
