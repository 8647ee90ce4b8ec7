//! Opt-in per-stage wall-clock timing (`--timing` / `CDINDEX_TIMING`).
//!
//! Stages run on the calling thread, so samples live in a thread-local buffer
//! and are drained by [`collect_report`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Aggregated timing for every stage recorded since the last collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingReport {
    /// Stages in first-recorded order.
    pub stages: Vec<StageTiming>,
}

/// Accumulated time spent in one named stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: String,
    pub elapsed: Duration,
    /// Number of times the stage ran.
    pub count: usize,
}

#[derive(Debug, Clone)]
struct Sample {
    name: String,
    elapsed: Duration,
}

thread_local! {
    static SAMPLES: RefCell<Vec<Sample>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// Returns true when `CDINDEX_TIMING` enables timing collection.
///
/// Supported truthy values: `1`, `true`, `yes`, `on` (case-insensitive).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("CDINDEX_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

/// Enable or disable timing collection.
pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Clears all recorded samples for the current thread.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Run `f` as stage `name`, recording its duration when timing is enabled.
pub fn timed<R>(name: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }

    let started = Instant::now();
    let result = f();
    let elapsed = started.elapsed();
    SAMPLES.with(|samples| {
        samples.borrow_mut().push(Sample {
            name: name.to_string(),
            elapsed,
        });
    });
    result
}

/// Drain this thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));

    let mut order: Vec<String> = Vec::new();
    let mut totals: BTreeMap<String, (Duration, usize)> = BTreeMap::new();
    for sample in samples {
        let entry = totals.entry(sample.name.clone()).or_insert_with(|| {
            order.push(sample.name.clone());
            (Duration::ZERO, 0)
        });
        entry.0 += sample.elapsed;
        entry.1 += 1;
    }

    let stages = order
        .into_iter()
        .filter_map(|name| {
            totals.remove(&name).map(|(elapsed, count)| StageTiming {
                name,
                elapsed,
                count,
            })
        })
        .collect();

    TimingReport { stages }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Sum of all stage durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.stages.iter().map(|s| s.elapsed).sum()
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|stage| {
                json!({
                    "name": stage.name,
                    "count": stage.count,
                    "elapsed_us": stage.elapsed.as_micros(),
                })
            })
            .collect::<Vec<_>>();

        json!({ "stages": stages, "total_us": self.total().as_micros() })
    }

    /// Render as a fixed-width table for terminal output.
    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }

        let total = self.total();
        let mut out = String::new();
        out.push_str("stage                count    elapsed   share\n");
        out.push_str("---------------------------------------------\n");
        for stage in &self.stages {
            let _ = writeln!(
                out,
                "{:<20} {:>5} {:>10} {:>6.1}%",
                stage.name,
                stage.count,
                format_duration(stage.elapsed),
                share(stage.elapsed, total)
            );
        }
        let _ = writeln!(out, "{:<20} {:>5} {:>10}", "total", "", format_duration(total));
        out
    }
}

#[allow(clippy::cast_precision_loss)]
fn share(part: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    part.as_secs_f64() / total.as_secs_f64() * 100.0
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();

    if micros >= 1_000_000 {
        let secs = micros / 1_000_000;
        let millis = (micros % 1_000_000) / 1_000;
        format!("{secs}.{millis:03}s")
    } else if micros >= 1_000 {
        let millis = micros / 1_000;
        let rem = micros % 1_000;
        format!("{millis}.{rem:03}ms")
    } else {
        format!("{micros}us")
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
