use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cumulative time and call count of one profiled section.
#[derive(Clone, Copy, Debug, Default)]
pub struct SectionTiming {
    pub total: Duration,
    pub calls: u64,
}

impl SectionTiming {
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / self.calls as u32
        }
    }
}

/// Simple scoped profiler recording cumulative time per section.
#[derive(Default)]
pub struct Profiler {
    pub timings: HashMap<&'static str, SectionTiming>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        let entry = self.timings.entry(name).or_default();
        entry.total += elapsed;
        entry.calls += 1;
    }

    /// Sections sorted by total time, slowest first.
    pub fn report_sorted(&self) -> Vec<(&'static str, SectionTiming)> {
        let mut v: Vec<_> = self.timings.iter().map(|(n, t)| (*n, *t)).collect();
        v.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        v
    }

    pub fn clear(&mut self) {
        self.timings.clear();
    }

    pub fn log_and_clear(&mut self) {
        for (name, timing) in self.report_sorted() {
            log::info!(
                "{:<24} total {:>10.3?}  calls {:>6}  mean {:>10.3?}",
                name,
                timing.total,
                timing.calls,
                timing.mean()
            );
        }
        self.clear();
    }
}

pub struct ProfilerGuard {
    name: &'static str,
    start: Instant,
}

impl ProfilerGuard {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Start a profiling section. Returns a guard that will update the global
/// profiler when dropped.
pub fn start(name: &'static str) -> ProfilerGuard {
    ProfilerGuard { name, start: Instant::now() }
}

#[cfg(feature = "profiling")]
impl Drop for ProfilerGuard {
    fn drop(&mut self) {
        crate::PROFILER.lock().record(self.name, self.start.elapsed());
    }
}

/// Macro helper to profile a scope only when the `profiling` feature is enabled.
#[macro_export]
macro_rules! profile_scope {
    ($name:expr) => {
        #[cfg(feature = "profiling")]
        let _guard = $crate::profiler::start($name);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_sort_by_total_time() {
        let mut profiler = Profiler::new();
        profiler.record("fast", Duration::from_millis(1));
        profiler.record("slow", Duration::from_millis(5));
        profiler.record("fast", Duration::from_millis(1));
        let report = profiler.report_sorted();
        assert_eq!(report[0].0, "slow");
        assert_eq!(report[1].1.calls, 2);
        assert_eq!(report[1].1.mean(), Duration::from_millis(1));
        profiler.clear();
        assert!(profiler.report_sorted().is_empty());
    }

    #[test]
    fn guard_measures_elapsed_time() {
        let guard = start("section");
        assert_eq!(guard.name(), "section");
        assert!(guard.elapsed() <= Duration::from_secs(60));
    }

    #[cfg(feature = "profiling")]
    #[test]
    fn global_profiler_accumulates_sections() {
        let mut profiler = crate::PROFILER.lock();
        profiler.record("global_profiler_test", Duration::from_millis(2));
        let timing = profiler.timings["global_profiler_test"];
        assert!(timing.calls >= 1);
        assert!(timing.total >= Duration::from_millis(2));
    }
}
