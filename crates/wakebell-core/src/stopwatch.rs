//! Stopwatch with lap tracking.
//!
//! Wall-clock based, no internal thread: the caller invokes `tick()` at
//! roughly 10 ms intervals for a live display. The whole engine is
//! serializable so a host can park it in the kv store between processes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchState {
    Stopped,
    Running,
}

/// A recorded lap. `total` is the elapsed time when the lap was taken;
/// `diff` is the time since the previous lap (or since zero for the
/// first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lap {
    pub id: u64,
    pub total_ms: u64,
    pub diff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stopwatch {
    state: StopwatchState,
    /// Elapsed milliseconds as of the last flush.
    elapsed_ms: u64,
    /// Epoch ms of the effective start (`now - elapsed` at start time).
    /// Only meaningful while running.
    #[serde(default)]
    started_epoch_ms: Option<u64>,
    /// Laps, most recent first.
    laps: Vec<Lap>,
    next_lap_id: u64,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            state: StopwatchState::Stopped,
            elapsed_ms: 0,
            started_epoch_ms: None,
            laps: Vec::new(),
            next_lap_id: 1,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> StopwatchState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == StopwatchState::Running
    }

    pub fn laps(&self) -> &[Lap] {
        &self.laps
    }

    /// Elapsed time at `now_ms` without mutating the engine.
    pub fn elapsed_at(&self, now_ms: u64) -> u64 {
        match (self.state, self.started_epoch_ms) {
            (StopwatchState::Running, Some(start)) => now_ms.saturating_sub(start),
            _ => self.elapsed_ms,
        }
    }

    /// Best and worst lap ids by diff. Needs at least two laps; ties go
    /// to the first-encountered lap in stored (most-recent-first) order.
    pub fn best_worst(&self) -> Option<(u64, u64)> {
        if self.laps.len() < 2 {
            return None;
        }
        let mut best = &self.laps[0];
        let mut worst = &self.laps[0];
        for lap in &self.laps {
            if lap.diff_ms < best.diff_ms {
                best = lap;
            }
            if lap.diff_ms > worst.diff_ms {
                worst = lap;
            }
        }
        Some((best.id, worst.id))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or continue) counting from the accumulated elapsed time.
    /// No-op while already running.
    pub fn start(&mut self, now_ms: u64) {
        if self.is_running() {
            return;
        }
        self.state = StopwatchState::Running;
        self.started_epoch_ms = Some(now_ms.saturating_sub(self.elapsed_ms));
    }

    /// Freeze the display. No-op while stopped.
    pub fn stop(&mut self, now_ms: u64) {
        if !self.is_running() {
            return;
        }
        self.flush(now_ms);
        self.state = StopwatchState::Stopped;
        self.started_epoch_ms = None;
    }

    /// Stop, zero the elapsed time and clear all laps.
    pub fn reset(&mut self) {
        self.state = StopwatchState::Stopped;
        self.elapsed_ms = 0;
        self.started_epoch_ms = None;
        self.laps.clear();
        self.next_lap_id = 1;
    }

    /// Record a lap at the current elapsed time. Ignored while stopped.
    pub fn lap(&mut self, now_ms: u64) -> Option<Lap> {
        if !self.is_running() {
            return None;
        }
        self.flush(now_ms);
        let previous_total = self.laps.first().map(|l| l.total_ms).unwrap_or(0);
        let lap = Lap {
            id: self.next_lap_id,
            total_ms: self.elapsed_ms,
            diff_ms: self.elapsed_ms.saturating_sub(previous_total),
        };
        self.next_lap_id += 1;
        self.laps.insert(0, lap);
        Some(lap)
    }

    /// Periodic display refresh. Call at ~10 ms cadence while running.
    pub fn tick(&mut self, now_ms: u64) -> u64 {
        if self.is_running() {
            self.flush(now_ms);
        }
        self.elapsed_ms
    }

    fn flush(&mut self, now_ms: u64) {
        if let Some(start) = self.started_epoch_ms {
            self.elapsed_ms = now_ms.saturating_sub(start);
        }
    }
}

/// `MM:SS.CC` display, centisecond precision. Minutes are unbounded,
/// not wrapped at 60.
pub fn format_elapsed(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    let centis = (ms % 1000) / 10;
    format!("{minutes:02}:{seconds:02}.{centis:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_stop_preserves_elapsed() {
        let mut sw = Stopwatch::new();
        sw.start(1_000);
        assert_eq!(sw.tick(3_500), 2_500);
        sw.stop(4_000);
        assert_eq!(sw.elapsed_at(10_000), 3_000);

        // Restart continues from the frozen elapsed, not from zero.
        sw.start(20_000);
        assert_eq!(sw.tick(21_000), 4_000);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let mut sw = Stopwatch::new();
        sw.start(0);
        sw.start(5_000);
        assert_eq!(sw.tick(6_000), 6_000);
    }

    #[test]
    fn stop_while_stopped_is_a_no_op() {
        let mut sw = Stopwatch::new();
        sw.stop(1_000);
        assert_eq!(sw.elapsed_at(1_000), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut sw = Stopwatch::new();
        sw.start(0);
        sw.lap(10_000);
        sw.reset();
        assert!(!sw.is_running());
        assert_eq!(sw.elapsed_at(99_999), 0);
        assert!(sw.laps().is_empty());
    }

    #[test]
    fn laps_are_prepended_with_diffs() {
        let mut sw = Stopwatch::new();
        sw.start(0);
        sw.lap(10_000); // diff 10s
        sw.lap(15_000); // diff 5s
        sw.lap(35_000); // diff 20s

        let laps = sw.laps();
        assert_eq!(laps.len(), 3);
        // Most recent first: [20s, 5s, 10s].
        assert_eq!(laps[0].diff_ms, 20_000);
        assert_eq!(laps[1].diff_ms, 5_000);
        assert_eq!(laps[2].diff_ms, 10_000);
        assert_eq!(laps[0].total_ms, 35_000);
    }

    #[test]
    fn lap_while_stopped_is_ignored() {
        let mut sw = Stopwatch::new();
        assert_eq!(sw.lap(1_000), None);
        assert!(sw.laps().is_empty());
    }

    #[test]
    fn best_and_worst_laps() {
        let mut sw = Stopwatch::new();
        sw.start(0);
        assert_eq!(sw.best_worst(), None);
        let first = sw.lap(10_000).unwrap();
        assert_eq!(sw.best_worst(), None); // one lap is not enough

        let second = sw.lap(15_000).unwrap(); // diff 5s -> best
        let third = sw.lap(35_000).unwrap(); // diff 20s -> worst
        let (best, worst) = sw.best_worst().unwrap();
        assert_eq!(best, second.id);
        assert_eq!(worst, third.id);
        assert_ne!(best, first.id);
    }

    #[test]
    fn ties_go_to_the_first_encountered() {
        let mut sw = Stopwatch::new();
        sw.start(0);
        sw.lap(5_000); // diff 5s
        sw.lap(10_000); // diff 5s
        // Stored order is most-recent first, so the second lap is seen
        // first and wins both seeds under strict comparison.
        let (best, worst) = sw.best_worst().unwrap();
        assert_eq!(best, worst);
        assert_eq!(best, sw.laps()[0].id);
    }

    #[test]
    fn display_format_is_centisecond() {
        assert_eq!(format_elapsed(0), "00:00.00");
        assert_eq!(format_elapsed(12_345), "00:12.34");
        assert_eq!(format_elapsed(61_239), "01:01.23");
        // Minutes do not wrap at 60.
        assert_eq!(format_elapsed(3_600_000 + 90_000), "61:30.00");
    }

    #[test]
    fn engine_survives_serialization() {
        let mut sw = Stopwatch::new();
        sw.start(0);
        sw.lap(10_000);
        sw.stop(12_000);

        let json = serde_json::to_string(&sw).unwrap();
        let back: Stopwatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.elapsed_at(99_000), 12_000);
        assert_eq!(back.laps().len(), 1);
    }
}
