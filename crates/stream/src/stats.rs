use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Per-tick evaluation statistics for instrumentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamStats {
    pub players_evaluated: usize,
    pub candidates_considered: usize,
    pub streamed_in: usize,
    pub streamed_out: usize,
    pub area_transitions: usize,
    pub capacity_failures: usize,
    pub tick_time: Duration,
}

impl StreamStats {
    pub(crate) fn absorb(&mut self, other: &StreamStats) {
        self.players_evaluated += other.players_evaluated;
        self.candidates_considered += other.candidates_considered;
        self.streamed_in += other.streamed_in;
        self.streamed_out += other.streamed_out;
        self.area_transitions += other.area_transitions;
        self.capacity_failures += other.capacity_failures;
    }
}

/// Cost of one evaluation tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickSample {
    pub duration: Duration,
    pub players: usize,
}

/// Rolling window of recent tick costs.
#[derive(Debug)]
pub struct TickTimer {
    samples: VecDeque<TickSample>,
    window: usize,
}

impl TickTimer {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn record(&mut self, stats: &StreamStats) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(TickSample {
            duration: stats.tick_time,
            players: stats.players_evaluated,
        });
    }

    pub fn latest(&self) -> Option<TickSample> {
        self.samples.back().copied()
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        self.total() / self.samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples
            .iter()
            .map(|s| s.duration)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Mean time spent per evaluated participant across the window.
    pub fn per_player(&self) -> Duration {
        let players: usize = self.samples.iter().map(|s| s.players).sum();
        match u32::try_from(players) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(players) => self.total() / players,
        }
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    fn total(&self) -> Duration {
        self.samples.iter().map(|s| s.duration).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(ms: u64, players: usize) -> StreamStats {
        StreamStats {
            players_evaluated: players,
            tick_time: Duration::from_millis(ms),
            ..StreamStats::default()
        }
    }

    #[test]
    fn timer_tracks_recent_ticks() {
        let mut timer = TickTimer::new(3);
        timer.record(&tick(10, 1));
        timer.record(&tick(20, 1));
        timer.record(&tick(30, 2));
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert_eq!(
            timer.latest(),
            Some(TickSample {
                duration: Duration::from_millis(30),
                players: 2,
            })
        );
    }

    #[test]
    fn timer_forgets_ticks_outside_the_window() {
        let mut timer = TickTimer::new(2);
        for ms in [90, 20, 30] {
            timer.record(&tick(ms, 1));
        }
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
        assert_eq!(timer.max(), Duration::from_millis(30));
    }

    #[test]
    fn per_player_cost_divides_by_participants() {
        let mut timer = TickTimer::new(4);
        timer.record(&tick(40, 4));
        timer.record(&tick(20, 0));
        assert_eq!(timer.per_player(), Duration::from_millis(15));
    }

    #[test]
    fn empty_timer_reports_zero() {
        let timer = TickTimer::new(4);
        assert_eq!(timer.average(), Duration::ZERO);
        assert_eq!(timer.max(), Duration::ZERO);
        assert_eq!(timer.per_player(), Duration::ZERO);
        assert!(timer.latest().is_none());
    }

    #[test]
    fn idle_ticks_cost_nothing_per_player() {
        let mut timer = TickTimer::new(4);
        timer.record(&tick(5, 0));
        assert_eq!(timer.per_player(), Duration::ZERO);
        assert_eq!(timer.average(), Duration::from_millis(5));
    }

    #[test]
    fn stats_absorb_sums_counters() {
        let mut total = StreamStats::default();
        let one = StreamStats {
            players_evaluated: 1,
            streamed_in: 3,
            ..StreamStats::default()
        };
        total.absorb(&one);
        total.absorb(&one);
        assert_eq!(total.players_evaluated, 2);
        assert_eq!(total.streamed_in, 6);
    }
}
