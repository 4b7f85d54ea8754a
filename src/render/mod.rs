//! The render budget: repaint immediately for small frames, coalesce and
//! throttle for large ones.
//!
//! The scheduler owns the decision, not the timer. Hosts call
//! [`RenderScheduler::request`] after every mutation; when the answer is
//! [`RenderOutcome::Deferred`] they arrange a wakeup and call
//! [`RenderScheduler::run_due`] at the deadline. Painting goes through the
//! [`CanvasPainter`] seam so the policy stays testable without a UI.

use std::time::{Duration, Instant};

/// Floor between two throttled paints of a large image (~20 fps).
pub const MIN_PAINT_INTERVAL: Duration = Duration::from_millis(48);

/// Host-side paint sink: blits the active document to the screen.
pub trait CanvasPainter {
    fn paint(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The frame was painted synchronously.
    Painted,
    /// The request was recorded; call `run_due` after this delay.
    Deferred(Duration),
    /// A paint is already scheduled; this request folded into it.
    Coalesced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledPaint {
    /// The deferred paint ran.
    Painted,
    /// The interval floor has not elapsed yet; call again after this delay.
    NotDue(Duration),
    /// Nothing was pending anymore; no paint happened.
    Stale,
}

#[derive(Debug)]
pub struct RenderScheduler {
    pending: bool,
    scheduled: bool,
    last_paint: Option<Instant>,
    min_interval: Duration,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::with_interval(MIN_PAINT_INTERVAL)
    }

    pub fn with_interval(min_interval: Duration) -> Self {
        Self {
            pending: false,
            scheduled: false,
            last_paint: None,
            min_interval,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Asks for a repaint. Forced requests and small images paint now and
    /// supersede anything scheduled. Large images paint now only when the
    /// interval floor has already elapsed (the first paint after idle);
    /// otherwise the request coalesces into a single deferred paint.
    pub fn request(
        &mut self,
        painter: &mut impl CanvasPainter,
        now: Instant,
        large_image: bool,
        force: bool,
    ) -> RenderOutcome {
        if force || !large_image {
            self.pending = false;
            self.scheduled = false;
            self.paint_now(painter, now);
            return RenderOutcome::Painted;
        }
        self.pending = true;
        if self.scheduled {
            return RenderOutcome::Coalesced;
        }
        let wait = self.remaining_interval(now);
        if wait.is_zero() {
            self.pending = false;
            self.paint_now(painter, now);
            RenderOutcome::Painted
        } else {
            self.scheduled = true;
            tracing::trace!(?wait, "render deferred under budget");
            RenderOutcome::Deferred(wait)
        }
    }

    /// Runs a previously deferred paint. Wakeups that arrive before the
    /// interval floor report the remaining wait and stay scheduled; wakeups
    /// with nothing left to show are skipped.
    pub fn run_due(&mut self, painter: &mut impl CanvasPainter, now: Instant) -> ScheduledPaint {
        if !self.scheduled || !self.pending {
            self.scheduled = false;
            return ScheduledPaint::Stale;
        }
        let wait = self.remaining_interval(now);
        if !wait.is_zero() {
            return ScheduledPaint::NotDue(wait);
        }
        self.scheduled = false;
        self.pending = false;
        self.paint_now(painter, now);
        ScheduledPaint::Painted
    }

    fn paint_now(&mut self, painter: &mut impl CanvasPainter, now: Instant) {
        painter.paint();
        self.last_paint = Some(now);
    }

    fn remaining_interval(&self, now: Instant) -> Duration {
        match self.last_paint {
            None => Duration::ZERO,
            Some(last) => self
                .min_interval
                .saturating_sub(now.saturating_duration_since(last)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingPainter {
        paints: usize,
    }

    impl CanvasPainter for CountingPainter {
        fn paint(&mut self) {
            self.paints += 1;
        }
    }

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn small_images_always_paint_synchronously() {
        let mut scheduler = RenderScheduler::new();
        let mut painter = CountingPainter::default();
        let base = Instant::now();
        for i in 0..5 {
            let outcome = scheduler.request(&mut painter, at(base, i), false, false);
            assert_eq!(outcome, RenderOutcome::Painted);
        }
        assert_eq!(painter.paints, 5);
    }

    #[test]
    fn first_large_paint_after_idle_is_immediate_then_throttled() {
        let mut scheduler = RenderScheduler::new();
        let mut painter = CountingPainter::default();
        let base = Instant::now();

        assert_eq!(
            scheduler.request(&mut painter, base, true, false),
            RenderOutcome::Painted
        );
        let outcome = scheduler.request(&mut painter, at(base, 10), true, false);
        assert_eq!(outcome, RenderOutcome::Deferred(Duration::from_millis(38)));
        assert_eq!(painter.paints, 1);

        assert_eq!(
            scheduler.run_due(&mut painter, at(base, 48)),
            ScheduledPaint::Painted
        );
        assert_eq!(painter.paints, 2);
    }

    #[test]
    fn requests_while_scheduled_coalesce_into_one_paint() {
        let mut scheduler = RenderScheduler::new();
        let mut painter = CountingPainter::default();
        let base = Instant::now();

        scheduler.request(&mut painter, base, true, false);
        scheduler.request(&mut painter, at(base, 5), true, false);
        assert_eq!(
            scheduler.request(&mut painter, at(base, 9), true, false),
            RenderOutcome::Coalesced
        );
        assert_eq!(
            scheduler.request(&mut painter, at(base, 20), true, false),
            RenderOutcome::Coalesced
        );

        assert_eq!(
            scheduler.run_due(&mut painter, at(base, 48)),
            ScheduledPaint::Painted
        );
        // One immediate paint plus one coalesced throttled paint.
        assert_eq!(painter.paints, 2);
        // Nothing left once the coalesced paint lands.
        assert_eq!(
            scheduler.run_due(&mut painter, at(base, 96)),
            ScheduledPaint::Stale
        );
    }

    #[test]
    fn early_wakeups_report_the_remaining_wait() {
        let mut scheduler = RenderScheduler::new();
        let mut painter = CountingPainter::default();
        let base = Instant::now();

        scheduler.request(&mut painter, base, true, false);
        scheduler.request(&mut painter, at(base, 8), true, false);
        assert_eq!(
            scheduler.run_due(&mut painter, at(base, 30)),
            ScheduledPaint::NotDue(Duration::from_millis(18))
        );
        assert!(scheduler.is_scheduled());
        assert_eq!(
            scheduler.run_due(&mut painter, at(base, 50)),
            ScheduledPaint::Painted
        );
    }

    #[test]
    fn forced_request_supersedes_a_scheduled_paint() {
        let mut scheduler = RenderScheduler::new();
        let mut painter = CountingPainter::default();
        let base = Instant::now();

        scheduler.request(&mut painter, base, true, false);
        scheduler.request(&mut painter, at(base, 5), true, false);
        assert!(scheduler.is_scheduled());

        assert_eq!(
            scheduler.request(&mut painter, at(base, 6), true, true),
            RenderOutcome::Painted
        );
        assert!(!scheduler.has_pending());
        // The stale wakeup from the superseded schedule does nothing.
        assert_eq!(
            scheduler.run_due(&mut painter, at(base, 48)),
            ScheduledPaint::Stale
        );
        assert_eq!(painter.paints, 2);
    }

    #[test]
    fn throttled_paints_never_land_closer_than_the_interval() {
        let mut scheduler = RenderScheduler::new();
        let mut painter = CountingPainter::default();
        let base = Instant::now();
        let mut paint_times = Vec::new();

        // A burst of requests every 7 ms for ~200 ms, driving wakeups as
        // soon as the scheduler asks for them.
        let mut wake_at: Option<u64> = None;
        for ms in (0..200).step_by(7) {
            if let Some(due) = wake_at {
                if ms >= due {
                    if scheduler.run_due(&mut painter, at(base, due)) == ScheduledPaint::Painted {
                        paint_times.push(due);
                    }
                    wake_at = None;
                }
            }
            match scheduler.request(&mut painter, at(base, ms), true, false) {
                RenderOutcome::Painted => paint_times.push(ms),
                RenderOutcome::Deferred(wait) => {
                    wake_at = Some(ms + wait.as_millis() as u64);
                }
                RenderOutcome::Coalesced => {}
            }
        }

        assert!(paint_times.len() >= 3);
        for pair in paint_times.windows(2) {
            assert!(
                pair[1] - pair[0] >= 48,
                "paints at {} and {} violate the floor",
                pair[0],
                pair[1]
            );
        }
    }
}
