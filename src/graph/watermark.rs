//! Ingestion watermarks
//!
//! The widest `(after, before]` range successfully ingested so far.

use serde::{Deserialize, Serialize};

/// A half-open time window `(after_secs, before_secs]`, in unix seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub after_secs: i64,
    pub before_secs: i64,
}

impl Window {
    pub fn new(after_secs: i64, before_secs: i64) -> Self {
        Window {
            after_secs,
            before_secs,
        }
    }

    pub fn span_secs(&self) -> i64 {
        self.before_secs.saturating_sub(self.after_secs)
    }

    pub fn is_empty(&self) -> bool {
        self.before_secs <= self.after_secs
    }
}

/// Outer bounds of everything ingested. Both are `None` until the first commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermarks {
    pub earliest_after_secs: Option<i64>,
    pub latest_before_secs: Option<i64>,
}

impl Watermarks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.earliest_after_secs.is_none() && self.latest_before_secs.is_none()
    }

    /// Window for catching up with new data: from the latest bound to `now`,
    /// or the `initial_interval_secs` before `now` when nothing is ingested yet.
    pub fn latest_window(&self, now_secs: i64, initial_interval_secs: i64) -> Window {
        match self.latest_before_secs {
            Some(latest) => Window::new(latest, now_secs.max(latest)),
            None => Window::new(now_secs.saturating_sub(initial_interval_secs), now_secs),
        }
    }

    /// Window reaching `interval_secs` further back than the earliest bound,
    /// or the `interval_secs` before `now` when nothing is ingested yet.
    pub fn earlier_window(&self, now_secs: i64, interval_secs: i64) -> Window {
        match self.earliest_after_secs {
            Some(earliest) => Window::new(earliest.saturating_sub(interval_secs), earliest),
            None => Window::new(now_secs.saturating_sub(interval_secs), now_secs),
        }
    }

    /// Widen the bounds to cover `window`. Bounds only ever move outward.
    pub fn commit(&mut self, window: Window) {
        self.earliest_after_secs = Some(
            self.earliest_after_secs
                .map_or(window.after_secs, |e| e.min(window.after_secs)),
        );
        self.latest_before_secs = Some(
            self.latest_before_secs
                .map_or(window.before_secs, |l| l.max(window.before_secs)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_latest_window_uses_initial_interval() {
        let marks = Watermarks::new();
        assert_eq!(marks.latest_window(10_000, 3600), Window::new(6400, 10_000));
    }

    #[test]
    fn test_latest_window_starts_at_latest_bound() {
        let mut marks = Watermarks::new();
        marks.commit(Window::new(100, 200));
        assert_eq!(marks.latest_window(500, 3600), Window::new(200, 500));
    }

    #[test]
    fn test_latest_window_never_goes_backwards() {
        let mut marks = Watermarks::new();
        marks.commit(Window::new(100, 900));
        let window = marks.latest_window(500, 3600);
        assert!(window.is_empty());
    }

    #[test]
    fn test_huge_intervals_saturate() {
        let mut marks = Watermarks::new();
        assert_eq!(marks.earlier_window(5000, i64::MAX), Window::new(5000 - i64::MAX, 5000));
        assert_eq!(marks.latest_window(-10, i64::MAX).after_secs, i64::MIN);

        marks.commit(Window::new(-10, 10));
        let window = marks.earlier_window(5000, i64::MAX);
        assert_eq!(window, Window::new(i64::MIN, -10));
        assert_eq!(window.span_secs(), i64::MAX);
    }

    #[test]
    fn test_earlier_window_extends_back_from_earliest() {
        let mut marks = Watermarks::new();
        marks.commit(Window::new(1000, 2000));
        assert_eq!(marks.earlier_window(5000, 300), Window::new(700, 1000));
    }

    #[test]
    fn test_commit_only_widens() {
        let mut marks = Watermarks::new();
        marks.commit(Window::new(100, 200));
        marks.commit(Window::new(150, 180));
        assert_eq!(marks.earliest_after_secs, Some(100));
        assert_eq!(marks.latest_before_secs, Some(200));

        marks.commit(Window::new(50, 300));
        assert_eq!(marks.earliest_after_secs, Some(50));
        assert_eq!(marks.latest_before_secs, Some(300));
    }
}
