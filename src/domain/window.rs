use chrono::{DateTime, Utc};

/// Half-open time range `[start, end)` a digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_is_half_open() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let window = Window::new(start, end);

        assert!(window.contains(start));
        assert!(window.contains(end - chrono::TimeDelta::seconds(1)));
        assert!(!window.contains(end));
        assert!(!window.contains(start - chrono::TimeDelta::seconds(1)));
    }
}
