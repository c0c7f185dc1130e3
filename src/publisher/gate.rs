use chrono::{DateTime, Utc};

use crate::config::PublishInterval;
use crate::domain::Window;
use crate::publisher::index::{ArtifactIndex, ArtifactRecord};

/// Outcome of [`PublicationGate::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub window: Window,
    /// Artifact to hand back instead of producing a new one.
    pub existing: Option<ArtifactRecord>,
}

impl Decision {
    #[must_use]
    pub fn reuse(&self) -> bool {
        self.existing.is_some()
    }
}

/// Decides whether the newest artifact still covers the requested instant.
///
/// An artifact is reused when its timestamp lies strictly after the start
/// of the window ending at `now`. One sitting exactly on the boundary is
/// one full interval old and a new digest is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationGate {
    interval: PublishInterval,
}

impl PublicationGate {
    #[must_use]
    pub fn new(interval: PublishInterval) -> Self {
        Self { interval }
    }

    #[must_use]
    pub fn interval(&self) -> PublishInterval {
        self.interval
    }

    #[must_use]
    pub fn decide(&self, now: DateTime<Utc>, index: &ArtifactIndex) -> Decision {
        let start = now
            .checked_sub_signed(self.interval.as_time_delta())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let window = Window::new(start, now);

        let existing = index
            .latest()
            .filter(|latest| latest.timestamp > window.start)
            .cloned();

        Decision { window, existing }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::StoredEntry;
    use chrono::{TimeDelta, TimeZone};
    use rstest::rstest;
    use std::path::Path;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    }

    fn index_with(timestamps: &[DateTime<Utc>]) -> ArtifactIndex {
        ArtifactIndex::from_entries(
            Path::new("out"),
            timestamps.iter().map(|ts| StoredEntry {
                name: format!("{}.json", ts.timestamp()),
                modified: None,
            }),
        )
    }

    fn daily() -> PublicationGate {
        PublicationGate::new(PublishInterval::default())
    }

    #[test]
    fn empty_index_produces_full_window() {
        let now = t0();
        let decision = daily().decide(now, &ArtifactIndex::default());

        assert!(!decision.reuse());
        assert_eq!(decision.window.end, now);
        assert_eq!(decision.window.start, now - TimeDelta::hours(24));
    }

    #[rstest]
    #[case(23, true)]
    #[case(1, true)]
    #[case(0, true)]
    #[case(24, false)]
    #[case(25, false)]
    fn reuses_only_artifacts_newer_than_window_start(
        #[case] hours_since_artifact: i64,
        #[case] expect_reuse: bool,
    ) {
        let index = index_with(&[t0()]);
        let now = t0() + TimeDelta::hours(hours_since_artifact);

        let decision = daily().decide(now, &index);

        assert_eq!(decision.reuse(), expect_reuse);
    }

    #[test]
    fn reuse_returns_the_newest_artifact() {
        let older = t0() - TimeDelta::hours(2);
        let index = index_with(&[older, t0()]);

        let decision = daily().decide(t0() + TimeDelta::hours(1), &index);

        let existing = decision.existing.unwrap();
        assert_eq!(existing.timestamp, t0());
        assert_eq!(
            existing.path,
            Path::new("out").join(format!("{}.json", t0().timestamp()))
        );
    }

    #[test]
    fn end_to_end_daily_boundary() {
        let index = index_with(&[t0()]);

        let early = daily().decide(t0() + TimeDelta::hours(23), &index);
        assert!(early.reuse());

        let late = daily().decide(t0() + TimeDelta::hours(25), &index);
        assert!(!late.reuse());
        assert_eq!(
            late.window,
            Window::new(t0() + TimeDelta::hours(1), t0() + TimeDelta::hours(25))
        );
    }

    #[test]
    fn repeated_decisions_are_identical() {
        let index = index_with(&[t0()]);
        let gate = daily();
        let now = t0() + TimeDelta::hours(30);

        assert_eq!(gate.decide(now, &index), gate.decide(now, &index));
    }

    #[test]
    fn custom_interval_sizes_the_window() {
        let gate = PublicationGate::new(PublishInterval::from_days(7).unwrap());
        let index = index_with(&[t0()]);

        let decision = gate.decide(t0() + TimeDelta::days(6), &index);
        assert!(decision.reuse());

        let decision = gate.decide(t0() + TimeDelta::days(8), &index);
        assert!(!decision.reuse());
        assert_eq!(decision.window.start, t0() + TimeDelta::days(1));
    }
}
