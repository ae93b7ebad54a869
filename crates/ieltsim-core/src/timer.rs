//! Section countdown.
//!
//! An explicit countdown state machine: the driver calls `tick` once per
//! second and forwards `Expired` to the session as a forced submission.
//! Expiry fires exactly once, so a driver that keeps ticking after the
//! session moved on cannot re-trigger it.

/// Per-section time limit in seconds.
pub const SECTION_DURATION_SECS: u64 = 3600;

/// Discrete countdown events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// One second elapsed; time remains.
    Tick { remaining_secs: u64 },
    /// The countdown reached zero. Emitted at most once.
    Expired,
}

/// One-shot countdown for a test section.
#[derive(Debug, Clone)]
pub struct Countdown {
    remaining_secs: u64,
    fired: bool,
}

impl Countdown {
    pub fn new(duration_secs: u64) -> Self {
        Countdown {
            remaining_secs: duration_secs,
            fired: false,
        }
    }

    /// A countdown over the standard section duration.
    pub fn section() -> Self {
        Countdown::new(SECTION_DURATION_SECS)
    }

    /// Advance by one second. Returns `None` once expiry has fired.
    pub fn tick(&mut self) -> Option<CountdownEvent> {
        if self.fired {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.fired = true;
            Some(CountdownEvent::Expired)
        } else {
            Some(CountdownEvent::Tick {
                remaining_secs: self.remaining_secs,
            })
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn is_expired(&self) -> bool {
        self.fired
    }

    /// `MM:SS` clock string for display.
    pub fn format_clock(&self) -> String {
        let minutes = self.remaining_secs / 60;
        let seconds = self.remaining_secs % 60;
        format!("{minutes:02}:{seconds:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_expires_once() {
        let mut countdown = Countdown::new(3);
        assert_eq!(
            countdown.tick(),
            Some(CountdownEvent::Tick { remaining_secs: 2 })
        );
        assert_eq!(
            countdown.tick(),
            Some(CountdownEvent::Tick { remaining_secs: 1 })
        );
        assert_eq!(countdown.tick(), Some(CountdownEvent::Expired));
        assert!(countdown.is_expired());
        // Further ticks never re-fire.
        assert_eq!(countdown.tick(), None);
        assert_eq!(countdown.tick(), None);
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let mut countdown = Countdown::new(0);
        assert_eq!(countdown.tick(), Some(CountdownEvent::Expired));
        assert_eq!(countdown.tick(), None);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(Countdown::new(3600).format_clock(), "60:00");
        assert_eq!(Countdown::new(299).format_clock(), "04:59");
        assert_eq!(Countdown::new(0).format_clock(), "00:00");
    }

    #[test]
    fn section_uses_standard_duration() {
        assert_eq!(Countdown::section().remaining_secs(), SECTION_DURATION_SECS);
    }
}
