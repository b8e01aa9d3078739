use std::time::Duration;

use crate::temple::RoomId;

/// The runner's side of the game. Only [`GameEngine`](super::GameEngine)
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub pendants: u32,
    pub path: Vec<RoomId>,
    pub time_limit: Duration,
    pub time_remaining: Duration,
    pub has_artifact: bool,
    pub guards_encountered: u32,
}

impl PlayerState {
    pub fn new(pendants: u32, time_limit: Duration) -> Self {
        PlayerState {
            pendants,
            path: Vec::new(),
            time_limit,
            time_remaining: time_limit,
            has_artifact: false,
            guards_encountered: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.time_limit.saturating_sub(self.time_remaining)
    }
}

/// Countdown announcements, each made at most once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWarning {
    OneMinute,
    ThirtySeconds,
}

impl TimeWarning {
    pub fn threshold(self) -> Duration {
        match self {
            TimeWarning::OneMinute => Duration::from_secs(60),
            TimeWarning::ThirtySeconds => Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WarningFlags {
    pub one_minute: bool,
    pub thirty_seconds: bool,
}

impl WarningFlags {
    /// Returns the warning to announce for `remaining`, if any.
    ///
    /// Dropping straight past both thresholds only announces thirty seconds
    /// and retires the one-minute warning with it.
    pub fn check(&mut self, remaining: Duration) -> Option<TimeWarning> {
        if remaining <= TimeWarning::ThirtySeconds.threshold() {
            if self.thirty_seconds {
                return None;
            }
            self.thirty_seconds = true;
            self.one_minute = true;
            return Some(TimeWarning::ThirtySeconds);
        }
        if remaining <= TimeWarning::OneMinute.threshold() && !self.one_minute {
            self.one_minute = true;
            return Some(TimeWarning::OneMinute);
        }
        None
    }
}
