//! Domain primitives: TimeMs, RosterId, PlayerId, Season, SeasonWeek.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }
}

/// Sleeper roster slot identifier (1-based, stable across league renewals).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RosterId(pub u32);

impl RosterId {
    pub fn new(id: u32) -> Self {
        RosterId(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RosterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sleeper player identifier. Team defenses use their abbreviation (e.g. "KC").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NFL season year.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Season(pub i32);

impl Season {
    pub fn new(year: i32) -> Self {
        Season(year)
    }

    pub fn year(&self) -> i32 {
        self.0
    }

    pub fn next(&self) -> Season {
        Season(self.0 + 1)
    }

    /// Parse a season year, accepting only plausible four-digit years.
    pub fn parse(s: &str) -> Option<Season> {
        let year = s.trim().parse::<i32>().ok()?;
        (1990..=2100).contains(&year).then_some(Season(year))
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scoring week within its season. Orders season first, then week.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SeasonWeek {
    pub season: Season,
    /// 0 is the offseason before week 1.
    pub week: u32,
}

impl SeasonWeek {
    pub fn new(season: Season, week: u32) -> Self {
        Self { season, week }
    }

    /// The offseason that opens `season`.
    pub fn start_of(season: Season) -> Self {
        Self { season, week: 0 }
    }
}
