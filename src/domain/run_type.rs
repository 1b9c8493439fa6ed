//! Compliance run labels.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which scheduled (or manual) invocation produced a compliance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunType {
    WedWarn,
    ThuWarn,
    SunAmWarn,
    SunPmOfficial,
    AdminRerun,
}

impl RunType {
    pub const ALL: [RunType; 5] = [
        RunType::WedWarn,
        RunType::ThuWarn,
        RunType::SunAmWarn,
        RunType::SunPmOfficial,
        RunType::AdminRerun,
    ];

    /// Official runs enforce the boomerang rule; every other run is advisory.
    pub fn is_official(&self) -> bool {
        matches!(self, RunType::SunPmOfficial)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::WedWarn => "wed_warn",
            RunType::ThuWarn => "thu_warn",
            RunType::SunAmWarn => "sun_am_warn",
            RunType::SunPmOfficial => "sun_pm_official",
            RunType::AdminRerun => "admin_rerun",
        }
    }
}

impl FromStr for RunType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        RunType::ALL
            .into_iter()
            .find(|rt| rt.as_str() == s)
            .ok_or(())
    }
}

impl std::fmt::Display for RunType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_type_labels_round_trip_through_from_str() {
        for rt in RunType::ALL {
            assert_eq!(RunType::from_str(rt.as_str()), Ok(rt));
        }
        assert!(RunType::from_str("friday").is_err());
    }

    #[test]
    fn test_only_sunday_evening_is_official() {
        let official: Vec<_> = RunType::ALL.into_iter().filter(|r| r.is_official()).collect();
        assert_eq!(official, vec![RunType::SunPmOfficial]);
    }

    #[test]
    fn test_serde_label_matches_as_str() {
        let json = serde_json::to_string(&RunType::SunAmWarn).unwrap();
        assert_eq!(json, "\"sun_am_warn\"");
    }
}
