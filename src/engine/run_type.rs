//! Wall-clock classification of compliance runs.

use crate::domain::RunType;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};

/// League time zone: a standard UTC offset, optionally with US daylight-saving rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleZone {
    standard: FixedOffset,
    daylight: FixedOffset,
    observe_us_dst: bool,
}

impl ScheduleZone {
    /// Returns `None` if the offset is outside what a time zone can have.
    pub fn new(standard_offset_minutes: i32, observe_us_dst: bool) -> Option<Self> {
        let standard = FixedOffset::east_opt(standard_offset_minutes.checked_mul(60)?)?;
        let daylight = FixedOffset::east_opt((standard_offset_minutes + 60).checked_mul(60)?)?;
        Some(Self {
            standard,
            daylight,
            observe_us_dst,
        })
    }

    /// US Eastern (UTC-5, daylight UTC-4).
    pub fn us_eastern() -> Self {
        Self::new(-300, true).expect("UTC-5 is a valid offset")
    }

    /// The offset in effect at `at`.
    ///
    /// Daylight time runs from 02:00 local standard time on the second Sunday
    /// of March to 02:00 local daylight time on the first Sunday of November.
    pub fn offset_at(&self, at: DateTime<Utc>) -> FixedOffset {
        if !self.observe_us_dst {
            return self.standard;
        }
        let year = at.year();
        let start = transition_utc(year, 3, 2, self.standard);
        let end = transition_utc(year, 11, 1, self.daylight);
        match (start, end) {
            (Some(start), Some(end)) if at >= start && at < end => self.daylight,
            _ => self.standard,
        }
    }

    pub fn to_local(&self, at: DateTime<Utc>) -> DateTime<FixedOffset> {
        at.with_timezone(&self.offset_at(at))
    }
}

/// UTC instant of 02:00 local (in `offset`) on the `nth` Sunday of `month`.
fn transition_utc(year: i32, month: u32, nth: u8, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_weekday_of_month_opt(year, month, Weekday::Sun, nth)?;
    let local = date.and_time(NaiveTime::from_hms_opt(2, 0, 0)?);
    offset
        .from_local_datetime(&local)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// A scheduled invocation: weekday and local time that produce `run_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSlot {
    pub weekday: Weekday,
    pub time: NaiveTime,
    pub run_type: RunType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSchedule {
    pub zone: ScheduleZone,
    /// Allowed distance from a slot, absorbing scheduler jitter.
    pub tolerance: Duration,
    pub slots: Vec<RunSlot>,
}

impl RunSchedule {
    /// Wed/Thu noon warnings, Sunday 11:00 warning, Sunday 20:00 official run.
    pub fn league_default(zone: ScheduleZone, tolerance: Duration) -> Self {
        let slot = |weekday, hour, run_type| RunSlot {
            weekday,
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN),
            run_type,
        };
        Self {
            zone,
            tolerance,
            slots: vec![
                slot(Weekday::Wed, 12, RunType::WedWarn),
                slot(Weekday::Thu, 12, RunType::ThuWarn),
                slot(Weekday::Sun, 11, RunType::SunAmWarn),
                slot(Weekday::Sun, 20, RunType::SunPmOfficial),
            ],
        }
    }

    /// Label for a run happening at `at`; anything off-schedule is a manual rerun.
    pub fn classify(&self, at: DateTime<Utc>) -> RunType {
        let local = self.zone.to_local(at);
        let naive = local.naive_local();

        self.slots
            .iter()
            .filter(|slot| slot.weekday == local.weekday())
            .map(|slot| {
                let scheduled = local.date_naive().and_time(slot.time);
                ((naive - scheduled).num_seconds().abs(), slot.run_type)
            })
            .filter(|(distance, _)| *distance <= self.tolerance.num_seconds())
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, run_type)| run_type)
            .unwrap_or(RunType::AdminRerun)
    }
}
