// Schedule calculation module
//
// Computes the next UTC instant at which the daily task should fire:
// the configured wall-clock time of day, interpreted in the configured
// time zone, today if that slot is still ahead or tomorrow otherwise.

use crate::config::ScheduleConfig;
use crate::errors::ScheduleError;
use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A validated daily schedule: a resolved time zone plus a target time of day.
///
/// Building one from a `ScheduleConfig` is where the zone identifier and the
/// wall-clock components are checked; an unknown identifier is a fatal
/// configuration error, never silently replaced with UTC.
#[derive(Debug, Clone)]
pub struct DailySchedule {
    timezone: Tz,
    target: NaiveTime,
}

impl DailySchedule {
    /// Resolve and validate a schedule from configuration
    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ScheduleError> {
        let timezone: Tz = config
            .time_zone_id
            .parse()
            .map_err(|_| ScheduleError::InvalidTimezone(config.time_zone_id.clone()))?;

        let target =
            NaiveTime::from_hms_opt(config.hour, config.minute, 0).ok_or_else(|| {
                ScheduleError::InvalidTime {
                    hour: config.hour,
                    minute: config.minute,
                }
            })?;

        Ok(Self { timezone, target })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn target(&self) -> NaiveTime {
        self.target
    }

    /// Calculate the next fire instant strictly after `now`.
    ///
    /// The target wall-clock time is rebuilt on the current calendar date in
    /// the schedule's zone; if that slot has already passed (equality counts
    /// as passed, so an exact hit fires tomorrow, never immediately) the
    /// date advances by one calendar day. The result is converted back to
    /// UTC with the offset valid on the *target* date, which is what absorbs
    /// DST transitions between now and the target.
    pub fn next_fire(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let now_local = now.with_timezone(&self.timezone).naive_local();

        let mut target_local = now_local.date().and_time(self.target);
        if now_local >= target_local {
            target_local = Self::next_day(target_local, self.target)?;
        }

        let mut target_utc = self.resolve_local(target_local)?.with_timezone(&Utc);

        // A fall-back transition replays an hour of wall-clock time; when
        // `now` sits in the replayed hour the earlier-offset reading of the
        // target can already be in the past. Roll one more day in that case.
        if target_utc <= now {
            target_local = Self::next_day(target_local, self.target)?;
            target_utc = self.resolve_local(target_local)?.with_timezone(&Utc);
        }

        Ok(target_utc)
    }

    fn next_day(current: NaiveDateTime, target: NaiveTime) -> Result<NaiveDateTime, ScheduleError> {
        current
            .date()
            .succ_opt()
            .map(|date| date.and_time(target))
            .ok_or_else(|| {
                ScheduleError::CalculationFailed(
                    "date out of range advancing to the next day".to_string(),
                )
            })
    }

    /// Reinterpret a naive local timestamp in the schedule's zone.
    ///
    /// Tie-breaks: a wall-clock time skipped by a spring-forward transition
    /// is advanced minute-by-minute to the first time that exists; an
    /// ambiguous wall-clock time (fall back) takes the earlier offset.
    fn resolve_local(&self, local: NaiveDateTime) -> Result<DateTime<Tz>, ScheduleError> {
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(dt) => Ok(dt),
            LocalResult::Ambiguous(earliest, _latest) => Ok(earliest),
            LocalResult::None => {
                let mut probe = local;
                // Bounded well past the largest known transition gap
                for _ in 0..(36 * 60) {
                    probe += Duration::minutes(1);
                    match self.timezone.from_local_datetime(&probe) {
                        LocalResult::Single(dt) => return Ok(dt),
                        LocalResult::Ambiguous(earliest, _latest) => return Ok(earliest),
                        LocalResult::None => continue,
                    }
                }
                Err(ScheduleError::CalculationFailed(format!(
                    "no representable instant near {} in {}",
                    local, self.timezone
                )))
            }
        }
    }
}
