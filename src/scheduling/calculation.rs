use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::alarm::{AlarmConfig, DaysOfWeek, WakeTime};

/// One full week plus the first day; any non-empty weekday set matches within it.
const MAX_DAY_INCREMENTS: u32 = 8;

/// The two instants derived from a config for its next occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmPlan {
    pub alarm_at: NaiveDateTime,
    pub sunrise_start: NaiveDateTime,
    pub duration_minutes: u32,
}

/// Next instant strictly after `reference` whose weekday is in `days_of_week`
/// and whose time of day is exactly `wake_time`.
///
/// A candidate equal to `reference` counts as already passed.
pub fn calculate_next_alarm(
    wake_time: &WakeTime,
    days_of_week: &DaysOfWeek,
    reference: NaiveDateTime,
) -> NaiveDateTime {
    let mut candidate = reference.date().and_time(*wake_time.time());

    let today_is_valid = days_of_week.contains_date(&candidate);
    let time_has_passed = candidate <= reference;

    if time_has_passed || !today_is_valid {
        let mut increments = 0;
        loop {
            candidate = next_day(candidate);
            increments += 1;

            if days_of_week.contains_date(&candidate) {
                break;
            }
            if increments >= MAX_DAY_INCREMENTS {
                log::error!(
                    "No matching weekday found within a week, giving up. \
                     [days_of_week = {:?}, reference = {}]",
                    days_of_week,
                    reference
                );
                break;
            }
        }
    }

    candidate
}

/// Same as [`calculate_next_alarm`] with the host's local wall clock as reference.
pub fn next_alarm_from_now(wake_time: &WakeTime, days_of_week: &DaysOfWeek) -> NaiveDateTime {
    calculate_next_alarm(wake_time, days_of_week, Local::now().naive_local())
}

/// Start of the sunrise ramp, `duration_minutes` before `alarm_at`.
pub fn calculate_sunrise_start(alarm_at: NaiveDateTime, duration_minutes: u32) -> NaiveDateTime {
    alarm_at
        .checked_sub_signed(TimeDelta::minutes(i64::from(duration_minutes)))
        .expect("Not realistic to overflow")
}

/// `None` when the alarm is switched off.
pub fn plan_alarm(config: &AlarmConfig, reference: NaiveDateTime) -> Option<AlarmPlan> {
    if !config.enabled {
        return None;
    }

    let alarm_at = calculate_next_alarm(&config.wake_time, &config.days_of_week, reference);
    let sunrise_start = calculate_sunrise_start(alarm_at, config.duration);

    Some(AlarmPlan {
        alarm_at,
        sunrise_start,
        duration_minutes: config.duration,
    })
}

/// How long a timer has to wait from `now` to reach `target`. Zero if already due.
pub fn delay_until(target: NaiveDateTime, now: NaiveDateTime) -> std::time::Duration {
    (target - now).to_std().unwrap_or_default()
}

fn next_day(candidate: NaiveDateTime) -> NaiveDateTime {
    candidate
        .checked_add_days(chrono::Days::new(1))
        .expect("Not realistic to overflow")
}

#[cfg(test)]
mod tests;
