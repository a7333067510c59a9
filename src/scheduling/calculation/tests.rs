use super::*;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use proptest::prelude::*;
use proptest_arbitrary_interop::arb;

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

fn wake(s: &str) -> WakeTime {
    s.parse().unwrap()
}

#[test]
pub fn when_wake_time_is_yet_to_come_alarm_should_be_today() {
    // 2024-10-07 is a Monday
    let now = at(2024, 10, 7, 6, 0);

    let next = calculate_next_alarm(&wake("07:00"), &DaysOfWeek::weekdays(), now);

    assert_eq!(next, at(2024, 10, 7, 7, 0));
}

#[test]
pub fn when_wake_time_has_passed_alarm_should_be_next_valid_day() {
    let now = at(2024, 10, 7, 8, 0);

    let next = calculate_next_alarm(&wake("07:00"), &DaysOfWeek::weekdays(), now);

    assert_eq!(next, at(2024, 10, 8, 7, 0));
    assert_eq!(next.weekday(), Weekday::Tue);
}

#[test]
pub fn weekend_should_be_skipped_for_weekday_alarm() {
    let saturday = at(2024, 10, 5, 6, 0);

    let next = calculate_next_alarm(&wake("07:00"), &DaysOfWeek::weekdays(), saturday);

    assert_eq!(next, at(2024, 10, 7, 7, 0));
    assert_eq!(next.weekday(), Weekday::Mon);
}

#[test]
pub fn friday_evening_should_roll_to_monday() {
    let friday = at(2024, 10, 11, 21, 0);

    let next = calculate_next_alarm(&wake("07:00"), &DaysOfWeek::weekdays(), friday);

    assert_eq!(next, at(2024, 10, 14, 7, 0));
}

#[test]
pub fn exact_match_with_reference_counts_as_passed() {
    let now = at(2024, 10, 7, 7, 0);

    let next = calculate_next_alarm(&wake("07:00"), &DaysOfWeek::weekdays(), now);

    assert_eq!(next, at(2024, 10, 8, 7, 0));
}

#[test]
pub fn sub_minute_reference_before_wake_time_stays_today() {
    let now = NaiveDate::from_ymd_opt(2024, 10, 7)
        .unwrap()
        .and_hms_milli_opt(6, 59, 59, 999)
        .unwrap();

    let next = calculate_next_alarm(&wake("07:00"), &DaysOfWeek::weekdays(), now);

    assert_eq!(next, at(2024, 10, 7, 7, 0));
}

#[test]
pub fn single_day_alarm_on_same_weekday_after_wake_time_waits_a_full_week() {
    let monday = at(2024, 10, 7, 7, 1);
    let only_monday = DaysOfWeek::new([1]).unwrap();

    let next = calculate_next_alarm(&wake("07:00"), &only_monday, monday);

    assert_eq!(next, at(2024, 10, 14, 7, 0));
}

#[test]
pub fn midnight_alarm_late_in_the_evening_is_tomorrow() {
    let now = at(2024, 10, 7, 23, 0);

    let next = calculate_next_alarm(&wake("0:00"), &DaysOfWeek::every_day(), now);

    assert_eq!(next, at(2024, 10, 8, 0, 0));
}

#[test]
pub fn day_search_rolls_over_month_and_year() {
    // 2024-12-31 is a Tuesday, next Sunday is 2025-01-05
    let new_years_eve = at(2024, 12, 31, 12, 0);
    let only_sunday = DaysOfWeek::new([0]).unwrap();

    let next = calculate_next_alarm(&wake("9:30"), &only_sunday, new_years_eve);

    assert_eq!(next, at(2025, 1, 5, 9, 30));
}

#[test]
pub fn day_search_handles_leap_day() {
    // 2024-02-28 is a Wednesday
    let now = at(2024, 2, 28, 10, 0);
    let only_thursday = DaysOfWeek::new([4]).unwrap();

    let next = calculate_next_alarm(&wake("06:00"), &only_thursday, now);

    assert_eq!(next, at(2024, 2, 29, 6, 0));
}

#[test]
pub fn sunrise_start_is_duration_before_alarm() {
    let alarm = at(2024, 10, 7, 7, 0);

    assert_eq!(calculate_sunrise_start(alarm, 30), at(2024, 10, 7, 6, 30));
    assert_eq!(calculate_sunrise_start(alarm, 1), at(2024, 10, 7, 6, 59));
    assert_eq!(calculate_sunrise_start(alarm, 60), at(2024, 10, 7, 6, 0));
    assert_eq!(
        calculate_sunrise_start(at(2024, 10, 7, 8, 10), 15),
        at(2024, 10, 7, 7, 55)
    );
}

#[test]
pub fn sunrise_start_crosses_midnight_backwards() {
    let alarm = at(2024, 10, 7, 0, 15);

    assert_eq!(calculate_sunrise_start(alarm, 30), at(2024, 10, 6, 23, 45));
}

#[test]
pub fn sunrise_start_crosses_year_backwards() {
    let alarm = at(2025, 1, 1, 0, 10);

    assert_eq!(calculate_sunrise_start(alarm, 45), at(2024, 12, 31, 23, 25));
}

#[test]
pub fn sunrise_start_works_at_earliest_representable_day() {
    let alarm = NaiveDate::MIN.and_hms_opt(1, 0, 0).unwrap();

    assert_eq!(
        calculate_sunrise_start(alarm, 60),
        NaiveDate::MIN.and_hms_opt(0, 0, 0).unwrap()
    );
}

#[test]
pub fn next_alarm_from_now_uses_local_wall_clock() {
    let wake_time = wake("07:00");
    let days = DaysOfWeek::weekdays();
    let before = Local::now().naive_local();

    let next = next_alarm_from_now(&wake_time, &days);

    assert!(next > before, "Alarm should be after {before}, got {next}");
    assert_eq!(next.time(), *wake_time.time());
    assert!(days.contains(next.weekday()));
    assert!((next - before).num_days() <= 7);
}

#[test]
pub fn disabled_config_has_no_plan() {
    let config = AlarmConfig::default();

    assert_eq!(plan_alarm(&config, at(2024, 10, 7, 6, 0)), None);
}

#[test]
pub fn enabled_config_plans_alarm_and_sunrise() {
    let config = AlarmConfig {
        enabled: true,
        ..AlarmConfig::default()
    };

    let plan = plan_alarm(&config, at(2024, 10, 7, 6, 0)).unwrap();

    assert_eq!(plan.alarm_at, at(2024, 10, 7, 7, 0));
    assert_eq!(plan.sunrise_start, at(2024, 10, 7, 6, 30));
    assert_eq!(plan.duration_minutes, 30);
    assert_eq!(
        (plan.alarm_at - plan.sunrise_start).num_milliseconds(),
        30 * 60_000
    );
}

#[test]
pub fn delay_until_past_target_is_zero() {
    let now = at(2024, 10, 7, 6, 45);

    assert_eq!(delay_until(at(2024, 10, 7, 6, 30), now), std::time::Duration::ZERO);
    assert_eq!(
        delay_until(at(2024, 10, 7, 7, 0), now),
        std::time::Duration::from_secs(15 * 60)
    );
}

fn reference_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (1900i32..2200, 1u32..=365, 0u32..86_400, 0u32..1_000).prop_map(
        |(year, ordinal, seconds, millis)| {
            NaiveDate::from_yo_opt(year, ordinal)
                .unwrap()
                .and_time(
                    NaiveTime::from_num_seconds_from_midnight_opt(seconds, millis * 1_000_000)
                        .unwrap(),
                )
        },
    )
}

fn days_of_week() -> impl Strategy<Value = DaysOfWeek> {
    prop::collection::vec(0u8..=6, 1..10).prop_map(|days| DaysOfWeek::new(days).unwrap())
}

proptest! {
    #[test]
    fn next_alarm_is_in_future_on_allowed_day_at_wake_time(
        reference in reference_datetime(),
        wake_time in arb::<NaiveTime>(),
        days in days_of_week(),
    ) {
        let wake_time = WakeTime::new(wake_time);

        let next = calculate_next_alarm(&wake_time, &days, reference);

        prop_assert!(next > reference, "Alarm should always be in the future. next = {next}, reference = {reference}");
        prop_assert!(days.contains(next.weekday()), "Alarm weekday {:?} not in {:?}", next.weekday(), days);
        prop_assert_eq!(next.time(), *wake_time.time());
        prop_assert_eq!(next.second(), 0);
        prop_assert!((next - reference).num_days() <= 7, "Alarm should be at most a week away. next = {next}, reference = {reference}");
    }

    #[test]
    fn next_alarm_is_deterministic(
        reference in reference_datetime(),
        wake_time in arb::<NaiveTime>(),
        days in days_of_week(),
    ) {
        let wake_time = WakeTime::new(wake_time);

        prop_assert_eq!(
            calculate_next_alarm(&wake_time, &days, reference),
            calculate_next_alarm(&wake_time, &days, reference)
        );
    }

    #[test]
    fn no_allowed_occurrence_is_skipped(
        reference in reference_datetime(),
        wake_time in arb::<NaiveTime>(),
        days in days_of_week(),
    ) {
        let wake_time = WakeTime::new(wake_time);
        let next = calculate_next_alarm(&wake_time, &days, reference);

        let mut day = reference.date();
        while day < next.date() {
            let occurrence = day.and_time(*wake_time.time());
            prop_assert!(
                occurrence <= reference || !days.contains(day.weekday()),
                "Skipped an earlier occurrence {occurrence} before {next}"
            );
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn sunrise_start_is_exactly_duration_earlier(
        alarm in reference_datetime(),
        duration in 1u32..=60,
    ) {
        let sunrise = calculate_sunrise_start(alarm, duration);

        prop_assert_eq!((alarm - sunrise).num_milliseconds(), i64::from(duration) * 60_000);
    }
}
