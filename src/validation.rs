//! Repairs untrusted configuration into an [`AlarmConfig`].
//!
//! Nothing in here fails. Every field of the input is checked on its own and
//! replaced by a fallback value when it does not pass, so a config written by
//! an older version (or edited by hand) keeps whatever is still usable.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::alarm::{AlarmConfig, DaysOfWeek, MAX_SUNRISE_MINUTES, MIN_SUNRISE_MINUTES, WakeTime};

static TIME_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("Valid regex"));

pub fn default_config() -> AlarmConfig {
    AlarmConfig::default()
}

/// `H:MM` or `HH:MM`, hour 0..=23, minute 00..=59.
pub fn is_valid_time_format(value: &str) -> bool {
    TIME_FORMAT.is_match(value)
}

/// Integer minutes in 1..=60. Floats are rejected even when integral.
pub fn is_valid_duration(value: &Value) -> bool {
    value
        .as_u64()
        .is_some_and(|d| (u64::from(MIN_SUNRISE_MINUTES)..=u64::from(MAX_SUNRISE_MINUTES)).contains(&d))
}

pub fn is_valid_days_of_week(value: &Value) -> bool {
    value.as_array().is_some_and(|days| {
        !days.is_empty() && days.iter().all(|day| day.as_u64().is_some_and(|d| d <= 6))
    })
}

pub fn validate_and_fix_config(input: &Value) -> AlarmConfig {
    fix_with_fallback(input, &default_config())
}

/// Applies a partial edit (any subset of the config keys) on top of `current`.
/// Fields missing from the edit or failing validation keep their current value.
pub fn apply_edit(current: &AlarmConfig, edit: &Value) -> AlarmConfig {
    fix_with_fallback(edit, current)
}

fn fix_with_fallback(input: &Value, fallback: &AlarmConfig) -> AlarmConfig {
    if !input.is_object() {
        log::warn!("Alarm config is not an object, using fallback values. [input = {input}]");
    }

    let enabled = accept(input, "enabled", |v| v.as_bool()).unwrap_or(fallback.enabled);

    let wake_time = accept(input, "wakeTime", |v| {
        v.as_str()
            .filter(|s| is_valid_time_format(s))
            .and_then(|s| s.parse::<WakeTime>().ok())
    })
    .unwrap_or(fallback.wake_time);

    let duration = accept(input, "duration", |v| {
        is_valid_duration(v)
            .then(|| v.as_u64())
            .flatten()
            .and_then(|d| u32::try_from(d).ok())
    })
    .unwrap_or(fallback.duration);

    let days_of_week = accept(input, "daysOfWeek", |v| {
        if !is_valid_days_of_week(v) {
            return None;
        }
        let days = v.as_array()?.iter().filter_map(Value::as_u64);
        DaysOfWeek::new(days.filter_map(|d| u8::try_from(d).ok())).ok()
    })
    .unwrap_or_else(|| fallback.days_of_week.clone());

    AlarmConfig {
        enabled,
        wake_time,
        duration,
        days_of_week,
    }
}

fn accept<T>(input: &Value, key: &str, parse: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
    let value = input.get(key)?;
    let parsed = parse(value);
    if parsed.is_none() {
        log::warn!("Ignoring invalid alarm config field. [field = {key}, value = {value}]");
    }
    parsed
}
