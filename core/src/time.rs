use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc, Weekday};

use crate::error::{Error, Result};

const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";
const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const FRACTION_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses a deadline typed by a person, relative to the local clock.
///
/// Accepts `today`, `tomorrow`, `eow`, `+Nd`, `+Nw`, weekday names (`fri`, `2:fri`)
/// and absolute `YYYY-MM-DD[THH:MM[:SS]]` forms.
pub fn parse_deadline(input: &str) -> Result<NaiveDateTime> {
    parse_deadline_from(input, Local::now().date_naive())
}

/// Same as [`parse_deadline`] with an explicit "today".
pub fn parse_deadline_from(input: &str, today: NaiveDate) -> Result<NaiveDateTime> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidInput("Empty deadline".to_string()));
    }

    // 1. Absolute forms
    if let Some(dt) = parse_absolute(input) {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(end_of_day(d));
    }

    // 2. Reserved keywords
    match input.to_lowercase().as_str() {
        "today" | "tod" => return Ok(end_of_day(today)),
        "tomorrow" | "tom" => return Ok(end_of_day(today + Duration::days(1))),
        "eow" => {
            let days_to_sunday = 6 - today.weekday().num_days_from_monday() as i64;
            return Ok(end_of_day(today + Duration::days(days_to_sunday)));
        }
        _ => {}
    }

    // 3. Relative format (+Nd, +Nw)
    if let Some(rest) = input.strip_prefix('+') {
        if rest.len() < 2 || !rest.is_char_boundary(rest.len() - 1) {
            return Err(Error::InvalidInput(format!("Invalid relative deadline: {}", input)));
        }
        let (num_str, unit) = rest.split_at(rest.len() - 1);
        let count: i64 = num_str
            .parse()
            .map_err(|_| Error::InvalidInput(format!("Invalid relative deadline: {}", input)))?;
        let offset = match unit.to_lowercase().as_str() {
            "d" => Duration::try_days(count),
            "w" => Duration::try_weeks(count),
            _ => return Err(Error::InvalidInput(format!("Unknown unit in relative deadline: {}", unit))),
        };
        return Ok(end_of_day(shift(today, offset, input)?));
    }

    // 4. Weekday format (fri, 2:fri)
    if let Some((count, day_str)) = parse_weekday_token(input) {
        if let Some(target) = parse_weekday_str(day_str) {
            let mut days_needed = target.num_days_from_monday() as i64 - today.weekday().num_days_from_monday() as i64;
            if days_needed <= 0 {
                days_needed += 7;
            }
            let offset = (count - 1)
                .checked_mul(7)
                .and_then(|extra| extra.checked_add(days_needed))
                .and_then(Duration::try_days);
            return Ok(end_of_day(shift(today, offset, input)?));
        }
    }

    Err(Error::InvalidInput(format!("Could not parse deadline: {}", input)))
}

fn parse_absolute(input: &str) -> Option<NaiveDateTime> {
    let normalized = input.replacen(' ', "T", 1);
    NaiveDateTime::parse_from_str(&normalized, FRACTION_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, MINUTE_FORMAT))
        .ok()
        .or_else(|| {
            // Offset-qualified timestamps are folded into local wall-clock time.
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.with_timezone(&Local).naive_local())
        })
}

/// Renders a deadline in its stored form: minute precision unless seconds are set.
pub fn deadline_to_string(deadline: &NaiveDateTime) -> String {
    let format = if deadline.nanosecond() != 0 {
        FRACTION_FORMAT
    } else if deadline.second() != 0 {
        SECOND_FORMAT
    } else {
        MINUTE_FORMAT
    };
    deadline.format(format).to_string()
}

/// Human-facing rendering, e.g. `Jan 1, 2024 09:30`.
pub fn format_deadline(deadline: Option<&NaiveDateTime>) -> String {
    match deadline {
        Some(d) => d.format("%b %-d, %Y %H:%M").to_string(),
        None => "No deadline".to_string(),
    }
}

/// Resolves a local wall-clock time to an instant. Times skipped by a DST
/// transition are read as UTC.
pub fn local_to_utc(deadline: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&deadline)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| deadline.and_utc())
}

/// Moves `today` by `offset`; a missing offset or an out-of-range date is invalid input.
fn shift(today: NaiveDate, offset: Option<Duration>, input: &str) -> Result<NaiveDate> {
    offset
        .and_then(|d| today.checked_add_signed(d))
        .ok_or_else(|| Error::InvalidInput(format!("Deadline out of range: {}", input)))
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or_default())
}

fn parse_weekday_token(input: &str) -> Option<(i64, &str)> {
    match input.split_once(':') {
        Some((count, day)) => count.parse::<i64>().ok().filter(|c| *c >= 1).map(|c| (c, day)),
        None => Some((1, input)),
    }
}

fn parse_weekday_str(s: &str) -> Option<Weekday> {
    match s.to_lowercase().as_str() {
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tuesday" => Some(Weekday::Tue),
        "wed" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        "sun" | "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Serde adapter for `Option<NaiveDateTime>` deadlines.
pub mod deadline_format {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_str(&super::deadline_to_string(dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_absolute(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid deadline '{}'", s))),
        }
    }
}
