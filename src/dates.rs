//! Dates typed on the command line.

use chrono::{Datelike, Duration, NaiveDate};
use color_eyre::{eyre::eyre, Result};

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Interpret a user-supplied date relative to `today`.
///
/// Accepts `YYYY-MM-DD`, `today`/`tod`, `tomorrow`/`tom`,
/// `yesterday`/`yes`, `lastweek`, a signed day offset, or a weekday:
/// `fri` is the coming Friday (today if it is Friday), `lastfri` the one
/// before today, `nextfri` the Friday of next week.
pub fn interpret_date(input: &str, today: NaiveDate) -> Result<NaiveDate> {
  let input = input.trim().to_lowercase();

  if input.find('-') == Some(4) {
    return NaiveDate::parse_from_str(&input, "%Y-%m-%d")
      .map_err(|e| eyre!("Error, problem with date supplied \"{}\": {}", input, e));
  }

  let delta = match input.as_str() {
    "today" | "tod" => 0,
    "tomorrow" | "tom" => 1,
    "yesterday" | "yes" => -1,
    "lastweek" => -7,
    other => match weekday_delta(other, today) {
      Some(delta) => delta,
      None => other
        .parse::<i64>()
        .map_err(|_| eyre!("Error, problem with date supplied \"{}\"", input))?,
    },
  };

  Duration::try_days(delta)
    .and_then(|d| today.checked_add_signed(d))
    .ok_or_else(|| eyre!("Error, date \"{}\" is out of range", input))
}

fn weekday_delta(input: &str, today: NaiveDate) -> Option<i64> {
  let (prefix, name) = if let Some(name) = input.strip_prefix("last") {
    ("last", name)
  } else if let Some(name) = input.strip_prefix("next") {
    ("next", name)
  } else {
    ("", input)
  };

  let requested = WEEKDAYS.iter().position(|d| *d == name)? as i64 + 1;
  let current = today.weekday().number_from_monday() as i64;
  let delta = requested - current;

  Some(match prefix {
    // Same weekday means a week ago
    "last" if delta >= 0 => delta - 7,
    "next" => delta + 7,
    // Same weekday means today
    "" if delta < 0 => delta + 7,
    _ => delta,
  })
}
