use std::fmt::{Display, Formatter};
use std::time::Duration;

const MILLISECOND: u64 = 1;
const SECOND: u64 = 1000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const YEAR: u64 = 365 * DAY;

// units must show up in this order, and each of them at most once
const UNITS: [(&str, u64); 7] = [
    ("y", YEAR),
    ("w", WEEK),
    ("d", DAY),
    ("h", HOUR),
    ("m", MINUTE),
    ("s", SECOND),
    ("ms", MILLISECOND),
];

#[derive(Eq, PartialEq, Debug, Copy, Clone)]
pub enum ParseDurationError {
    Empty,
    BadInteger,
    MissingUnit,
    UnknownUnit,
    UnitOrder,
    Overflow,
}

impl Display for ParseDurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ParseDurationError::Empty => "empty duration string",
            ParseDurationError::BadInteger => "invalid integer in duration",
            ParseDurationError::MissingUnit => "missing unit in duration",
            ParseDurationError::UnknownUnit => "unknown unit in duration",
            ParseDurationError::UnitOrder => "units in duration must be ordered from largest to smallest and appear once",
            ParseDurationError::Overflow => "duration out of range",
        };

        f.write_str(msg)
    }
}

impl std::error::Error for ParseDurationError {}

/// leading_int consumes the leading [0-9]* from s
fn leading_int(s: &[u8]) -> Result<(u64, &[u8]), ParseDurationError> {
    let consumed = s.iter().take_while(|c| c.is_ascii_digit()).count();
    if consumed == 0 {
        return Err(ParseDurationError::BadInteger);
    }

    let value = s[..consumed].iter().try_fold(0u64, |x, &c| {
        x.checked_mul(10)?.checked_add((c - b'0') as u64)
    });

    match value {
        Some(v) => Ok((v, &s[consumed..])),
        None => Err(ParseDurationError::Overflow),
    }
}

/// parse_duration parses a duration string in the Prometheus format, which is
/// a sequence of integers each with a unit suffix, such as "30s", "5m" or "1h30m".
/// Valid units are "ms", "s", "m", "h", "d", "w" and "y", they must be ordered from
/// the largest to the smallest. A single "0" is accepted as zero.
pub fn parse_duration(text: &str) -> Result<Duration, ParseDurationError> {
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    if text.is_empty() {
        return Err(ParseDurationError::Empty);
    }

    let mut total = 0u64;
    let mut next_unit = 0;
    let mut s = text.as_bytes();

    while !s.is_empty() {
        let (value, remain) = leading_int(s)?;
        s = remain;

        // Consume unit
        let len = s.iter().take_while(|c| c.is_ascii_alphabetic()).count();
        if len == 0 {
            return Err(ParseDurationError::MissingUnit);
        }
        let unit = &s[..len];
        s = &s[len..];

        let index = UNITS
            .iter()
            .position(|(name, _)| name.as_bytes() == unit)
            .ok_or(ParseDurationError::UnknownUnit)?;
        if index < next_unit {
            return Err(ParseDurationError::UnitOrder);
        }
        next_unit = index + 1;

        total = value
            .checked_mul(UNITS[index].1)
            .and_then(|v| v.checked_add(total))
            .ok_or(ParseDurationError::Overflow)?;
    }

    Ok(Duration::from_millis(total))
}

/// format_duration renders the duration the way `parse_duration` accepts it,
/// the sub-millisecond part is truncated.
pub fn format_duration(d: &Duration) -> String {
    let mut ms = d.as_millis() as u64;
    if ms == 0 {
        return "0s".to_string();
    }

    let mut out = String::new();
    for (name, unit) in UNITS {
        if ms >= unit {
            out.push_str(&format!("{}{}", ms / unit, name));
            ms %= unit;
        }
    }

    out
}

pub mod serde {
    use std::time::Duration;

    use ::serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_duration(d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        super::parse_duration(&s).map_err(::serde::de::Error::custom)
    }
}

pub mod serde_option {
    use std::time::Duration;

    use ::serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_str(&super::format_duration(d)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let s: Option<String> = Deserialize::deserialize(deserializer)?;
        s.map(|s| super::parse_duration(&s).map_err(::serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_int() {
        let (x, remain) = leading_int("12h".as_bytes()).unwrap();
        assert_eq!(x, 12);
        assert_eq!(remain, b"h");
    }

    #[test]
    fn test_leading_int_overflow() {
        let err = leading_int("999999999999999999999".as_bytes()).unwrap_err();
        assert_eq!(err, ParseDurationError::Overflow)
    }

    #[test]
    fn test_parse_duration() {
        let tests = [
            ("0", 0),
            ("0s", 0),
            ("5s", 5 * SECOND),
            ("30s", 30 * SECOND),
            ("1478s", 1478 * SECOND),
            ("13ms", 13 * MILLISECOND),
            ("15m", 15 * MINUTE),
            ("16h", 16 * HOUR),
            ("2d", 2 * DAY),
            ("3w", 3 * WEEK),
            ("1y", YEAR),
            ("3h30m", 3 * HOUR + 30 * MINUTE),
            ("1h2m3s4ms", HOUR + 2 * MINUTE + 3 * SECOND + 4 * MILLISECOND),
            ("1y1w1d", YEAR + WEEK + DAY),
        ];

        for (input, want) in tests {
            let d = parse_duration(input).unwrap();
            assert_eq!(d, Duration::from_millis(want), "input: {input}")
        }
    }

    #[test]
    fn test_parse_duration_errors() {
        let tests = [
            ("", ParseDurationError::Empty),
            ("s", ParseDurationError::BadInteger),
            ("5", ParseDurationError::MissingUnit),
            ("5x", ParseDurationError::UnknownUnit),
            ("1.5h", ParseDurationError::MissingUnit),
            ("-5s", ParseDurationError::BadInteger),
            ("30m1h", ParseDurationError::UnitOrder),
            ("1s1s", ParseDurationError::UnitOrder),
        ];

        for (input, want) in tests {
            assert_eq!(parse_duration(input).unwrap_err(), want, "input: {input}")
        }
    }

    #[test]
    fn test_format_duration() {
        let tests = [
            (0, "0s"),
            (5 * SECOND, "5s"),
            (90 * SECOND, "1m30s"),
            (HOUR + 500 * MILLISECOND, "1h500ms"),
            (YEAR + 2 * DAY, "1y2d"),
        ];

        for (input, want) in tests {
            assert_eq!(format_duration(&Duration::from_millis(input)), want);
            assert_eq!(
                parse_duration(want).unwrap(),
                Duration::from_millis(input)
            );
        }
    }
}
