//! Calendar timestamps of day, month or year precision.
//!
//! A [`Timestamp`] keeps its fields strictly nested: a day is only stored when
//! a month is present, and a month only when a year is present. The
//! [`Granularity`] is derived from whichever fields are set.

use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// TIMEX3 value markers that never resolve to an AD calendar date.
const INVALID_TIMEX_MARKERS: [&str; 2] = ["REF", "BC"];

/// Precision of a [`Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "M")]
    Month,
    #[serde(rename = "Y")]
    Year,
    #[serde(rename = "NONE")]
    None,
}

impl Granularity {
    /// The three granularities that carry graphs, finest first.
    pub const DATED: [Granularity; 3] = [Granularity::Day, Granularity::Month, Granularity::Year];

    /// Short tag used in the timeline and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "D",
            Granularity::Month => "M",
            Granularity::Year => "Y",
            Granularity::None => "NONE",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A date of day, month or year precision, or no date at all.
///
/// Equality, hashing and ordering are all defined on the `(year, month, day)`
/// tuple. Absent fields sort before present ones, so a year sorts before all
/// of its months and a month before all of its days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Timestamp {
    year: Option<i32>,
    month: Option<u8>,
    day: Option<u8>,
}

impl Timestamp {
    /// Creates a timestamp, truncating any field whose parent is missing.
    pub fn new(year: Option<i32>, month: Option<u8>, day: Option<u8>) -> Self {
        let month = year.and(month);
        let day = month.and(day);
        Self { year, month, day }
    }

    /// A timestamp without any date information.
    pub const fn none() -> Self {
        Self { year: None, month: None, day: None }
    }

    pub fn year(year: i32) -> Self {
        Self::new(Some(year), None, None)
    }

    pub fn month(year: i32, month: u8) -> Self {
        Self::new(Some(year), Some(month), None)
    }

    pub fn day(year: i32, month: u8, day: u8) -> Self {
        Self::new(Some(year), Some(month), Some(day))
    }

    #[inline]
    pub fn year_value(&self) -> Option<i32> {
        self.year
    }

    #[inline]
    pub fn month_value(&self) -> Option<u8> {
        self.month
    }

    #[inline]
    pub fn day_value(&self) -> Option<u8> {
        self.day
    }

    /// Precision derived from the fields that are set.
    pub fn granularity(&self) -> Granularity {
        match (self.year, self.month, self.day) {
            (Some(_), Some(_), Some(_)) => Granularity::Day,
            (Some(_), Some(_), None) => Granularity::Month,
            (Some(_), None, None) => Granularity::Year,
            _ => Granularity::None,
        }
    }

    /// The enclosing year bucket, if a year is known.
    pub fn year_bucket(&self) -> Option<Timestamp> {
        self.year.map(Timestamp::year)
    }

    /// The enclosing month bucket, if a month is known.
    pub fn month_bucket(&self) -> Option<Timestamp> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => Some(Timestamp::month(year, month)),
            _ => None,
        }
    }

    /// Every bucket an observation at this timestamp contributes to.
    ///
    /// Days roll up into their month and year, months into their year.
    /// A timestamp without a year contributes nowhere.
    pub fn rollup_buckets(&self) -> Vec<Timestamp> {
        match self.granularity() {
            Granularity::Day => {
                let mut buckets = vec![*self];
                buckets.extend(self.month_bucket());
                buckets.extend(self.year_bucket());
                buckets
            }
            Granularity::Month => {
                let mut buckets = vec![*self];
                buckets.extend(self.year_bucket());
                buckets
            }
            Granularity::Year => vec![*self],
            Granularity::None => Vec::new(),
        }
    }

    /// Parses a TIMEX3 value (`1863-07-01`, `1863-W27`, `PRESENT_REF`, ...) or
    /// a whole TIMEX3 tag carrying a `value` attribute.
    ///
    /// Anything that does not start with a four digit year resolves to a
    /// timestamp without date. Parsing stops at the first component that is
    /// not a valid two digit month or day, so week or season values keep
    /// their year and `1863-13` resolves to the year alone.
    pub fn from_timex(raw: &str) -> Self {
        let trimmed = raw.trim();
        let value = if trimmed.starts_with('<') {
            match timex_value_attribute(trimmed) {
                Some(value) => value,
                None => return Self::none(),
            }
        } else {
            trimmed
        };

        if INVALID_TIMEX_MARKERS.iter().any(|marker| value.contains(marker)) {
            return Self::none();
        }

        let mut parts = value.split('-');
        let Some(year) = parts.next().and_then(|p| parse_digits::<i32>(p, 4)) else {
            return Self::none();
        };
        let month = parts.next().and_then(parse_month);
        let day = month.and_then(|_| parts.next()).and_then(parse_day);

        Self::new(Some(year), month, day)
    }
}

/// Extracts the `value` attribute of a TIMEX3 tag, single or double quoted.
fn timex_value_attribute(tag: &str) -> Option<&str> {
    let start = tag.find("value=")? + "value=".len();
    let rest = &tag[start..];
    match rest.chars().next()? {
        '"' | '\'' => {}
        _ => return None,
    }
    let body = &rest[1..];
    let end = body.find(['"', '\''])?;
    Some(&body[..end])
}

fn parse_digits<T: FromStr>(part: &str, width: usize) -> Option<T> {
    if part.len() == width && part.bytes().all(|b| b.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

fn parse_month(part: &str) -> Option<u8> {
    parse_digits::<u8>(part, 2).filter(|m| (1..=12).contains(m))
}

fn parse_day(part: &str) -> Option<u8> {
    parse_digits::<u8>(part, 2).filter(|d| (1..=31).contains(d))
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.year, self.month, self.day) {
            (Some(y), Some(m), Some(d)) => write!(f, "{:04}-{:02}-{:02}", y, m, d),
            (Some(y), Some(m), None) => write!(f, "{:04}-{:02}", y, m),
            (Some(y), None, None) => write!(f, "{:04}", y),
            _ => Ok(()),
        }
    }
}

impl FromStr for Timestamp {
    type Err = CoreError;

    /// Strict inverse of `Display`: `""`, `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::none());
        }
        let invalid = || CoreError::InvalidTimestamp(s.to_string());

        let parts: Vec<&str> = s.split('-').collect();
        if parts.len() > 3 {
            return Err(invalid());
        }
        let year = parse_digits::<i32>(parts[0], 4).ok_or_else(invalid)?;
        let month = match parts.get(1) {
            Some(p) => Some(parse_month(p).ok_or_else(invalid)?),
            None => None,
        };
        let day = match parts.get(2) {
            Some(p) => Some(parse_day(p).ok_or_else(invalid)?),
            None => None,
        };
        Ok(Self::new(Some(year), month, day))
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.to_string()
    }
}

impl TryFrom<String> for Timestamp {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_granularity_from_fields() {
        assert_eq!(Timestamp::day(1863, 7, 1).granularity(), Granularity::Day);
        assert_eq!(Timestamp::month(1863, 7).granularity(), Granularity::Month);
        assert_eq!(Timestamp::year(1863).granularity(), Granularity::Year);
        assert_eq!(Timestamp::none().granularity(), Granularity::None);
    }

    #[test]
    fn test_nesting_is_enforced() {
        // a day without a month is dropped
        let ts = Timestamp::new(Some(1863), None, Some(4));
        assert_eq!(ts, Timestamp::year(1863));
        assert_eq!(ts.day_value(), None);

        let ts = Timestamp::new(None, Some(7), Some(4));
        assert_eq!(ts.granularity(), Granularity::None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Timestamp::day(1863, 7, 1).to_string(), "1863-07-01");
        assert_eq!(Timestamp::month(1863, 11).to_string(), "1863-11");
        assert_eq!(Timestamp::year(812).to_string(), "0812");
        assert_eq!(Timestamp::none().to_string(), "");
    }

    #[test]
    fn test_equality_and_hashing_by_tuple() {
        let mut set = HashSet::new();
        set.insert(Timestamp::day(1863, 7, 1));
        set.insert(Timestamp::new(Some(1863), Some(7), Some(1)));
        set.insert(Timestamp::month(1863, 7));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_ordering_is_chronological_and_coarse_first() {
        let mut stamps = vec![
            Timestamp::day(1863, 7, 1),
            Timestamp::month(1863, 2),
            Timestamp::year(1864),
            Timestamp::month(1863, 7),
            Timestamp::year(1863),
        ];
        stamps.sort();
        let rendered: Vec<String> = stamps.iter().map(|t| t.to_string()).collect();
        assert_eq!(rendered, vec!["1863", "1863-02", "1863-07", "1863-07-01", "1864"]);
    }

    #[test]
    fn test_rollup_buckets() {
        assert_eq!(
            Timestamp::day(1863, 7, 1).rollup_buckets(),
            vec![Timestamp::day(1863, 7, 1), Timestamp::month(1863, 7), Timestamp::year(1863)]
        );
        assert_eq!(
            Timestamp::month(1863, 7).rollup_buckets(),
            vec![Timestamp::month(1863, 7), Timestamp::year(1863)]
        );
        assert_eq!(Timestamp::year(1863).rollup_buckets(), vec![Timestamp::year(1863)]);
        assert!(Timestamp::none().rollup_buckets().is_empty());
    }

    #[test]
    fn test_from_timex_values() {
        assert_eq!(Timestamp::from_timex("1863-07-01"), Timestamp::day(1863, 7, 1));
        assert_eq!(Timestamp::from_timex("1863-07"), Timestamp::month(1863, 7));
        assert_eq!(Timestamp::from_timex("1863"), Timestamp::year(1863));
        // week and season values keep their year only
        assert_eq!(Timestamp::from_timex("1863-W27"), Timestamp::year(1863));
        assert_eq!(Timestamp::from_timex("1863-SU"), Timestamp::year(1863));
        assert_eq!(Timestamp::from_timex("1863-07-01T10:00"), Timestamp::month(1863, 7));
        // out-of-range parts stop the date where they occur
        assert_eq!(Timestamp::from_timex("1863-13-40"), Timestamp::year(1863));
        assert_eq!(Timestamp::from_timex("1863-00"), Timestamp::year(1863));
        assert_eq!(Timestamp::from_timex("1863-07-40"), Timestamp::month(1863, 7));
        assert_eq!(Timestamp::from_timex("1863-07-00"), Timestamp::month(1863, 7));
        // decades and references are not dates
        assert_eq!(Timestamp::from_timex("186"), Timestamp::none());
        assert_eq!(Timestamp::from_timex("PRESENT_REF"), Timestamp::none());
        assert_eq!(Timestamp::from_timex("BC0044"), Timestamp::none());
    }

    #[test]
    fn test_from_timex_tag() {
        let tag = r#"<TIMEX3 tid="t4" type="DATE" value="1863-07-01">"#;
        assert_eq!(Timestamp::from_timex(tag), Timestamp::day(1863, 7, 1));

        let tag = "<TIMEX3 tid='t5' type='DATE' value='1864'>";
        assert_eq!(Timestamp::from_timex(tag), Timestamp::year(1864));

        let tag = r#"<TIMEX3 tid="t6" type="DURATION">"#;
        assert_eq!(Timestamp::from_timex(tag), Timestamp::none());
    }

    #[test]
    fn test_from_str_is_strict() {
        assert_eq!("1863-07-01".parse::<Timestamp>().unwrap(), Timestamp::day(1863, 7, 1));
        assert_eq!("".parse::<Timestamp>().unwrap(), Timestamp::none());
        assert!("1863-13".parse::<Timestamp>().is_err());
        assert!("1863-W27".parse::<Timestamp>().is_err());
        assert!("63-07-01".parse::<Timestamp>().is_err());
        assert!("1863-07-01-02".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_from_timex_renders_parseable() {
        for raw in ["1863-13-40", "1863-07-40", "1863-00-01", "1863-12-31", "1863-W27"] {
            let ts = Timestamp::from_timex(raw);
            assert_eq!(ts.to_string().parse::<Timestamp>().unwrap(), ts, "{}", raw);
        }
    }

    #[test]
    fn test_serde_as_string() {
        let ts = Timestamp::month(1863, 7);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1863-07\"");
        let parsed: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ts);
    }
}
