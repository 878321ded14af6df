use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// Time-window selector applied to historical metric queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    All,
    Day,
    Week,
    Month,
    Year,
    Custom,
}

impl RangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKind::All => "all",
            RangeKind::Day => "day",
            RangeKind::Week => "week",
            RangeKind::Month => "month",
            RangeKind::Year => "year",
            RangeKind::Custom => "custom",
        }
    }
}

/// Which historical slice of aggregated data a request wants.
///
/// `All` with no bounds is the push default: the full running state since the
/// last persisted checkpoint. `Custom` carries explicit bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub kind: RangeKind,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Range {
    pub fn all() -> Self {
        Self {
            kind: RangeKind::All,
            start: None,
            end: None,
        }
    }

    pub fn custom(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            kind: RangeKind::Custom,
            start: Some(start),
            end: Some(end),
        }
    }

    /// Build a range from the `period`/`start`/`end` query parameters of the
    /// pull surface. Unrecognized periods and a custom period without both
    /// bounds are rejected so the operator sees the mistake instead of
    /// silently getting `all`.
    pub fn from_query(
        period: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self> {
        let kind = match period {
            None | Some("") | Some("all") => return Ok(Self::all()),
            Some("day") => RangeKind::Day,
            Some("week") => RangeKind::Week,
            Some("month") => RangeKind::Month,
            Some("year") => RangeKind::Year,
            Some("custom") => {
                let (start, end) = match (start, end) {
                    (Some(s), Some(e)) => (parse_date(s)?, parse_date(e)?),
                    _ => {
                        return Err(Error::SnapshotBuildFailed(
                            "custom period requires start and end dates".to_string(),
                        ))
                    }
                };
                return Ok(Self::custom(start, end));
            }
            Some(other) => {
                return Err(Error::SnapshotBuildFailed(format!(
                    "unknown period: {other}"
                )))
            }
        };
        Ok(Self {
            kind,
            start: None,
            end: None,
        })
    }

    /// Query-string form appended to pull URLs so the remote endpoint
    /// captures the same window.
    pub fn to_query(&self) -> String {
        match (self.kind, self.start, self.end) {
            (RangeKind::All, _, _) => String::new(),
            (RangeKind::Custom, Some(start), Some(end)) => {
                format!("period=custom&start={start}&end={end}")
            }
            (kind, _, _) => format!("period={}", kind.as_str()),
        }
    }
}

impl Default for Range {
    fn default() -> Self {
        Self::all()
    }
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    value
        .parse()
        .map_err(|_| Error::SnapshotBuildFailed(format!("invalid date: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_all() {
        assert_eq!(Range::from_query(None, None, None).unwrap(), Range::all());
        assert_eq!(
            Range::from_query(Some("all"), None, None).unwrap(),
            Range::all()
        );
    }

    #[test]
    fn test_custom_requires_bounds() {
        assert!(Range::from_query(Some("custom"), Some("2026-01-01"), None).is_err());

        let range =
            Range::from_query(Some("custom"), Some("2026-01-01"), Some("2026-01-31")).unwrap();
        assert_eq!(range.kind, RangeKind::Custom);
        assert_eq!(range.to_query(), "period=custom&start=2026-01-01&end=2026-01-31");
    }

    #[test]
    fn test_unknown_period_rejected() {
        assert!(Range::from_query(Some("fortnight"), None, None).is_err());
    }

    #[test]
    fn test_query_round_trip() {
        let week = Range::from_query(Some("week"), None, None).unwrap();
        assert_eq!(week.to_query(), "period=week");
        assert_eq!(Range::all().to_query(), "");
    }
}
