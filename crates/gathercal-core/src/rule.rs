//! Recurrence rule grammar.
//!
//! Templates persist their schedule as a colon-separated rule string:
//!
//! - `WEEKLY:<DAY>` - every week on `<DAY>`
//! - `MONTHLY:<N>:<DAY>` - the Nth `<DAY>` of each month (1-based)
//! - `MONTHLY:LAST:<DAY>` - the last `<DAY>` of each month
//!
//! where `<DAY>` is one of `SUN`, `MON`, `TUE`, `WED`, `THU`, `FRI`, `SAT`.
//!
//! [`parse_rule`] never fails: a rule that does not match the grammar comes
//! back as [`RuleParse::Unrecognized`] so the caller decides whether to log,
//! alert, or skip. [`RecurrenceRule::from_str`] is the strict variant and
//! reports why the string was rejected.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a rule string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule string was empty.
    #[error("recurrence rule is empty")]
    Empty,

    /// The leading token was not `WEEKLY` or `MONTHLY`.
    #[error("unknown recurrence type `{0}`")]
    UnknownType(String),

    /// A day token was not one of the seven upper-case abbreviations.
    #[error("unknown day `{0}`")]
    UnknownDay(String),

    /// The monthly ordinal was neither `LAST` nor a positive integer.
    #[error("invalid ordinal `{0}`")]
    InvalidOrdinal(String),

    /// Too few or too many tokens for the rule type.
    #[error("malformed rule `{0}`")]
    Malformed(String),
}

/// A structured recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Every week on the given day.
    Weekly { day: Weekday },
    /// The Nth occurrence of the given day in each month.
    MonthlyOrdinal { ordinal: u32, day: Weekday },
    /// The last occurrence of the given day in each month.
    MonthlyLast { day: Weekday },
}

impl RecurrenceRule {
    /// Returns the weekday this rule fires on.
    pub fn weekday(&self) -> Weekday {
        match self {
            Self::Weekly { day } | Self::MonthlyOrdinal { day, .. } | Self::MonthlyLast { day } => {
                *day
            }
        }
    }

    /// Returns true for the monthly variants.
    pub fn is_monthly(&self) -> bool {
        !matches!(self, Self::Weekly { .. })
    }
}

impl FromStr for RecurrenceRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(RuleError::Empty);
        }

        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            ["WEEKLY", day] => Ok(Self::Weekly {
                day: parse_day(day)?,
            }),
            ["WEEKLY", ..] => Err(RuleError::Malformed(s.to_string())),
            ["MONTHLY", "LAST", day] => Ok(Self::MonthlyLast {
                day: parse_day(day)?,
            }),
            ["MONTHLY", ordinal, day] => {
                let ordinal = ordinal
                    .parse::<u32>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| RuleError::InvalidOrdinal(ordinal.to_string()))?;
                Ok(Self::MonthlyOrdinal {
                    ordinal,
                    day: parse_day(day)?,
                })
            }
            ["MONTHLY", ..] => Err(RuleError::Malformed(s.to_string())),
            [kind, ..] => Err(RuleError::UnknownType(kind.to_string())),
            [] => Err(RuleError::Empty),
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly { day } => write!(f, "WEEKLY:{}", day_token(*day)),
            Self::MonthlyOrdinal { ordinal, day } => {
                write!(f, "MONTHLY:{}:{}", ordinal, day_token(*day))
            }
            Self::MonthlyLast { day } => write!(f, "MONTHLY:LAST:{}", day_token(*day)),
        }
    }
}

/// The outcome of parsing a persisted rule string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleParse {
    /// The string matched the grammar.
    Recognized(RecurrenceRule),
    /// The string did not match; carries the raw text for reporting.
    Unrecognized(String),
}

impl RuleParse {
    /// Returns the rule if it was recognized.
    pub fn rule(&self) -> Option<&RecurrenceRule> {
        match self {
            Self::Recognized(rule) => Some(rule),
            Self::Unrecognized(_) => None,
        }
    }

    /// Returns true if the string matched the grammar.
    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Recognized(_))
    }
}

/// Parses a rule string into a [`RuleParse`].
pub fn parse_rule(raw: &str) -> RuleParse {
    match raw.parse::<RecurrenceRule>() {
        Ok(rule) => RuleParse::Recognized(rule),
        Err(_) => RuleParse::Unrecognized(raw.to_string()),
    }
}

fn parse_day(token: &str) -> Result<Weekday, RuleError> {
    match token {
        "SUN" => Ok(Weekday::Sun),
        "MON" => Ok(Weekday::Mon),
        "TUE" => Ok(Weekday::Tue),
        "WED" => Ok(Weekday::Wed),
        "THU" => Ok(Weekday::Thu),
        "FRI" => Ok(Weekday::Fri),
        "SAT" => Ok(Weekday::Sat),
        other => Err(RuleError::UnknownDay(other.to_string())),
    }
}

fn day_token(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "SUN",
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_weekly() {
        let rule: RecurrenceRule = "WEEKLY:TUE".parse().unwrap();
        assert_eq!(rule, RecurrenceRule::Weekly { day: Weekday::Tue });
        assert!(!rule.is_monthly());
    }

    #[test]
    fn parses_monthly_ordinal() {
        let rule: RecurrenceRule = "MONTHLY:3:WED".parse().unwrap();
        assert_eq!(
            rule,
            RecurrenceRule::MonthlyOrdinal {
                ordinal: 3,
                day: Weekday::Wed
            }
        );
        assert_eq!(rule.weekday(), Weekday::Wed);
    }

    #[test]
    fn parses_monthly_last() {
        let rule: RecurrenceRule = "MONTHLY:LAST:THU".parse().unwrap();
        assert_eq!(rule, RecurrenceRule::MonthlyLast { day: Weekday::Thu });
        assert!(rule.is_monthly());
    }

    #[test]
    fn display_round_trips_to_grammar() {
        for raw in ["WEEKLY:SUN", "MONTHLY:5:FRI", "MONTHLY:LAST:SAT"] {
            let rule: RecurrenceRule = raw.parse().unwrap();
            assert_eq!(rule.to_string(), raw);
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<RecurrenceRule>(), Err(RuleError::Empty));
        assert_eq!(
            "DAILY:MON".parse::<RecurrenceRule>(),
            Err(RuleError::UnknownType("DAILY".into()))
        );
        assert_eq!(
            "WEEKLY:tue".parse::<RecurrenceRule>(),
            Err(RuleError::UnknownDay("tue".into()))
        );
        assert_eq!(
            "WEEKLY".parse::<RecurrenceRule>(),
            Err(RuleError::Malformed("WEEKLY".into()))
        );
        assert_eq!(
            "MONTHLY:0:MON".parse::<RecurrenceRule>(),
            Err(RuleError::InvalidOrdinal("0".into()))
        );
        assert_eq!(
            "MONTHLY:first:MON".parse::<RecurrenceRule>(),
            Err(RuleError::InvalidOrdinal("first".into()))
        );
        assert_eq!(
            "MONTHLY:2:MON:X".parse::<RecurrenceRule>(),
            Err(RuleError::Malformed("MONTHLY:2:MON:X".into()))
        );
    }

    #[test]
    fn parse_rule_keeps_unrecognized_text() {
        assert_eq!(
            parse_rule("WEEKLY:FUNDAY"),
            RuleParse::Unrecognized("WEEKLY:FUNDAY".to_string())
        );
        let parsed = parse_rule("WEEKLY:MON");
        assert!(parsed.is_recognized());
        assert_eq!(
            parsed.rule(),
            Some(&RecurrenceRule::Weekly { day: Weekday::Mon })
        );
    }
}
