//! Occurrence listing for a single rule.

use chrono::NaiveDate;

use gathercal_core::{DateWindow, EXPANSION_DAYS, Occurrences, RecurrenceRule};

use crate::error::{ClientError, ClientResult};
use crate::render;

/// Returns the dates `rule` produces between `from` and `to`, inclusive.
///
/// `to` defaults to the expansion horizon after `from`.
pub fn list(rule: &str, from: NaiveDate, to: Option<NaiveDate>) -> ClientResult<Vec<NaiveDate>> {
    let parsed: RecurrenceRule = rule.parse().map_err(|source| ClientError::Rule {
        rule: rule.to_string(),
        source,
    })?;

    let window = match to {
        Some(to) => DateWindow::try_new(from, to)
            .map_err(|_| ClientError::usage(format!("--to {to} is before --from {from}")))?,
        None => DateWindow::forward(from, EXPANSION_DAYS),
    };
    Ok(Occurrences::new(parsed, window).collect())
}

/// Prints the dates `rule` produces.
pub fn run(rule: &str, from: NaiveDate, to: Option<NaiveDate>) -> ClientResult<()> {
    let dates = list(rule, from, to)?;
    print!("{}", render::dates_text(&dates));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gathercal_core::RuleError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekly_over_default_horizon() {
        let dates = list("WEEKLY:TUE", date(2024, 1, 1), None).unwrap();
        assert_eq!(dates.len(), 13);
        assert_eq!(dates[0], date(2024, 1, 2));
        assert_eq!(dates[12], date(2024, 3, 26));
    }

    #[test]
    fn explicit_end_is_inclusive() {
        let dates = list("MONTHLY:LAST:FRI", date(2024, 1, 1), Some(date(2024, 3, 29))).unwrap();
        assert_eq!(
            dates,
            vec![date(2024, 1, 26), date(2024, 2, 23), date(2024, 3, 29)]
        );
    }

    #[test]
    fn unrecognized_rule_explains_why() {
        let err = list("DAILY", date(2024, 1, 1), None).unwrap_err();
        match err {
            ClientError::Rule { rule, source } => {
                assert_eq!(rule, "DAILY");
                assert_eq!(source, RuleError::UnknownType("DAILY".into()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn inverted_window_is_rejected() {
        let err = list("WEEKLY:TUE", date(2024, 2, 1), Some(date(2024, 1, 1))).unwrap_err();
        assert!(matches!(err, ClientError::Usage(_)));
    }
}
