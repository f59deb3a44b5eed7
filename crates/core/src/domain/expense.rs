use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::account::AccountId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub owner: AccountId,
    pub description: String,
    pub total: Decimal,
    pub currency: String,
    pub date: DateTime<Utc>,
    pub public_key: String,
}

/// A not-yet-persisted expense. `public_key` is the owner's stored key,
/// carried so the ledger backend can seal the record without a second
/// account lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct NewExpense {
    pub owner: AccountId,
    pub description: String,
    pub total: Decimal,
    pub currency: String,
    pub date: DateTime<Utc>,
    pub public_key: String,
}

/// Time window a spend-total query aggregates over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpendPeriod {
    Today,
    Week,
    Month,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unrecognized spend period `{0}`")]
pub struct SpendPeriodError(pub String);

impl std::str::FromStr for SpendPeriod {
    type Err = SpendPeriodError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" | "day" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(SpendPeriodError(other.to_string())),
        }
    }
}

impl SpendPeriod {
    /// Inclusive lower bound of the aggregation window ending at `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Today => Utc
                .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
                .single()
                .unwrap_or(now),
            Self::Week => now - Duration::days(7),
            Self::Month => Utc
                .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
                .single()
                .unwrap_or(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::SpendPeriod;

    #[test]
    fn parses_known_periods() {
        assert_eq!("month".parse::<SpendPeriod>(), Ok(SpendPeriod::Month));
        assert_eq!("Week".parse::<SpendPeriod>(), Ok(SpendPeriod::Week));
        assert_eq!("today".parse::<SpendPeriod>(), Ok(SpendPeriod::Today));
        assert_eq!("day".parse::<SpendPeriod>(), Ok(SpendPeriod::Today));
    }

    #[test]
    fn rejects_unknown_period() {
        let error = "foo".parse::<SpendPeriod>().expect_err("foo is not a period");
        assert_eq!(error.to_string(), "unrecognized spend period `foo`");
    }

    #[test]
    fn month_window_starts_on_the_first() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 15, 30, 0).single().expect("valid date");
        let start = SpendPeriod::Month.start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).single().expect("valid date"));
    }

    #[test]
    fn today_window_starts_at_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 8, 26, 15, 30, 0).single().expect("valid date");
        let start = SpendPeriod::Today.start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 8, 26, 0, 0, 0).single().expect("valid date"));
    }
}
