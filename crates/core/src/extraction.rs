//! Entity Extraction Result: the structured parse of one user message as
//! returned by the external NLP collaborator.
//!
//! The engine never sees raw NLP wire traffic; it consumes this model and
//! its predicates. Absent entities are defined error values, not panics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub value: String,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub amount: Vec<Candidate>,
    #[serde(default)]
    pub datetime: Vec<Candidate>,
    #[serde(default)]
    pub description: Vec<Candidate>,
    #[serde(default)]
    pub total_spent: Vec<Candidate>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityExtraction {
    #[serde(default)]
    pub entities: Entities,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no amount")]
    NoAmount,
    #[error("invalid amount")]
    InvalidAmount,
    #[error("no description")]
    NoDescription,
    #[error("no period specified")]
    NoPeriod,
}

/// Classification of a message once its entities are known. Tracking takes
/// priority over a total query because the query path never proposes an
/// amount field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageOverview {
    /// Amount and description both usable.
    TrackingRequested,
    /// Amount usable but the description is missing.
    TrackingIncomplete,
    /// No amount, but a spend-period phrase is present.
    TotalRequested,
    Unknown,
}

impl EntityExtraction {
    /// Amount and currency of the message, e.g. `"20 SGD"` -> `(20, "SGD")`.
    pub fn amount(&self) -> Result<(Decimal, String), ExtractionError> {
        let candidate = self.entities.amount.first().ok_or(ExtractionError::NoAmount)?;
        parse_amount(&candidate.value).ok_or(ExtractionError::InvalidAmount)
    }

    pub fn description(&self) -> Result<String, ExtractionError> {
        let candidate = self.entities.description.first().ok_or(ExtractionError::NoDescription)?;
        let description = candidate.value.trim();
        if description.is_empty() {
            return Err(ExtractionError::NoDescription);
        }
        Ok(description.trim_end_matches(['.', '!']).to_string())
    }

    pub fn spend_period(&self) -> Result<String, ExtractionError> {
        let candidate = self.entities.total_spent.first().ok_or(ExtractionError::NoPeriod)?;
        if candidate.value.trim().is_empty() {
            return Err(ExtractionError::NoPeriod);
        }
        Ok(candidate.value.trim().to_string())
    }

    /// Date of the expense; defaults to "now" when the extractor saw none.
    pub fn date(&self) -> DateTime<Utc> {
        self.entities
            .datetime
            .first()
            .and_then(|candidate| DateTime::parse_from_rfc3339(candidate.value.trim()).ok())
            .map(|date| date.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
    }

    pub fn has_amount(&self) -> bool {
        self.amount().is_ok()
    }

    pub fn overview(&self) -> MessageOverview {
        if self.amount().is_ok() {
            return if self.description().is_ok() {
                MessageOverview::TrackingRequested
            } else {
                MessageOverview::TrackingIncomplete
            };
        }
        if self.spend_period().is_ok() {
            return MessageOverview::TotalRequested;
        }
        MessageOverview::Unknown
    }
}

/// Parses a free-form amount phrase into a positive value and an ISO-style
/// currency code. Returns `None` when either half is missing.
fn parse_amount(raw: &str) -> Option<(Decimal, String)> {
    let mut amount = None;
    let mut currency = None;

    for token in raw.split_whitespace() {
        if amount.is_none() {
            if let Ok(value) = token.trim_start_matches(['$', '€', '£']).parse::<Decimal>() {
                amount = Some(value);
                continue;
            }
        }
        if currency.is_none()
            && token.len() == 3
            && token.chars().all(|character| character.is_ascii_alphabetic())
        {
            currency = Some(token.to_ascii_uppercase());
        }
    }

    match (amount, currency) {
        (Some(value), Some(code)) if value > Decimal::ZERO => Some((value, code)),
        _ => None,
    }
}
