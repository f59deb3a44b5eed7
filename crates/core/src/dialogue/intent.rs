use serde::{Deserialize, Serialize};

use crate::extraction::EntityExtraction;

/// The user's inferred goal for a conversation. A closed set: adding an
/// intent is a compile-time-checked case addition, not a string comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    OnboardUser,
    TrackExpense,
    GetExpenseTotal,
}

impl Intent {
    /// Classifies a message into an intent, first match wins. Onboarding is
    /// a hard gate for unregistered senders regardless of content; an amount
    /// is the strongest structural signal for tracking because the
    /// total-query path never carries one. `None` means "could not
    /// classify", which is an expected outcome rather than an error.
    pub fn classify(extraction: &EntityExtraction, registered: bool) -> Option<Self> {
        if !registered {
            return Some(Self::OnboardUser);
        }
        if extraction.has_amount() {
            return Some(Self::TrackExpense);
        }
        if extraction.spend_period().is_ok() {
            return Some(Self::GetExpenseTotal);
        }
        None
    }

    /// Length of the intent's ordered step sequence.
    pub fn step_count(&self) -> usize {
        match self {
            Self::OnboardUser => super::onboard::STEP_COUNT,
            Self::TrackExpense => super::track_expense::STEP_COUNT,
            Self::GetExpenseTotal => super::expense_total::STEP_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Intent;
    use crate::extraction::EntityExtraction;

    fn extraction(raw: &str) -> EntityExtraction {
        serde_json::from_str(raw).expect("wire JSON should decode")
    }

    #[test]
    fn unregistered_sender_always_onboards() {
        let tracking = extraction(
            r#"{ "entities": {
                "amount": [{ "value": "20 SGD", "confidence": 100.0 }],
                "description": [{ "value": "Food", "confidence": 100.0 }]
            } }"#,
        );
        assert_eq!(Intent::classify(&tracking, false), Some(Intent::OnboardUser));
        assert_eq!(
            Intent::classify(&EntityExtraction::default(), false),
            Some(Intent::OnboardUser)
        );
    }

    #[test]
    fn amount_with_description_tracks_expense() {
        let tracking = extraction(
            r#"{ "entities": {
                "amount": [{ "value": "20 SGD", "confidence": 100.0 }],
                "description": [{ "value": "Food", "confidence": 100.0 }]
            } }"#,
        );
        assert_eq!(Intent::classify(&tracking, true), Some(Intent::TrackExpense));
    }

    #[test]
    fn amount_without_description_still_tracks_expense() {
        let tracking =
            extraction(r#"{ "entities": { "amount": [{ "value": "20 SGD" }] } }"#);
        assert_eq!(Intent::classify(&tracking, true), Some(Intent::TrackExpense));
    }

    #[test]
    fn period_phrase_alone_requests_a_total() {
        let total = extraction(r#"{ "entities": { "total_spent": [{ "value": "month" }] } }"#);
        assert_eq!(Intent::classify(&total, true), Some(Intent::GetExpenseTotal));
    }

    #[test]
    fn no_usable_entities_is_a_classification_miss() {
        assert_eq!(Intent::classify(&EntityExtraction::default(), true), None);
    }
}
