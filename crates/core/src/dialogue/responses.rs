//! Response Catalog: symbolic message keys resolved to literal reply text.
//!
//! Keys are a closed enum, so an unknown key is unrepresentable rather than
//! a runtime failure. Multi-template keys pick uniformly at random; tests
//! inject single-template overrides to stay deterministic.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// The single substitution placeholder templates may carry.
const PLACEHOLDER: &str = "{{var}}";

/// An opaque literal reply handed back to the transport layer. The empty
/// string is a defined outcome ("nothing to say"), not an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotResponse(pub String);

impl BotResponse {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for BotResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BotResponse {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    OnboardAskPassword,
    OnboardConfirmPassword,
    OnboardDecline,
    OnboardSuccess,
    TrackExpenseSuccess,
    TrackExpenseError,
    TotalAskPassword,
    TotalInvalidPassword,
    TotalSpent,
    NotUnderstood,
    Outro,
    Error,
}

fn builtin(key: MessageKey) -> &'static [&'static str] {
    use MessageKey::*;
    match key {
        OnboardAskPassword => &[
            "What's your password?",
            "Welcome! I need a password to set up your account. What should it be?",
        ],
        OnboardConfirmPassword => &["Your password is {{var}}. Is that correct?"],
        OnboardDecline => &["Okay try again later", "No worries, come back when you're ready."],
        OnboardSuccess => &[
            "Great, you're all set! Message me an expense like \"20 USD for lunch\" to get started.",
        ],
        TrackExpenseSuccess => &["Noted!", "Got it, expense recorded."],
        TrackExpenseError => &[
            "I couldn't make sense of that expense. Try something like \"12.50 EUR for coffee\".",
        ],
        TotalAskPassword => &["I need your password", "I need your password to look that up."],
        TotalInvalidPassword => &["This password is invalid"],
        TotalSpent => &["You spent {{var}}"],
        NotUnderstood => &["I didn't understand that", "Sorry, I didn't catch that."],
        Outro => &["Bye!", "Talk soon!"],
        Error => &["Whoops!", "Whoops! Something went wrong on my end."],
    }
}

/// Keyed collection of reply templates, injected into the engine so tests
/// can substitute deterministic text without shared global state.
#[derive(Clone, Debug, Default)]
pub struct ResponseCatalog {
    overrides: HashMap<MessageKey, Vec<String>>,
}

impl ResponseCatalog {
    /// Replaces the templates registered under `key`.
    pub fn with_template(mut self, key: MessageKey, template: impl Into<String>) -> Self {
        self.overrides.insert(key, vec![template.into()]);
        self
    }

    /// Resolves `key` to one literal response, interpolating `var` at the
    /// designated placeholder.
    pub fn get(&self, key: MessageKey, var: &str) -> BotResponse {
        let template = match self.overrides.get(&key) {
            Some(templates) => {
                templates.choose(&mut rand::thread_rng()).map(String::as_str).unwrap_or_default()
            }
            None => builtin(key).choose(&mut rand::thread_rng()).copied().unwrap_or_default(),
        };
        BotResponse(template.replace(PLACEHOLDER, var))
    }
}

/// Deterministic catalog mirroring the first-listed phrasing of every key.
/// Responses may be randomized from a list of options, so tests pin each key
/// to a single template to keep replies predictable.
#[cfg(test)]
pub(crate) fn test_catalog() -> ResponseCatalog {
    use MessageKey::*;
    ResponseCatalog::default()
        .with_template(OnboardAskPassword, "What's your password?")
        .with_template(OnboardConfirmPassword, "Your password is {{var}}")
        .with_template(OnboardDecline, "Okay try again later")
        .with_template(OnboardSuccess, "Your account is ready")
        .with_template(TrackExpenseSuccess, "Ok I tracked it")
        .with_template(TrackExpenseError, "I couldn't track that")
        .with_template(TotalAskPassword, "I need your password")
        .with_template(TotalInvalidPassword, "This password is invalid")
        .with_template(TotalSpent, "You spent {{var}}")
        .with_template(NotUnderstood, "I didn't understand that")
        .with_template(Outro, "Outro message")
        .with_template(Error, "Whoops!")
}

#[cfg(test)]
mod tests {
    use super::{test_catalog, BotResponse, MessageKey, ResponseCatalog};

    #[test]
    fn substitutes_the_placeholder_variable() {
        let catalog = test_catalog();
        assert_eq!(catalog.get(MessageKey::TotalSpent, "0.00"), BotResponse::from("You spent 0.00"));
    }

    #[test]
    fn empty_variable_leaves_plain_text() {
        let catalog = test_catalog();
        assert_eq!(
            catalog.get(MessageKey::NotUnderstood, ""),
            BotResponse::from("I didn't understand that")
        );
    }

    #[test]
    fn builtin_templates_cover_every_key_without_overrides() {
        let catalog = ResponseCatalog::default();
        let keys = [
            MessageKey::OnboardAskPassword,
            MessageKey::OnboardConfirmPassword,
            MessageKey::OnboardDecline,
            MessageKey::OnboardSuccess,
            MessageKey::TrackExpenseSuccess,
            MessageKey::TrackExpenseError,
            MessageKey::TotalAskPassword,
            MessageKey::TotalInvalidPassword,
            MessageKey::TotalSpent,
            MessageKey::NotUnderstood,
            MessageKey::Outro,
            MessageKey::Error,
        ];
        for key in keys {
            assert!(!catalog.get(key, "x").is_empty(), "{key:?} must resolve to text");
        }
    }

    #[test]
    fn random_selection_stays_within_registered_templates() {
        let catalog = ResponseCatalog::default();
        for _ in 0..16 {
            let response = catalog.get(MessageKey::Outro, "").0;
            assert!(response == "Bye!" || response == "Talk soon!");
        }
    }
}
