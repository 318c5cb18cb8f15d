//! Reuse / generate / dismiss decision

use crate::existence::ExistenceCheckResult;
use crate::ticker::Ticker;

/// Fallback shown when the check returned no message
const FALLBACK_MESSAGE: &str = "Something went wrong.";

/// The user's answer to the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptChoice {
    /// Open the stored analysis
    Reuse,
    /// Start a fresh analysis task
    GenerateNew,
    /// Close the prompt
    Dismiss,
}

/// Which choices the prompt offers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// An analysis exists: reuse it or generate a new one
    ReuseOrNew,
    /// No analysis exists: generate one or dismiss
    Confirm,
    /// The check failed: the prompt only reports the error
    Error,
}

/// State of the decision prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptState {
    pub visible: bool,
    pub message: String,
    pub mode: PromptMode,
    /// `None` in [`PromptMode::Error`]
    pub ticker: Option<Ticker>,
    /// Set while a launch is in flight
    pub is_generating: bool,
}

impl PromptState {
    /// Build the prompt from an existence check
    pub fn from_check(ticker: &Ticker, result: &ExistenceCheckResult) -> Self {
        let (mode, ticker) = match result.exists {
            Some(true) => (PromptMode::ReuseOrNew, Some(ticker.clone())),
            Some(false) => (PromptMode::Confirm, Some(ticker.clone())),
            None => (PromptMode::Error, None),
        };
        let message = result.display_message();

        Self {
            visible: true,
            message: if message.trim().is_empty() {
                FALLBACK_MESSAGE.to_string()
            } else {
                message
            },
            mode,
            ticker,
            is_generating: false,
        }
    }

    /// Choices offered in the current mode
    pub fn available_choices(&self) -> &'static [PromptChoice] {
        match self.mode {
            PromptMode::ReuseOrNew => &[
                PromptChoice::Reuse,
                PromptChoice::GenerateNew,
                PromptChoice::Dismiss,
            ],
            PromptMode::Confirm => &[PromptChoice::GenerateNew, PromptChoice::Dismiss],
            PromptMode::Error => &[PromptChoice::Dismiss],
        }
    }

    /// Whether `choice` is offered and no launch is in flight
    pub fn allows(&self, choice: PromptChoice) -> bool {
        !self.is_generating && self.available_choices().contains(&choice)
    }

    /// Button label for `choice` in the current state
    pub fn label(&self, choice: PromptChoice) -> &'static str {
        match (self.mode, choice) {
            (_, PromptChoice::GenerateNew) if self.is_generating => "Generating...",
            (PromptMode::ReuseOrNew, PromptChoice::Reuse) => "Access Existing",
            (PromptMode::ReuseOrNew, PromptChoice::GenerateNew) => "Create New",
            (PromptMode::Confirm, PromptChoice::GenerateNew) => "Yes",
            (PromptMode::Confirm, PromptChoice::Dismiss) => "No",
            (PromptMode::Error, PromptChoice::Dismiss) => "Close",
            (_, PromptChoice::Reuse) => "Access Existing",
            (_, PromptChoice::GenerateNew) => "Create New",
            (_, PromptChoice::Dismiss) => "Cancel",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exists: Option<bool>, message: &str) -> ExistenceCheckResult {
        ExistenceCheckResult {
            exists,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_existing_analysis_offers_reuse_and_new() {
        let ticker = Ticker::parse("TSLA").unwrap();
        let prompt = PromptState::from_check(
            &ticker,
            &result(Some(true), "Analysis found from 2024-05-01 10:00:00"),
        );

        assert!(prompt.visible);
        assert_eq!(prompt.mode, PromptMode::ReuseOrNew);
        assert_eq!(prompt.ticker, Some(ticker));
        assert_eq!(prompt.message, "Analysis found from May 1, 2024 at 10:00 AM");
        assert!(prompt.allows(PromptChoice::Reuse));
        assert!(prompt.allows(PromptChoice::GenerateNew));
        assert_eq!(prompt.label(PromptChoice::Reuse), "Access Existing");
        assert_eq!(prompt.label(PromptChoice::GenerateNew), "Create New");
    }

    #[test]
    fn test_missing_analysis_has_no_reuse() {
        let ticker = Ticker::parse("IBM").unwrap();
        let prompt = PromptState::from_check(&ticker, &result(Some(false), "Not analyzed yet"));

        assert_eq!(prompt.mode, PromptMode::Confirm);
        assert!(!prompt.allows(PromptChoice::Reuse));
        assert_eq!(
            prompt.available_choices(),
            &[PromptChoice::GenerateNew, PromptChoice::Dismiss]
        );
        assert_eq!(prompt.label(PromptChoice::GenerateNew), "Yes");
        assert_eq!(prompt.label(PromptChoice::Dismiss), "No");
    }

    #[test]
    fn test_failed_check_only_dismisses() {
        let ticker = Ticker::parse("IBM").unwrap();
        let prompt = PromptState::from_check(&ticker, &result(None, ""));

        assert_eq!(prompt.mode, PromptMode::Error);
        assert_eq!(prompt.ticker, None);
        assert_eq!(prompt.message, "Something went wrong.");
        assert_eq!(prompt.available_choices(), &[PromptChoice::Dismiss]);
    }

    #[test]
    fn test_generating_blocks_every_choice() {
        let ticker = Ticker::parse("TSLA").unwrap();
        let mut prompt = PromptState::from_check(&ticker, &result(Some(true), "found"));
        prompt.is_generating = true;

        assert!(!prompt.allows(PromptChoice::Reuse));
        assert!(!prompt.allows(PromptChoice::Dismiss));
        assert_eq!(prompt.label(PromptChoice::GenerateNew), "Generating...");
    }
}
