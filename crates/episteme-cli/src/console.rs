//! Reading prompt answers from stdin

use episteme_flow::PromptChoice;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Ask until one of `choices` is picked; `None` on end of input
    pub async fn ask_choice(
        &mut self,
        choices: &[PromptChoice],
    ) -> anyhow::Result<Option<PromptChoice>> {
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            match parse_choice(&line, choices) {
                Some(choice) => return Ok(Some(choice)),
                None => println!("Please enter a number between 1 and {}.", choices.len()),
            }
        }
    }
}

/// Accepts the 1-based position in `choices` or a keyword
pub fn parse_choice(input: &str, choices: &[PromptChoice]) -> Option<PromptChoice> {
    let input = input.trim().to_ascii_lowercase();

    let choice = match input.parse::<usize>() {
        Ok(index) => index.checked_sub(1).and_then(|i| choices.get(i)).copied(),
        Err(_) => match input.as_str() {
            "r" | "reuse" | "existing" | "open" => Some(PromptChoice::Reuse),
            "new" | "create" | "generate" | "y" | "yes" => Some(PromptChoice::GenerateNew),
            "no" | "cancel" | "close" | "dismiss" | "q" => Some(PromptChoice::Dismiss),
            _ => None,
        },
    }?;

    choices.contains(&choice).then_some(choice)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[PromptChoice] = &[
        PromptChoice::Reuse,
        PromptChoice::GenerateNew,
        PromptChoice::Dismiss,
    ];
    const CONFIRM: &[PromptChoice] = &[PromptChoice::GenerateNew, PromptChoice::Dismiss];

    #[test]
    fn test_numbers_follow_offered_choices() {
        assert_eq!(parse_choice("1", ALL), Some(PromptChoice::Reuse));
        assert_eq!(parse_choice(" 1 ", CONFIRM), Some(PromptChoice::GenerateNew));
        assert_eq!(parse_choice("3", CONFIRM), None);
        assert_eq!(parse_choice("0", ALL), None);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(parse_choice("Yes", CONFIRM), Some(PromptChoice::GenerateNew));
        assert_eq!(parse_choice("no", CONFIRM), Some(PromptChoice::Dismiss));
        assert_eq!(parse_choice("reuse", ALL), Some(PromptChoice::Reuse));
    }

    #[test]
    fn test_choices_not_offered_are_refused() {
        assert_eq!(parse_choice("reuse", CONFIRM), None);
        assert_eq!(parse_choice("maybe", ALL), None);
    }
}
