use crate::classifier;
use crate::store::{Resource, StateStore};
use anyhow::Result;
use std::io::Write;
use tracing::{info, warn};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Interactive line input.
///
/// `Ok(None)` means the input ended before a line was entered.
pub trait Prompt {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Why a rating was not saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingOutcome {
    Saved(u8),
    OutOfRange(i64),
    Invalid(String),
}

/// Parse a rating answer.
pub fn validate(input: &str) -> RatingOutcome {
    let input = input.trim();
    match classifier::parse_integer(input) {
        Some(n) if (MIN_RATING as i64..=MAX_RATING as i64).contains(&n) => {
            RatingOutcome::Saved(n as u8)
        }
        Some(n) => RatingOutcome::OutOfRange(n),
        None => RatingOutcome::Invalid(input.to_string()),
    }
}

/// Ask for a rating and append it to the log when it is valid.
pub fn rate(
    store: &mut dyn StateStore,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> Result<RatingOutcome> {
    writeln!(out, "Rate this extension (1-5):")?;
    out.flush()?;

    let answer = prompt.read_line("Enter your rating: ")?.unwrap_or_default();
    let outcome = validate(&answer);
    match &outcome {
        RatingOutcome::Saved(n) => {
            store.append(Resource::Ratings, &format!("{}\n", n))?;
            info!(rating = *n, "rating saved");
            writeln!(out, "Your rating of {} has been saved!", n)?;
        }
        RatingOutcome::OutOfRange(n) => {
            warn!(rating = *n, "rating out of range");
            writeln!(out, "Rating must be between 1 and 5")?;
        }
        RatingOutcome::Invalid(text) => {
            warn!(input = %text, "rating is not a number");
            writeln!(out, "Invalid input. Rating not saved.")?;
        }
    }
    Ok(outcome)
}
