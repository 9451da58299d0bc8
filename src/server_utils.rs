use crate::constants::{HIGH_SCORE_NAME_MAX, HIGH_SCORE_NAME_MIN};
use crate::highscore_store::HighScoreError;

/// Keeps ASCII letters only, upper-cased and capped at the table's name length.
pub fn sanitize_name(value: &str) -> Result<String, HighScoreError> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .take(HIGH_SCORE_NAME_MAX)
        .collect();
    if cleaned.len() < HIGH_SCORE_NAME_MIN {
        return Err(HighScoreError::InvalidName(value.to_string()));
    }
    Ok(cleaned)
}

pub fn parse_highscore_limit(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
}
