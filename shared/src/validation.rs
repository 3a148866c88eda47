use crate::models::VoteOption;

pub const MAX_TOKEN_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing vote option")]
    MissingOption,
    #[error("Unrecognized vote option: {0}")]
    UnrecognizedOption(String),
}

/// Lowercases and trims a submitted option key. Blank input is rejected
/// outright; anything else that is not a configured key is reported as
/// unrecognized so the caller can count it in the fallback bucket.
pub fn parse_vote_option(raw: Option<&str>) -> Result<VoteOption, ValidationError> {
    let normalized = raw
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingOption)?;

    VoteOption::from_key(&normalized).ok_or(ValidationError::UnrecognizedOption(normalized))
}

pub fn is_well_formed_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LENGTH
        && token.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
