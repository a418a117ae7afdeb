//! Compact URL-safe encoding of a prompt spec for sharing.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::schema::{PromptSpec, ValidationError};

/// Query parameter that carries an encoded spec.
pub const SHARE_PARAM: &str = "pb";

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("No prompt payload found in URL.")]
    Missing,

    #[error("Invalid URL payload.")]
    Malformed,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

pub fn encode_prompt_share(spec: &PromptSpec) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(spec)?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode and validate. Trailing `=` padding is tolerated.
pub fn decode_prompt_share(value: &str) -> Result<PromptSpec, ShareError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value.trim().trim_end_matches('='))
        .map_err(|_| ShareError::Malformed)?;
    let json: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| ShareError::Malformed)?;
    Ok(PromptSpec::parse(json)?)
}

/// Pull the shared spec out of a query string such as `?pb=...&x=1`.
pub fn decode_prompt_share_query(query: &str) -> Result<PromptSpec, ShareError> {
    let encoded = query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == SHARE_PARAM)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .ok_or(ShareError::Missing)?;
    decode_prompt_share(encoded)
}
