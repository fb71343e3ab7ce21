//! Word lookup collaborator

use crate::error::LookupError;
use crate::model::LookupData;

/// Source of word definitions, typically an AI service.
pub trait WordLookup {
    fn lookup(&self, word: &str, theme: &str) -> Result<LookupData, LookupError>;
}

impl<F> WordLookup for F
where
    F: Fn(&str, &str) -> Result<LookupData, LookupError>,
{
    fn lookup(&self, word: &str, theme: &str) -> Result<LookupData, LookupError> {
        self(word, theme)
    }
}

/// Parse a provider's JSON reply. All four fields are required.
pub fn parse_lookup_payload(text: &str) -> Result<LookupData, LookupError> {
    if text.trim().is_empty() {
        return Err(LookupError::EmptyResponse);
    }
    Ok(serde_json::from_str(text)?)
}
