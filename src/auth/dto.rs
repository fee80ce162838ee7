use serde::Deserialize;

/// Query string Google appends to the redirect URI.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denies consent.
    pub error: Option<String>,
}
