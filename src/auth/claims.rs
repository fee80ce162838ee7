use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload carried in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub sub: Uuid,        // user ID
    pub email: String,    // email at issuance
    pub username: String, // username at issuance
    pub iat: usize,       // issued at (unix timestamp)
    pub exp: usize,       // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub aud: String,      // audience
}

impl SessionClaims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}
