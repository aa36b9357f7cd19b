//! JWT claims decoding for the room session bus.
//!
//! Issuing tokens is someone else's problem (§1 Non-goals) — the bus only
//! ever decodes a bearer token a client hands it during `room:join` to learn
//! `userId`, and treats an absent or invalid token as "unauthenticated"
//! rather than a hard error except where a room requires one.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a `room:join` token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject — the authenticated user id.
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Decode and validate a bearer token against the configured signing secret.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}
