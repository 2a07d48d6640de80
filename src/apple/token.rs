use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;

use super::AppleCredentials;

const TOKEN_LIFETIME_HOURS: i64 = 12;

#[derive(Serialize, Debug)]
struct Claims<'a> {
    iss: &'a str,
    iat: i64,
    exp: i64,
}

/// Signs an ES256 developer token with the team's MusicKit key.
pub fn developer_token(
    credentials: &AppleCredentials,
    now: DateTime<Utc>,
) -> Result<String, anyhow::Error> {
    let mut header = Header::new(Algorithm::ES256);
    header.kid = Some(credentials.key_id.clone());

    let claims = Claims {
        iss: &credentials.team_id,
        iat: now.timestamp(),
        exp: (now + Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp(),
    };

    let key = EncodingKey::from_ec_pem(credentials.secret_key.as_bytes())
        .context("Apple Music signing key is not a valid EC private key")?;
    jsonwebtoken::encode(&header, &claims, &key).context("Failed to sign Apple Music developer token")
}
