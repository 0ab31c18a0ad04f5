use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use secrecy::ExposeSecret;

use crate::{config::Jwt, error::Error};

use super::error::AuthError;

#[derive(serde::Deserialize, serde::Serialize)]
pub struct Claim {
    pub user_id: i64,
    aud: String,
    iss: String,
    exp: usize,
    iat: usize,
}

const TOKEN_LIFETIME_HOURS: i64 = 24;

pub fn encode_jwt(user_id: i64, jwt: &Jwt) -> Result<String, Error> {
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(TOKEN_LIFETIME_HOURS);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat = now.timestamp() as usize;

    let claim = Claim {
        user_id,
        aud: jwt.aud.expose_secret().to_string(),
        iss: jwt.iss.expose_secret().to_string(),
        iat,
        exp,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(jwt.secret.expose_secret().as_bytes()),
    )
    .map_err(|e| Error::Auth(AuthError::JwtError(e)))
}

pub fn decode_jwt(jwt_token: String, jwt: &Jwt) -> Result<TokenData<Claim>, Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[jwt.iss.expose_secret()]);
    validation.set_audience(&[jwt.aud.expose_secret()]);

    decode::<Claim>(
        &jwt_token,
        &DecodingKey::from_secret(jwt.secret.expose_secret().as_ref()),
        &validation,
    )
    .map_err(|e| Error::Auth(AuthError::JwtError(e)))
}
