#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Jwt error")]
    JwtError(jsonwebtoken::errors::Error),
    #[error("Password error")]
    PasswordError(argon2::password_hash::Error),
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("Invalid application key")]
    InvalidAppKey,
    #[error("Registration is closed")]
    RegistrationClosed,
    #[error("Incorrect credential")]
    IncorrectCredential,
}
