use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::MAX_TOKEN_TTL_HOURS,
    entity::sea_orm_active_enums::Role,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn subject(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::unauthorized())
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 bearer tokens with a key fixed at startup.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenCodec {
    /// `ttl_hours` is clamped to `1..=MAX_TOKEN_TTL_HOURS`.
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::hours(ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
        }
    }

    pub fn issue(&self, subject: Uuid, role: Role) -> AppResult<IssuedToken> {
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
        let token = self.issue_until(subject, role, expires_at)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn issue_until(
        &self,
        subject: Uuid,
        role: Role,
        expires_at: DateTime<Utc>,
    ) -> AppResult<String> {
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Fails with `Unauthorized` for malformed, expired or foreign-signed tokens.
    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "token rejected");
                AppError::Unauthorized("Invalid or expired token".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_decodes_to_its_subject() {
        let codec = TokenCodec::new("secret", 24);
        let id = Uuid::new_v4();
        let issued = codec.issue(id, Role::Customer).unwrap();
        let claims = codec.decode(&issued.token).unwrap();
        assert_eq!(claims.subject().unwrap(), id);
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn lifetime_is_clamped_instead_of_overflowing() {
        let codec = TokenCodec::new("secret", i64::MAX);
        let issued = codec.issue(Uuid::new_v4(), Role::Customer).unwrap();
        let max_exp = Utc::now() + Duration::hours(MAX_TOKEN_TTL_HOURS);
        assert!(issued.expires_at <= max_exp);
        assert!(codec.decode(&issued.token).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = TokenCodec::new("secret", 24);
        let token = codec
            .issue_until(
                Uuid::new_v4(),
                Role::Admin,
                Utc::now() - Duration::minutes(5),
            )
            .unwrap();
        assert!(matches!(
            codec.decode(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_signed_with_another_key_is_rejected() {
        let issuer = TokenCodec::new("one-key", 24);
        let verifier = TokenCodec::new("other-key", 24);
        let issued = issuer.issue(Uuid::new_v4(), Role::Customer).unwrap();
        assert!(matches!(
            verifier.decode(&issued.token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn malformed_token_is_rejected() {
        let codec = TokenCodec::new("secret", 24);
        assert!(matches!(
            codec.decode("definitely.not.ajwt"),
            Err(AppError::Unauthorized(_))
        ));
    }
}
