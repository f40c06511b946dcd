use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, error};

use crate::auth::claims::{Claims, Identity};
use crate::config::JwtConfig;
use crate::state::AppState;

/// Freshly signed access/refresh pair.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Signing and verification keys for both token classes.
///
/// Access and refresh tokens carry the same payload but are signed under
/// independent secrets with independent expiries.
#[derive(Clone)]
pub struct JwtKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            access_secret,
            refresh_secret,
            access_ttl_minutes,
            refresh_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn claims_for(&self, identity: &Identity, ttl: Duration) -> Claims {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        Claims {
            sub: identity.sub,
            email: identity.email.clone(),
            role: identity.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        }
    }

    /// Sign the same payload twice, once per token class.
    ///
    /// Failure here means a broken signer configuration, not bad input.
    pub fn sign_pair(&self, identity: &Identity) -> anyhow::Result<TokenPair> {
        let access = self.claims_for(identity, self.access_ttl);
        let refresh = self.claims_for(identity, self.refresh_ttl);
        let access_token = encode(&Header::default(), &access, &self.access_encoding)?;
        let refresh_token = encode(&Header::default(), &refresh, &self.refresh_encoding)?;
        debug!(user_id = %identity.sub, "token pair signed");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.access_decoding, &Validation::default())?;
        debug!(user_id = %data.claims.sub, "access token verified");
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.refresh_decoding, &Validation::default())?;
        debug!(user_id = %data.claims.sub, "refresh token verified");
        Ok(data.claims)
    }
}

/// One-way hash of a raw refresh token for storage on the user row.
///
/// The stored hash is a revocation/audit aid; incoming refresh tokens are
/// trusted on their signature, not compared against it.
pub fn hash_refresh_token(raw: &str, cost: u32) -> anyhow::Result<String> {
    bcrypt::hash(raw, cost).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        anyhow::anyhow!(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::UserRole;
    use uuid::Uuid;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    fn identity() -> Identity {
        Identity {
            sub: Uuid::new_v4(),
            email: "user@example.com".into(),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn sign_pair_and_verify_both_classes() {
        let keys = make_keys();
        let id = identity();
        let pair = keys.sign_pair(&id).expect("sign pair");

        let access = keys.verify_access(&pair.access_token).expect("verify access");
        assert_eq!(access.sub, id.sub);
        assert_eq!(access.email, id.email);
        assert_eq!(access.role, UserRole::User);

        let refresh = keys
            .verify_refresh(&pair.refresh_token)
            .expect("verify refresh");
        assert_eq!(refresh.sub, id.sub);
    }

    #[tokio::test]
    async fn secrets_are_independent() {
        let keys = make_keys();
        let pair = keys.sign_pair(&identity()).expect("sign pair");
        // A refresh token must not verify under the access secret and vice versa
        assert!(keys.verify_access(&pair.refresh_token).is_err());
        assert!(keys.verify_refresh(&pair.access_token).is_err());
    }

    #[tokio::test]
    async fn refresh_expiry_is_longer_than_access() {
        let keys = make_keys();
        let pair = keys.sign_pair(&identity()).expect("sign pair");
        let access = keys.verify_access(&pair.access_token).unwrap();
        let refresh = keys.verify_refresh(&pair.refresh_token).unwrap();
        assert!(refresh.exp > access.exp);
    }

    #[tokio::test]
    async fn verify_rejects_garbage() {
        let keys = make_keys();
        assert!(keys.verify_access("not.a.jwt").is_err());
    }

    #[test]
    fn refresh_token_hash_is_one_way_but_checkable() {
        let raw = "header.payload.signature";
        let hash = hash_refresh_token(raw, 4).expect("hash refresh");
        assert_ne!(hash, raw);
        assert!(bcrypt::verify(raw, &hash).expect("bcrypt verify"));
        assert!(!bcrypt::verify("other.token.value", &hash).expect("bcrypt verify"));
    }
}
