use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// bcrypt work factor for the stored refresh-token hash.
    pub hash_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let access_secret = std::env::var("JWT_SECRET")?;
        // Claims carry no token-kind field, so sharing one secret would let
        // the refresh verifier accept access tokens; both must be set
        let refresh_secret = std::env::var("JWT_REFRESH_SECRET")?;
        if refresh_secret == access_secret {
            anyhow::bail!("JWT_REFRESH_SECRET must differ from JWT_SECRET");
        }
        let jwt = JwtConfig {
            refresh_secret,
            access_secret,
            access_ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            refresh_ttl_minutes: std::env::var("JWT_REFRESH_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let hash_cost = std::env::var("HASH_COST")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        Ok(Self {
            database_url,
            jwt,
            hash_cost,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations cannot race each other
    #[test]
    fn from_env_requires_distinct_token_secrets() {
        std::env::set_var("DATABASE_URL", "postgres://localhost/skillswap");
        std::env::set_var("JWT_SECRET", "access-secret");

        std::env::remove_var("JWT_REFRESH_SECRET");
        assert!(AppConfig::from_env().is_err());

        std::env::set_var("JWT_REFRESH_SECRET", "access-secret");
        assert!(AppConfig::from_env().is_err());

        std::env::set_var("JWT_REFRESH_SECRET", "refresh-secret");
        let config = AppConfig::from_env().expect("config loads");
        assert_ne!(config.jwt.access_secret, config.jwt.refresh_secret);
    }
}
