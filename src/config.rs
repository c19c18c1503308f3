use crate::utils::crypto::SignatureAlgorithm;
use std::env;

/// Runtime configuration, read once from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cors_origins: Vec<String>,
    pub whatsapp_gateway_url: String,
    pub cloudinary: CloudinaryConfig,
    pub admin_employee_id: Option<String>,
    pub admin_password: Option<String>,
    pub rsvp_base_url: String,
    pub export_retention_hours: i64,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub signature_algorithm: SignatureAlgorithm,
}

impl CloudinaryConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "pm-connect-secret-change-me".to_string(),
            issuer: "pm-connect-service".to_string(),
            audience: "pm-connect-api".to_string(),
            ttl_hours: 24,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn var_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .or_else(|_| env::var("MONGO_URL"))
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let port = var_or("PORT", "8001")
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: var_or("JWT_SECRET", &defaults.secret),
            issuer: var_or("JWT_ISSUER", &defaults.issuer),
            audience: var_or("JWT_AUDIENCE", &defaults.audience),
            ttl_hours: var_or("TOKEN_TTL_HOURS", "24")
                .parse()
                .map_err(|e| format!("Invalid TOKEN_TTL_HOURS: {}", e))?,
        };

        if jwt.secret == defaults.secret {
            log::warn!("⚠️  JWT_SECRET not set, using the development default");
        }

        let signature_algorithm = match var_opt("CLOUDINARY_SIGNATURE_ALGORITHM") {
            Some(value) => SignatureAlgorithm::parse(&value)
                .ok_or_else(|| format!("Invalid CLOUDINARY_SIGNATURE_ALGORITHM: {}", value))?,
            None => SignatureAlgorithm::default(),
        };

        let cors_origins = var_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: var_or("HOST", "0.0.0.0"),
            port,
            database_url,
            jwt,
            cors_origins,
            whatsapp_gateway_url: var_or("WHATSAPP_GATEWAY_URL", "http://localhost:3001"),
            cloudinary: CloudinaryConfig {
                cloud_name: var_or("CLOUDINARY_CLOUD_NAME", "pm-connect-demo"),
                api_key: var_or("CLOUDINARY_API_KEY", ""),
                api_secret: var_or("CLOUDINARY_API_SECRET", ""),
                signature_algorithm,
            },
            admin_employee_id: var_opt("ADMIN_EMPLOYEE_ID"),
            admin_password: var_opt("ADMIN_PASSWORD"),
            rsvp_base_url: var_or("RSVP_BASE_URL", "https://pmconnect.app/rsvp"),
            export_retention_hours: var_or("EXPORT_RETENTION_HOURS", "24")
                .parse()
                .map_err(|e| format!("Invalid EXPORT_RETENTION_HOURS: {}", e))?,
        })
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            database_url: "mongodb://localhost:27017/pm_connect_test".to_string(),
            jwt: JwtConfig::default(),
            cors_origins: vec!["*".to_string()],
            whatsapp_gateway_url: "http://localhost:3001".to_string(),
            cloudinary: CloudinaryConfig {
                cloud_name: "demo".to_string(),
                api_key: "key".to_string(),
                api_secret: "secret".to_string(),
                signature_algorithm: SignatureAlgorithm::default(),
            },
            admin_employee_id: None,
            admin_password: None,
            rsvp_base_url: "https://pmconnect.app/rsvp".to_string(),
            export_retention_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_origin() {
        let mut config = AppConfig::for_tests();
        assert!(config.allows_any_origin());
        config.cors_origins = vec!["http://localhost:3000".to_string()];
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_cloudinary_requires_credentials() {
        let mut config = AppConfig::for_tests();
        assert!(config.cloudinary.is_configured());
        config.cloudinary.api_secret.clear();
        assert!(!config.cloudinary.is_configured());
    }
}
