use std::env;
use std::str::FromStr;

use chrono_tz::Tz;
use tracing::warn;

pub const DEFAULT_TIMEZONE: &str = "Asia/Jakarta";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub clinic_timezone: String,
    pub storage_bucket: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_ROLE_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using empty value");
                    String::new()
                }),
            jwt_expiry_hours: parse_or_default("JWT_EXPIRY_HOURS", 24),
            clinic_timezone: env::var("CLINIC_TIMEZONE")
                .unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string()),
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| {
                    warn!("STORAGE_BUCKET not set, using default");
                    "clinic-uploads".to_string()
                }),
            max_upload_bytes: parse_or_default("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            request_timeout_secs: parse_or_default("REQUEST_TIMEOUT_SECS", 5),
            port: parse_or_default("PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_service_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    /// The clinic's civil timezone. Every date and time-of-day a client sends
    /// is interpreted under this zone.
    pub fn timezone(&self) -> Tz {
        Tz::from_str(&self.clinic_timezone).unwrap_or_else(|_| {
            warn!(
                "Unknown CLINIC_TIMEZONE '{}', falling back to {}",
                self.clinic_timezone, DEFAULT_TIMEZONE
            );
            chrono_tz::Asia::Jakarta
        })
    }
}

fn parse_or_default<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_zone(zone: &str) -> AppConfig {
        AppConfig {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "service".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiry_hours: 24,
            clinic_timezone: zone.to_string(),
            storage_bucket: "bucket".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: 5,
            port: 3000,
        }
    }

    #[test]
    fn test_timezone_parses_known_zone() {
        assert_eq!(config_with_zone("Asia/Makassar").timezone(), chrono_tz::Asia::Makassar);
    }

    #[test]
    fn test_timezone_falls_back_to_jakarta() {
        assert_eq!(config_with_zone("Mars/Olympus").timezone(), chrono_tz::Asia::Jakarta);
    }

    #[test]
    fn test_is_configured_requires_secret() {
        let mut config = config_with_zone(DEFAULT_TIMEZONE);
        assert!(config.is_configured());
        config.jwt_secret.clear();
        assert!(!config.is_configured());
    }
}
