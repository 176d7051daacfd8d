use std::env;

/// Outbound email provider settings.
/// When absent, verification emails are written to the log instead of sent.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub sender_address: String,
    pub sender_name: Option<String>,
}

/// Environment configuration
/// Loads and validates environment variables
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub rate_limit_burst: u32,
    pub email: Option<EmailConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET must be set".to_string())?;

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let rate_limit_burst = match env::var("RATE_LIMIT_BURST") {
            Ok(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|burst| *burst > 0)
                .ok_or_else(|| format!("RATE_LIMIT_BURST must be a positive integer, got {raw:?}"))?,
            Err(_) => 10,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr,
            rate_limit_burst,
            email: EmailConfig::from_env()?,
        })
    }
}

impl EmailConfig {
    fn from_env() -> Result<Option<Self>, String> {
        let Some(api_url) = non_empty_var("EMAIL_API_URL") else {
            return Ok(None);
        };

        let api_key = non_empty_var("EMAIL_API_KEY")
            .ok_or_else(|| "EMAIL_API_KEY must be set when EMAIL_API_URL is set".to_string())?;

        let sender_address = non_empty_var("EMAIL_SENDER_ADDRESS")
            .ok_or_else(|| "EMAIL_SENDER_ADDRESS must be set when EMAIL_API_URL is set".to_string())?;

        Ok(Some(Self {
            api_url,
            api_key,
            sender_address,
            sender_name: non_empty_var("EMAIL_SENDER_NAME"),
        }))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
