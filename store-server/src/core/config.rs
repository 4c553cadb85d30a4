//! Server configuration.
//!
//! All settings come from environment variables with sensible defaults, built
//! once at process start and passed by reference into the services. Business
//! logic never reads the environment directly.
//!
//! | Environment variable | Default | Meaning |
//! |----------------------|---------|---------|
//! | DATABASE_PATH | storefront.db | SQLite database file |
//! | APP_URL | http://localhost:5000 | Base URL used in notification links |
//! | ADMIN_EMAIL | (empty) | Recipient for low-stock alerts |
//! | EMAIL_FROM | orders@example.com | From address for outbound email |
//! | RESEND_API_KEY | (empty = mock mode) | Email provider key |
//! | TWILIO_ACCOUNT_SID | (empty = mock mode) | SMS provider account |
//! | TWILIO_AUTH_TOKEN | (empty) | SMS provider token |
//! | TWILIO_PHONE_NUMBER | (empty) | SMS sender number |
//! | LOW_STOCK_THRESHOLD | 10 | Stock level that triggers alerts |
//! | SHIPPING_FEE | 25.0 | Flat fee when delivery_method = ship |
//! | RETURN_WINDOW_DAYS | 90 | Max order age for opening a return |
//! | ENVIRONMENT | development | development / staging / production |

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub database_path: String,
    /// Base URL for links embedded in notifications
    pub app_url: String,
    /// Low-stock alert recipient; empty disables the alert email
    pub admin_email: String,
    /// From address for outbound email
    pub email_from: String,
    /// Email provider API key; empty switches the dispatcher to mock mode
    pub resend_api_key: String,
    /// SMS provider credentials; empty SID switches SMS to mock mode
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
    /// Stock level at or below which a product counts as low stock
    pub low_stock_threshold: i64,
    /// Flat shipping fee applied when the order ships
    pub shipping_fee: f64,
    /// Maximum order age (days) for opening a return
    pub return_window_days: i64,
    /// development | staging | production
    pub environment: String,
}

impl Config {
    /// Load `.env` (if present) and build the configuration from the
    /// environment.
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Build the configuration from environment variables, using defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "storefront.db".into()),
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:5000".into()),
            admin_email: std::env::var("ADMIN_EMAIL").unwrap_or_default(),
            email_from: std::env::var("EMAIL_FROM").unwrap_or_else(|_| "orders@example.com".into()),
            resend_api_key: std::env::var("RESEND_API_KEY").unwrap_or_default(),
            twilio_account_sid: std::env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            twilio_auth_token: std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            twilio_phone_number: std::env::var("TWILIO_PHONE_NUMBER").unwrap_or_default(),
            low_stock_threshold: std::env::var("LOW_STOCK_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            shipping_fee: std::env::var("SHIPPING_FEE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(25.0),
            return_window_days: std::env::var("RETURN_WINDOW_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(90),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Email provider configured?
    pub fn email_enabled(&self) -> bool {
        !self.resend_api_key.is_empty()
    }

    /// SMS provider configured?
    pub fn sms_enabled(&self) -> bool {
        !self.twilio_account_sid.is_empty()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_mode_when_unconfigured() {
        let config = Config {
            database_path: ":memory:".into(),
            app_url: "http://localhost".into(),
            admin_email: String::new(),
            email_from: "orders@example.com".into(),
            resend_api_key: String::new(),
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            twilio_phone_number: String::new(),
            low_stock_threshold: 10,
            shipping_fee: 25.0,
            return_window_days: 90,
            environment: "development".into(),
        };
        assert!(!config.email_enabled());
        assert!(!config.sms_enabled());
        assert!(!config.is_production());
    }
}
