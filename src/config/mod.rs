use config::{Config, ConfigError, Environment};
use rust_decimal::Decimal;
use serde::Deserialize;

fn default_port() -> u16 {
    5000
}

fn default_currency() -> String {
    "LKR".to_string()
}

fn default_minimum_donation() -> Decimal {
    Decimal::from(30)
}

fn default_success_code() -> String {
    "2".to_string()
}

fn default_pending_code() -> String {
    "0".to_string()
}

/// Process configuration, sourced from the environment (`.env` in
/// development). Status-code mappings and the donation minimum are
/// configuration, not constants scattered across call sites.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub jwt_secret: String,
    pub frontend_url: String,
    pub backend_url: String,
    pub payhere_merchant_id: String,
    #[serde(default)]
    pub payhere_merchant_secret: Option<String>,
    #[serde(default)]
    pub payhere_sandbox: bool,
    #[serde(default)]
    pub payhere_notify_url: Option<String>,
    #[serde(default = "default_currency")]
    pub donation_currency: String,
    #[serde(default = "default_minimum_donation")]
    pub minimum_donation_amount: Decimal,
    #[serde(default = "default_success_code")]
    pub payhere_success_code: String,
    #[serde(default = "default_pending_code")]
    pub payhere_pending_code: String,
    /// Development-only switch: initiation auto-approves and the webhook
    /// skips signature verification. Removes the gateway from the trust
    /// boundary, so it must never default to on.
    #[serde(default)]
    pub bypass_payment_gateway: bool,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let settings: Settings = Config::builder()
            .add_source(Environment::default())
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() || self.jwt_secret == "change_this_secret" {
            return Err(ConfigError::Message(
                "JWT_SECRET is not set or is using the default insecure value".to_string(),
            ));
        }
        if !self.bypass_payment_gateway
            && self
                .payhere_merchant_secret
                .as_deref()
                .unwrap_or("")
                .is_empty()
        {
            return Err(ConfigError::Message(
                "PAYHERE_MERCHANT_SECRET is required when the payment gateway is active"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Webhook callback URL advertised to the gateway.
    pub fn notify_url(&self) -> String {
        self.payhere_notify_url
            .clone()
            .unwrap_or_else(|| format!("{}/api/payment/notify", self.backend_url))
    }

    pub fn merchant_secret(&self) -> &str {
        self.payhere_merchant_secret.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_settings() -> Settings {
        Settings {
            database_url: "postgres://localhost/portal".to_string(),
            port: 5000,
            jwt_secret: "a-strong-secret".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            backend_url: "http://localhost:5000".to_string(),
            payhere_merchant_id: "M1209".to_string(),
            payhere_merchant_secret: Some("merchant-secret".to_string()),
            payhere_sandbox: true,
            payhere_notify_url: None,
            donation_currency: default_currency(),
            minimum_donation_amount: default_minimum_donation(),
            payhere_success_code: default_success_code(),
            payhere_pending_code: default_pending_code(),
            bypass_payment_gateway: false,
        }
    }

    #[test]
    fn missing_merchant_secret_fails_validation_when_gateway_active() {
        let mut settings = base_settings();
        settings.payhere_merchant_secret = None;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_merchant_secret_allowed_in_bypass_mode() {
        let mut settings = base_settings();
        settings.payhere_merchant_secret = None;
        settings.bypass_payment_gateway = true;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn placeholder_jwt_secret_is_rejected() {
        let mut settings = base_settings();
        settings.jwt_secret = "change_this_secret".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn notify_url_falls_back_to_backend_url() {
        let settings = base_settings();
        assert_eq!(settings.notify_url(), "http://localhost:5000/api/payment/notify");

        let mut overridden = base_settings();
        overridden.payhere_notify_url = Some("https://api.example.org/hook".to_string());
        assert_eq!(overridden.notify_url(), "https://api.example.org/hook");
    }
}
