use serde::Deserialize;
use std::env;

use vianda_catalog::PricingConfig;
use vianda_core::payment::BackUrls;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    pub access_token: String,
    /// Gateway API origin; overridable so tests can point at a stub.
    pub api_base_url: String,
    /// Public origin of this deployment, used to build the webhook
    /// notification URL and the hosted-checkout back URLs.
    pub public_base_url: String,
}

impl GatewayConfig {
    pub fn notification_url(&self) -> String {
        format!("{}/api/payments/webhook", self.public_base_url.trim_end_matches('/'))
    }

    pub fn back_urls(&self) -> BackUrls {
        let base = self.public_base_url.trim_end_matches('/');
        BackUrls {
            success: format!("{base}/checkout/success"),
            failure: format!("{base}/checkout/failure"),
            pending: format!("{base}/checkout/pending"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    /// Canonical pricing carries no tax; this knob re-introduces it
    /// explicitly when a deployment needs to.
    #[serde(default)]
    pub tax_rate: f64,
}

impl BusinessRules {
    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            tax_rate: self.tax_rate,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file; optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Settings from the environment (with a prefix of VIANDA)
            // E.g. `VIANDA__SERVER__PORT=9000` would set `server.port`
            .add_source(config::Environment::with_prefix("VIANDA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_gateway_urls() {
        let gateway = GatewayConfig {
            access_token: "APP_USR-test".to_string(),
            api_base_url: "https://api.mercadopago.com".to_string(),
            public_base_url: "https://viandas.example.com/".to_string(),
        };
        assert_eq!(
            gateway.notification_url(),
            "https://viandas.example.com/api/payments/webhook"
        );
        assert_eq!(
            gateway.back_urls().success,
            "https://viandas.example.com/checkout/success"
        );
    }

    #[test]
    fn business_rules_default_to_no_tax() {
        let rules = BusinessRules { tax_rate: 0.0 };
        assert_eq!(rules.pricing(), PricingConfig::default());
    }
}
