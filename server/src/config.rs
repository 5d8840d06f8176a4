// hortifruti-server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProviderKind {
  MercadoPago,
  Mock,
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` runs the service on the in-memory store.
  pub database_url: Option<String>,
  pub run_migrations: bool,
  pub seed_catalog: bool,
  pub jwt_secret: String,
  pub payment_provider: PaymentProviderKind,
  /// Blank or absent means payments are not configured.
  pub mp_access_token: Option<String>,
  pub mp_api_base_url: String,
  pub pix_notification_url: Option<String>,
  pub fallback_payer_email_domain: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("run_migrations", &self.run_migrations)
      .field("seed_catalog", &self.seed_catalog)
      .field("payment_provider", &self.payment_provider)
      .field("mp_access_token", &self.mp_access_token.as_ref().map(|_| "[REDACTED]"))
      .field("mp_api_base_url", &self.mp_api_base_url)
      .field("pix_notification_url", &self.pix_notification_url)
      .finish_non_exhaustive()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from any variable source; `from_env` passes the process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get_env = |var_name: &str| lookup(var_name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let parse_flag = |var_name: &str, default: bool| -> Result<bool> {
      match get_env(var_name) {
        None => Ok(default),
        Some(raw) => raw
          .to_lowercase()
          .parse::<bool>()
          .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", var_name, raw, e))),
      }
    };

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = get_env("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let database_url = get_env("DATABASE_URL");
    let run_migrations = parse_flag("RUN_MIGRATIONS", true)?;
    let seed_catalog = parse_flag("SEED_CATALOG", false)?;
    let jwt_secret = get_env("JWT_SECRET")
      .ok_or_else(|| AppError::Config("Missing environment variable 'JWT_SECRET'".to_string()))?;

    let payment_provider = match get_env("PAYMENT_PROVIDER").as_deref().map(str::to_lowercase).as_deref() {
      None | Some("mercadopago") | Some("mercado_pago") => PaymentProviderKind::MercadoPago,
      Some("mock") => PaymentProviderKind::Mock,
      Some(other) => return Err(AppError::Config(format!("Unknown PAYMENT_PROVIDER '{}'", other))),
    };
    let mp_access_token = get_env("MP_ACCESS_TOKEN");
    let mp_api_base_url = get_env("MP_API_BASE_URL")
      .unwrap_or_else(|| "https://api.mercadopago.com".to_string())
      .trim_end_matches('/')
      .to_string();
    let pix_notification_url = get_env("PIX_NOTIFICATION_URL");
    let fallback_payer_email_domain =
      get_env("PIX_FALLBACK_PAYER_EMAIL_DOMAIN").unwrap_or_else(|| "hortifruti.app".to_string());

    if mp_access_token.is_none() && payment_provider == PaymentProviderKind::MercadoPago {
      tracing::warn!("MP_ACCESS_TOKEN is not set; PIX endpoints will answer 500 until it is.");
    }
    tracing::info!("Application configuration loaded successfully.");

    Ok(Self {
      server_host,
      server_port,
      database_url,
      run_migrations,
      seed_catalog,
      jwt_secret,
      payment_provider,
      mp_access_token,
      mp_api_base_url,
      pix_notification_url,
      fallback_payer_email_domain,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn config_from(vars: &[(&str, &str)]) -> Result<AppConfig> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    AppConfig::from_lookup(|name| vars.get(name).cloned())
  }

  #[test]
  fn defaults_apply_when_only_the_secret_is_set() {
    let config = config_from(&[("JWT_SECRET", "s3cret")]).unwrap();
    assert_eq!(config.server_host, "127.0.0.1");
    assert_eq!(config.server_port, 8080);
    assert_eq!(config.database_url, None);
    assert!(config.run_migrations);
    assert!(!config.seed_catalog);
    assert_eq!(config.payment_provider, PaymentProviderKind::MercadoPago);
    assert_eq!(config.mp_access_token, None);
    assert_eq!(config.mp_api_base_url, "https://api.mercadopago.com");
    assert_eq!(config.fallback_payer_email_domain, "hortifruti.app");
  }

  #[test]
  fn missing_secret_is_a_config_error() {
    assert!(matches!(config_from(&[]), Err(AppError::Config(_))));
  }

  #[test]
  fn invalid_values_are_rejected() {
    assert!(config_from(&[("JWT_SECRET", "x"), ("SERVER_PORT", "http")]).is_err());
    assert!(config_from(&[("JWT_SECRET", "x"), ("SEED_CATALOG", "sim")]).is_err());
    assert!(config_from(&[("JWT_SECRET", "x"), ("PAYMENT_PROVIDER", "stripe")]).is_err());
  }

  #[test]
  fn blank_token_counts_as_unset() {
    let config = config_from(&[("JWT_SECRET", "x"), ("MP_ACCESS_TOKEN", "   "), ("PAYMENT_PROVIDER", "Mock")]).unwrap();
    assert_eq!(config.mp_access_token, None);
    assert_eq!(config.payment_provider, PaymentProviderKind::Mock);
  }

  #[test]
  fn debug_output_redacts_secrets() {
    let config = config_from(&[("JWT_SECRET", "x"), ("MP_ACCESS_TOKEN", "APP_USR-123")]).unwrap();
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("APP_USR-123"));
  }
}
