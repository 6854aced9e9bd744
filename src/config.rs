use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; in-memory store when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared HS256 secret of the external auth provider
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dev-secret-change-me".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingConfig {
    /// How long before `scheduled_start` reminders go out
    pub reminder_lead_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            reminder_lead_secs: 3600,
        }
    }
}

impl BookingConfig {
    pub fn reminder_lead(&self) -> Duration {
        Duration::from_secs(self.reminder_lead_secs)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WalletConfig {
    pub currency: String,
    /// Verification delay before earnings settle; 0 settles immediately
    pub settlement_delay_secs: u64,
    /// Share of each earning withheld as platform fee (0..1)
    pub platform_fee_rate: Decimal,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            currency: "USD".to_string(),
            settlement_delay_secs: 0,
            platform_fee_rate: Decimal::ZERO,
        }
    }
}

impl WalletConfig {
    pub fn settlement_delay(&self) -> Duration {
        Duration::from_secs(self.settlement_delay_secs)
    }
}

/// Fixed ranking weights. Not user-tunable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RankingConfig {
    pub rating_weight: f64,
    pub completion_weight: f64,
    pub response_weight: f64,
    /// Bayesian prior mean applied to the average rating
    pub prior_rating: f64,
    /// Number of virtual reviews at `prior_rating`
    pub prior_weight: f64,
    /// Confirmations within this window count as responsive
    pub response_target_secs: u64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            rating_weight: 0.6,
            completion_weight: 0.25,
            response_weight: 0.15,
            prior_rating: 3.5,
            prior_weight: 5.0,
            response_target_secs: 86_400,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationConfig {
    pub queue_size: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { queue_size: 1024 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerConfig {
    pub settlement_interval_secs: u64,
    pub reminder_interval_secs: u64,
    pub ranking_interval_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            settlement_interval_secs: 60,
            reminder_interval_secs: 300,
            ranking_interval_secs: 3600,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", config_path))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let mut config: AppConfig = serde_yaml::from_str(content)?;
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.postgres_url = Some(url);
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let fee = self.wallet.platform_fee_rate;
        if fee < Decimal::ZERO || fee >= Decimal::ONE {
            anyhow::bail!("wallet.platform_fee_rate must be in [0, 1), got {}", fee);
        }
        let r = &self.ranking;
        let weights = [r.rating_weight, r.completion_weight, r.response_weight];
        if weights.iter().any(|w| *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
            anyhow::bail!("ranking weights must be non-negative with a positive sum");
        }
        if !(0.0..=5.0).contains(&r.prior_rating) || r.prior_weight < 0.0 {
            anyhow::bail!("ranking prior out of range");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
log_level: info
log_dir: ./logs
log_file: cunslt.log
use_json: false
rotation: daily
gateway:
  host: 0.0.0.0
  port: 8080
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.wallet.settlement_delay_secs, 0);
        assert_eq!(config.wallet.platform_fee_rate, Decimal::ZERO);
        assert_eq!(config.ranking, RankingConfig::default());
        assert_eq!(config.notifications.queue_size, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_wallet_section() {
        let yaml = format!(
            "{}wallet:\n  currency: EUR\n  settlement_delay_secs: 86400\n  platform_fee_rate: \"0.1\"\n",
            MINIMAL
        );
        let config: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.wallet.currency, "EUR");
        assert_eq!(config.wallet.settlement_delay(), Duration::from_secs(86400));
        assert_eq!(config.wallet.platform_fee_rate, Decimal::new(1, 1));
    }

    #[test]
    fn test_rejects_fee_rate_of_one() {
        let mut config: AppConfig = serde_yaml::from_str(MINIMAL).unwrap();
        config.wallet.platform_fee_rate = Decimal::ONE;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_weights() {
        let mut config: AppConfig = serde_yaml::from_str(MINIMAL).unwrap();
        config.ranking.rating_weight = 0.0;
        config.ranking.completion_weight = 0.0;
        config.ranking.response_weight = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shipped_dev_config_parses() {
        let config: AppConfig = serde_yaml::from_str(include_str!("../config/dev.yaml")).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.postgres_url.is_none());
        assert_eq!(config.booking.reminder_lead(), Duration::from_secs(3600));
    }
}
