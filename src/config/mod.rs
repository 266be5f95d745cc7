//! Configuration management for the economy engine.
//!
//! Every tunable the engines consume lives here: cooldown durations, yield
//! ranges, drop probabilities, the item price table, daily reward amounts,
//! and the per-message experience grant. All values carry serde defaults so
//! a partial TOML file (or none at all) yields the canonical configuration.
//!
//! ```rust,no_run
//! use autoecon::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("mine cooldown: {}s", config.economy.mine.cooldown_secs);
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::econ::types::{GatherKind, ItemKind};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub economy: EconomyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub name: String,
    /// Command prefix stripped by the transport before dispatch. The console
    /// front end in the binary uses it the same way.
    pub command_prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "autoecon".to_string(),
            command_prefix: "auto".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("autoecon.log".to_string()),
        }
    }
}

/// Tunables for one gated gathering action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatherConfig {
    pub cooldown_secs: u64,
    /// Inclusive range for the primary yield (coins for mining, items otherwise).
    pub yield_min: u64,
    pub yield_max: u64,
    /// Inclusive range for the experience yield.
    pub xp_min: u64,
    pub xp_max: u64,
    /// Probability in [0,1) of the bonus item dropping.
    pub drop_chance: f64,
    /// Inclusive range for the bonus quantity when it drops.
    pub drop_min: u64,
    pub drop_max: u64,
}

impl GatherConfig {
    fn validate(&self, verb: &str) -> Result<()> {
        if self.yield_min == 0 || self.yield_min > self.yield_max {
            return Err(anyhow!("{}: invalid yield range", verb));
        }
        if self.xp_min == 0 || self.xp_min > self.xp_max {
            return Err(anyhow!("{}: invalid xp range", verb));
        }
        if !(0.0..=1.0).contains(&self.drop_chance) {
            return Err(anyhow!("{}: drop_chance must be within [0,1]", verb));
        }
        if self.drop_min == 0 || self.drop_min > self.drop_max {
            return Err(anyhow!("{}: invalid drop range", verb));
        }
        Ok(())
    }
}

fn default_mine() -> GatherConfig {
    GatherConfig {
        cooldown_secs: 60,
        yield_min: 1,
        yield_max: 10,
        xp_min: 1,
        xp_max: 5,
        drop_chance: 0.10,
        drop_min: 1,
        drop_max: 1,
    }
}

fn default_chop() -> GatherConfig {
    GatherConfig {
        cooldown_secs: 60,
        yield_min: 1,
        yield_max: 4,
        xp_min: 1,
        xp_max: 3,
        drop_chance: 0.20,
        drop_min: 1,
        drop_max: 2,
    }
}

fn default_fish() -> GatherConfig {
    GatherConfig {
        cooldown_secs: 60,
        yield_min: 1,
        yield_max: 4,
        xp_min: 1,
        xp_max: 3,
        drop_chance: 0.20,
        drop_min: 1,
        drop_max: 2,
    }
}

fn default_xp_per_message() -> u64 {
    20
}

fn default_xp_cooldown_secs() -> u64 {
    60
}

fn default_daily_coins() -> u64 {
    50
}

fn default_daily_xp() -> u64 {
    100
}

fn default_daily_cooldown_hours() -> u64 {
    24
}

fn default_op_timeout_secs() -> u64 {
    5
}

/// Unit prices for inventory liquidation, keyed by item kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceTable {
    pub wood: u64,
    pub apple: u64,
    pub diamond: u64,
    pub fish: u64,
    pub puffer: u64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self {
            wood: 5,
            apple: 20,
            diamond: 150,
            fish: 10,
            puffer: 100,
        }
    }
}

impl PriceTable {
    pub fn price(&self, kind: ItemKind) -> u64 {
        match kind {
            ItemKind::Wood => self.wood,
            ItemKind::Apple => self.apple,
            ItemKind::Diamond => self.diamond,
            ItemKind::Fish => self.fish,
            ItemKind::Puffer => self.puffer,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EconomyConfig {
    /// Experience granted per qualifying message.
    #[serde(default = "default_xp_per_message")]
    pub xp_per_message: u64,
    /// Process-local cooldown between message-XP grants, in seconds.
    #[serde(default = "default_xp_cooldown_secs")]
    pub xp_cooldown_secs: u64,
    /// Daily claim rewards.
    #[serde(default = "default_daily_coins")]
    pub daily_coins: u64,
    #[serde(default = "default_daily_xp")]
    pub daily_xp: u64,
    #[serde(default = "default_daily_cooldown_hours")]
    pub daily_cooldown_hours: u64,
    /// Deadline for a single command's persistence work; expiry is surfaced
    /// as a retryable failure with nothing committed.
    #[serde(default = "default_op_timeout_secs")]
    pub op_timeout_secs: u64,
    #[serde(default = "default_mine")]
    pub mine: GatherConfig,
    #[serde(default = "default_chop")]
    pub chop: GatherConfig,
    #[serde(default = "default_fish")]
    pub fish: GatherConfig,
    #[serde(default)]
    pub prices: PriceTable,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            xp_per_message: 20,
            xp_cooldown_secs: 60,
            daily_coins: 50,
            daily_xp: 100,
            daily_cooldown_hours: 24,
            op_timeout_secs: 5,
            mine: default_mine(),
            chop: default_chop(),
            fish: default_fish(),
            prices: PriceTable::default(),
        }
    }
}

impl EconomyConfig {
    pub fn gather(&self, kind: GatherKind) -> &GatherConfig {
        match kind {
            GatherKind::Mine => &self.mine,
            GatherKind::Chop => &self.chop,
            GatherKind::Fish => &self.fish,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.mine.validate("mine")?;
        self.chop.validate("chop")?;
        self.fish.validate("fish")?;
        if self.daily_cooldown_hours == 0 {
            return Err(anyhow!("daily_cooldown_hours must be positive"));
        }
        if self.op_timeout_secs == 0 {
            return Err(anyhow!("op_timeout_secs must be positive"));
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a file.
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.economy.validate()?;

        Ok(config)
    }

    /// Create a default configuration file.
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_canonical_table() {
        let config = Config::default();
        assert_eq!(config.economy.xp_per_message, 20);
        assert_eq!(config.economy.daily_coins, 50);
        assert_eq!(config.economy.mine.cooldown_secs, 60);
        assert_eq!(config.economy.mine.drop_chance, 0.10);
        assert_eq!(config.economy.chop.drop_chance, 0.20);
        assert_eq!(config.economy.prices.price(ItemKind::Diamond), 150);
        assert!(config.economy.validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [economy]
            xp_per_message = 25
            xp_cooldown_secs = 30
            daily_coins = 75
            daily_xp = 100
            daily_cooldown_hours = 24
            op_timeout_secs = 5
            "#,
        )
        .expect("parse");
        assert_eq!(parsed.economy.xp_per_message, 25);
        // Unspecified sections fall back to the canonical values.
        assert_eq!(parsed.economy.fish.yield_max, 4);
        assert_eq!(parsed.economy.prices.wood, 5);
        assert_eq!(parsed.bot.command_prefix, "auto");
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let mut economy = EconomyConfig::default();
        economy.mine.yield_min = 20; // above yield_max
        assert!(economy.validate().is_err());

        let mut economy = EconomyConfig::default();
        economy.chop.drop_chance = 1.5;
        assert!(economy.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).expect("serialize");
        let parsed: Config = toml::from_str(&serialized).expect("reparse");
        assert_eq!(parsed.economy, config.economy);
    }
}
