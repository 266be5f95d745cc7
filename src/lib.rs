//! # Autoecon - Chat Progression and Economy Backend
//!
//! Autoecon is the persistence and rules backend for a chat-platform economy
//! bot: per-participant experience and levels, a coin currency, an item
//! inventory, cooldown-gated earning actions (mine, chop, fish, a daily
//! claim), peer-to-peer transfers, item sales, and community leaderboards.
//!
//! Every mutating operation for a participant is serialized through a
//! per-participant lock registry, so concurrent commands from the same
//! person cannot interleave into lost updates. Time and randomness are
//! injected (a [`econ::Clock`] trait and a seedable generator), which keeps
//! cooldown and yield behavior testable without sleeping.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use autoecon::config::Config;
//! use autoecon::econ::{
//!     CommandInvocation, Dispatcher, ProfileStoreBuilder, ProgressionEngine,
//!     RewardEngine, SystemClock, XpCooldowns,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = Arc::new(ProfileStoreBuilder::new(&config.storage.data_dir).open()?);
//!     let clock = Arc::new(SystemClock);
//!     let cooldowns = Arc::new(XpCooldowns::new(config.economy.xp_cooldown_secs));
//!     let progression =
//!         ProgressionEngine::new(store.clone(), cooldowns, clock.clone(), &config.economy);
//!     let rewards = RewardEngine::new(store.clone(), clock, config.economy.clone());
//!     let dispatcher = Dispatcher::new(store, progression, rewards, &config.economy);
//!
//!     let inv = CommandInvocation {
//!         participant_id: "42".into(),
//!         display_name: "Alice".into(),
//!         discriminator: "0001".into(),
//!         guild_context: None,
//!         action: "daily".into(),
//!         args: vec![],
//!     };
//!     let response = dispatcher.handle(&inv).await;
//!     println!("{:?}", response);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`econ`] - profiles, engines, and command dispatch
//! - [`config`] - configuration management and validation
//! - [`logutil`] - log sanitization helpers

pub mod config;
pub mod econ;
pub mod logutil;
