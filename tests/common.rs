//! Test utilities & fixtures.
//! Builds a full engine stack on a temp store with a manual clock and a
//! seeded generator, so cooldown and yield behavior is deterministic.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

use autoecon::config::EconomyConfig;
use autoecon::econ::{
    CommandInvocation, Dispatcher, ManualClock, ProfileStore, ProfileStoreBuilder,
    ProgressionEngine, RewardEngine, XpCooldowns,
};

/// Fixed start instant so cooldown arithmetic is reproducible.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

pub struct Harness {
    // Held for the lifetime of the store.
    pub _dir: TempDir,
    pub store: Arc<ProfileStore>,
    pub clock: Arc<ManualClock>,
    pub dispatcher: Dispatcher,
}

/// Full dispatcher stack over a temp store. Equal seeds give equal yields.
#[allow(dead_code)] // Not every suite uses the full harness.
pub fn harness(seed: u64) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ProfileStoreBuilder::new(dir.path()).open().expect("store"));
    let clock = Arc::new(ManualClock::new(start_time()));
    let config = EconomyConfig::default();
    let cooldowns = Arc::new(XpCooldowns::new(config.xp_cooldown_secs));
    let progression =
        ProgressionEngine::new(store.clone(), cooldowns, clock.clone(), &config);
    let rewards = RewardEngine::with_seed(store.clone(), clock.clone(), config.clone(), seed);
    let dispatcher = Dispatcher::new(store.clone(), progression, rewards, &config);
    Harness {
        _dir: dir,
        store,
        clock,
        dispatcher,
    }
}

/// Build an invocation from a command line like `donate 10 99`. For
/// `handle_message` the action/args split is irrelevant; plain text works.
#[allow(dead_code)]
pub fn invocation(id: &str, name: &str, command: &str) -> CommandInvocation {
    let mut tokens = command.split_whitespace().map(str::to_string);
    CommandInvocation {
        participant_id: id.to_string(),
        display_name: name.to_string(),
        discriminator: "0001".to_string(),
        guild_context: Some("test-guild".to_string()),
        action: tokens.next().unwrap_or_default(),
        args: tokens.collect(),
    }
}
