//! Message-driven experience grants.
//!
//! Every qualifying non-command message earns a flat experience increment,
//! throttled by a process-local cooldown. The cooldown cache is an injected
//! object rather than ambient state so tests can scope and reset it, and it
//! is deliberately not persisted: losing it on restart only lets a
//! participant earn one grant early, which affects no currency state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use tokio::sync::Mutex;

use crate::config::EconomyConfig;
use crate::econ::clock::Clock;
use crate::econ::errors::EconError;
use crate::econ::storage::ProfileStore;
use crate::logutil::escape_log;

/// Process-local map from participant id to the last grant timestamp.
pub struct XpCooldowns {
    window: Duration,
    last_grant: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl XpCooldowns {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::seconds(window_secs as i64),
            last_grant: Mutex::new(HashMap::new()),
        }
    }

    /// Returns true and records `now` if the participant is past the window.
    /// The window starts at grant time, so a blocked message does not push
    /// the next eligible moment further out.
    pub async fn check_and_touch(&self, id: &str, now: DateTime<Utc>) -> bool {
        let mut map = self.last_grant.lock().await;
        if let Some(last) = map.get(id) {
            if now - *last < self.window {
                return false;
            }
        }
        map.insert(id.to_string(), now);
        true
    }

    /// Drop all recorded grants (used between tests and on operator request).
    pub async fn reset(&self) {
        self.last_grant.lock().await.clear();
    }
}

/// Applies experience for qualifying messages and reports level-ups.
pub struct ProgressionEngine {
    store: Arc<ProfileStore>,
    cooldowns: Arc<XpCooldowns>,
    clock: Arc<dyn Clock>,
    xp_per_message: u64,
}

impl ProgressionEngine {
    pub fn new(
        store: Arc<ProfileStore>,
        cooldowns: Arc<XpCooldowns>,
        clock: Arc<dyn Clock>,
        config: &EconomyConfig,
    ) -> Self {
        Self {
            store,
            cooldowns,
            clock,
            xp_per_message: config.xp_per_message,
        }
    }

    /// Process one qualifying message. Returns a level-up notification when
    /// the grant pushed the participant over a level boundary, `None` when
    /// the cooldown is active or no level changed.
    pub async fn grant_message_xp(
        &self,
        id: &str,
        display_name: &str,
        discriminator: &str,
    ) -> Result<Option<String>, EconError> {
        let now = self.clock.now();
        if !self.cooldowns.check_and_touch(id, now).await {
            return Ok(None);
        }

        let mut profile = self
            .store
            .get_or_create_profile(id, display_name, discriminator, now)?;
        let leveled_up = profile.add_experience(self.xp_per_message);
        let level = profile.level;
        self.store.put_profile(profile)?;

        debug!(
            "granted {} xp to {} (level {})",
            self.xp_per_message,
            escape_log(id),
            level
        );

        if leveled_up {
            info!("{} leveled up to {}", escape_log(id), level);
            Ok(Some(format!(
                "Congratulations, {}! You've leveled up to level {}!",
                display_name, level
            )))
        } else {
            Ok(None)
        }
    }
}
