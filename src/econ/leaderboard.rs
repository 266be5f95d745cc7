//! Ranked community views over the profile tree.
//!
//! Both boards scan every profile; the store is small enough that an
//! index would not pay for itself. Ties on the primary key fall back to
//! secondary keys so the ordering is stable run to run.

use std::sync::Arc;

use crate::econ::errors::EconError;
use crate::econ::storage::ProfileStore;
use crate::econ::types::UserProfile;

/// Rows shown per board.
pub const LEADERBOARD_LIMIT: usize = 5;

/// One rendered board row. `experience` rides along so tied-level chatter
/// rows stay distinguishable; the wealth board ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    pub rank: usize,
    pub tag: String,
    pub metric: u64,
    pub experience: u64,
}

pub struct Leaderboard {
    store: Arc<ProfileStore>,
}

impl Leaderboard {
    pub fn new(store: Arc<ProfileStore>) -> Self {
        Self { store }
    }

    /// Top participants by level, experience breaking ties.
    pub fn top_chatters(&self) -> Result<Vec<BoardEntry>, EconError> {
        let mut profiles = self.store.list_profiles()?;
        profiles.sort_by(|a, b| {
            b.level
                .cmp(&a.level)
                .then(b.experience.cmp(&a.experience))
                .then(a.id.cmp(&b.id))
        });
        Ok(rank(&profiles, |p| p.level as u64))
    }

    /// Top participants by coin balance.
    pub fn richest(&self) -> Result<Vec<BoardEntry>, EconError> {
        let mut profiles = self.store.list_profiles()?;
        profiles.sort_by(|a, b| b.coins.cmp(&a.coins).then(a.id.cmp(&b.id)));
        Ok(rank(&profiles, |p| p.coins))
    }
}

fn rank(profiles: &[UserProfile], metric: impl Fn(&UserProfile) -> u64) -> Vec<BoardEntry> {
    profiles
        .iter()
        .take(LEADERBOARD_LIMIT)
        .enumerate()
        .map(|(i, p)| BoardEntry {
            rank: i + 1,
            tag: p.tag(),
            metric: metric(p),
            experience: p.experience,
        })
        .collect()
}

/// Render chatter rows as "rank. name#discriminator - Level N | X XP".
pub fn format_chatters(entries: &[BoardEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "{}. {} - Level {} | {} XP",
                e.rank, e.tag, e.metric, e.experience
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render wealth rows as "rank. name#discriminator - N coins".
pub fn format_richest(entries: &[BoardEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}. {} - {} coins", e.rank, e.tag, e.metric))
        .collect::<Vec<_>>()
        .join("\n")
}
