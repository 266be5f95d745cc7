//! Chat economy core: profiles, progression, rewards, and dispatch.
//!
//! The module is layered bottom-up:
//!
//! * [`types`] - persisted records, item/action vocabularies, the level curve
//! * [`errors`] - the [`EconError`] taxonomy shared by every layer
//! * [`storage`] - sled-backed profile and activity trees
//! * [`clock`] / [`locks`] - injectable time source and the per-participant
//!   lock registry
//! * [`progression`] / [`rewards`] / [`leaderboard`] - the three engines
//! * [`dispatch`] - command parsing, routing, and the error boundary
//!
//! Transports construct a [`dispatch::Dispatcher`] and feed it
//! [`dispatch::CommandInvocation`]s; everything else stays internal to the
//! engines.

pub mod clock;
pub mod dispatch;
pub mod errors;
pub mod leaderboard;
pub mod locks;
pub mod progression;
pub mod rewards;
pub mod storage;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{Action, CommandInvocation, Dispatcher, Response};
pub use errors::EconError;
pub use leaderboard::{Leaderboard, LEADERBOARD_LIMIT};
pub use locks::LockRegistry;
pub use progression::{ProgressionEngine, XpCooldowns};
pub use rewards::{
    DailyResult, GatherResult, Recipient, RewardEngine, SellAmount, SellReceipt,
};
pub use storage::{ProfileStore, ProfileStoreBuilder};
pub use types::{
    level_for_experience, ActivityState, GatherKind, ItemKind, UserProfile,
};
