//! Command parsing and routing for the economy front end.
//!
//! The dispatcher is the single entry point for participant input. It owns
//! the per-participant lock registry, so every mutating operation below it
//! runs serialized for its participant (and for both participants during a
//! transfer). Every command runs inside a per-command error boundary: an
//! `EconError` becomes a friendly response line, never a crash.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use tokio::time::timeout;

use crate::config::EconomyConfig;
use crate::econ::errors::EconError;
use crate::econ::leaderboard::{format_chatters, format_richest, Leaderboard};
use crate::econ::locks::LockRegistry;
use crate::econ::progression::ProgressionEngine;
use crate::econ::rewards::{
    DailyResult, GatherResult, Recipient, RewardEngine, SellAmount,
};
use crate::econ::storage::ProfileStore;
use crate::econ::types::{GatherKind, ItemKind};
use crate::logutil::escape_log;

/// One participant utterance, already split from transport framing.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    pub participant_id: String,
    pub display_name: String,
    pub discriminator: String,
    /// Originating community context, when the transport has one. Carried
    /// for logging; the economy state itself is context-global.
    pub guild_context: Option<String>,
    /// Command verb with the prefix already stripped, e.g. `donate`. Empty
    /// for non-command messages.
    pub action: String,
    /// Whitespace-split argument tokens following the verb.
    pub args: Vec<String>,
}

/// Parsed command verbs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Daily,
    Gather(GatherKind),
    Donate { amount_raw: String, target_raw: Option<String> },
    Sell { item_raw: String, amount_raw: Option<String> },
    Bag,
    Prices,
    Balance,
    Level,
    Chatters,
    Richest,
    Help,
    Unknown(String),
}

impl Action {
    /// Map a verb and its argument tokens to an action. Verbs are
    /// case-insensitive; argument validation happens at execution time so
    /// usage errors come back as messages, not parse failures.
    pub fn parse(action: &str, args: &[String]) -> Self {
        match action.to_ascii_lowercase().as_str() {
            "daily" => Action::Daily,
            "mine" => Action::Gather(GatherKind::Mine),
            "chop" => Action::Gather(GatherKind::Chop),
            "fish" => Action::Gather(GatherKind::Fish),
            "donate" => Action::Donate {
                amount_raw: args.first().cloned().unwrap_or_default(),
                target_raw: args.get(1).cloned(),
            },
            "sell" => Action::Sell {
                item_raw: args.first().cloned().unwrap_or_default(),
                amount_raw: args.get(1).cloned(),
            },
            "bag" | "inventory" => Action::Bag,
            "prices" | "shop" => Action::Prices,
            "bal" | "balance" => Action::Balance,
            "level" => Action::Level,
            "leaderboard" | "lb" => Action::Chatters,
            "rich" | "baltop" => Action::Richest,
            "help" => Action::Help,
            other => Action::Unknown(other.to_string()),
        }
    }
}

/// Dispatcher output. `Summary` is the structured multi-field form used by
/// `prices` and `help`; transports render it as an embed or a titled block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Text(String),
    Summary {
        title: String,
        fields: Vec<(String, String)>,
    },
}

pub struct Dispatcher {
    progression: ProgressionEngine,
    rewards: RewardEngine,
    leaderboard: Leaderboard,
    locks: LockRegistry,
    op_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        store: Arc<ProfileStore>,
        progression: ProgressionEngine,
        rewards: RewardEngine,
        config: &EconomyConfig,
    ) -> Self {
        Self {
            progression,
            rewards,
            leaderboard: Leaderboard::new(store),
            locks: LockRegistry::new(),
            op_timeout: Duration::from_secs(config.op_timeout_secs),
        }
    }

    /// Passive-XP path for every non-command message. Returns the level-up
    /// notice when one fired.
    pub async fn handle_message(&self, inv: &CommandInvocation) -> Option<String> {
        let _guard = self.locks.lock(&inv.participant_id).await;
        let result = timeout(
            self.op_timeout,
            self.progression.grant_message_xp(
                &inv.participant_id,
                &inv.display_name,
                &inv.discriminator,
            ),
        )
        .await
        .map_err(|_| EconError::Timeout);
        match result {
            Ok(Ok(notice)) => notice,
            Ok(Err(e)) | Err(e) => {
                error!(
                    "message xp grant failed for {}: {}",
                    escape_log(&inv.participant_id),
                    e
                );
                None
            }
        }
    }

    /// Route one command. Always produces a response; errors are converted
    /// at this boundary.
    pub async fn handle(&self, inv: &CommandInvocation) -> Response {
        let action = Action::parse(&inv.action, &inv.args);
        debug!(
            "dispatch {:?} for {} (ctx {})",
            action,
            escape_log(&inv.participant_id),
            escape_log(inv.guild_context.as_deref().unwrap_or("-"))
        );
        match self.run(inv, &action).await {
            Ok(response) => response,
            Err(e) => Response::Text(friendly_error(&e)),
        }
    }

    async fn run(
        &self,
        inv: &CommandInvocation,
        action: &Action,
    ) -> Result<Response, EconError> {
        match action {
            Action::Daily => self.daily(inv).await,
            Action::Gather(kind) => self.gather(inv, *kind).await,
            Action::Donate {
                amount_raw,
                target_raw,
            } => self.donate(inv, amount_raw, target_raw.as_deref()).await,
            Action::Sell {
                item_raw,
                amount_raw,
            } => self.sell(inv, item_raw, amount_raw.as_deref()).await,
            Action::Bag => self.bag(inv).await,
            Action::Prices => Ok(self.prices()),
            Action::Balance => {
                let coins = self.rewards.balance(&inv.participant_id).await?;
                Ok(Response::Text(format!("You have {} coins.", coins)))
            }
            Action::Level => {
                let level = self.rewards.level(&inv.participant_id).await?;
                Ok(Response::Text(format!("You are level {}.", level)))
            }
            Action::Chatters => {
                let entries = self.leaderboard.top_chatters()?;
                Ok(Response::Summary {
                    title: "Top Chatters".to_string(),
                    fields: vec![("Leaderboard".to_string(), format_chatters(&entries))],
                })
            }
            Action::Richest => {
                let entries = self.leaderboard.richest()?;
                Ok(Response::Summary {
                    title: "Richest Members".to_string(),
                    fields: vec![("Leaderboard".to_string(), format_richest(&entries))],
                })
            }
            Action::Help => Ok(self.help()),
            Action::Unknown(verb) => Ok(Response::Text(format!(
                "Unknown command `{}`. Try `help` for the list of commands.",
                verb
            ))),
        }
    }

    async fn daily(&self, inv: &CommandInvocation) -> Result<Response, EconError> {
        let _guard = self.locks.lock(&inv.participant_id).await;
        let result = timeout(
            self.op_timeout,
            self.rewards.claim_daily(&inv.participant_id),
        )
        .await
        .map_err(|_| EconError::Timeout)??;

        Ok(Response::Text(match result {
            DailyResult::CoolingDown { hours, minutes } => format!(
                "You already claimed your daily reward. Come back in {}h {}m.",
                hours, minutes
            ),
            DailyResult::Claimed { coins, xp } => format!(
                "You claimed your daily reward: {} coins and {} XP!",
                coins, xp
            ),
        }))
    }

    async fn gather(
        &self,
        inv: &CommandInvocation,
        kind: GatherKind,
    ) -> Result<Response, EconError> {
        let _guard = self.locks.lock(&inv.participant_id).await;
        let result = timeout(
            self.op_timeout,
            self.rewards.gather(
                kind,
                &inv.participant_id,
                &inv.display_name,
                &inv.discriminator,
            ),
        )
        .await
        .map_err(|_| EconError::Timeout)??;

        Ok(Response::Text(match result {
            GatherResult::CoolingDown { remaining_secs } => format!(
                "You need to wait {:.1} more seconds before you can {} again.",
                remaining_secs,
                kind.verb()
            ),
            GatherResult::Gathered {
                kind,
                yield_amount,
                xp,
                bonus,
            } => {
                let mut line = match kind {
                    GatherKind::Mine => format!(
                        "You mined and received {} coins! (+{} XP)",
                        yield_amount, xp
                    ),
                    GatherKind::Chop => format!(
                        "You chopped and received {} wood! (+{} XP)",
                        yield_amount, xp
                    ),
                    GatherKind::Fish => format!(
                        "You fished and caught {} fish! (+{} XP)",
                        yield_amount, xp
                    ),
                };
                if let Some((item, quantity)) = bonus {
                    line.push_str(&format!(" You also found {} {}!", quantity, item.key()));
                }
                line
            }
        }))
    }

    async fn donate(
        &self,
        inv: &CommandInvocation,
        amount_raw: &str,
        target_raw: Option<&str>,
    ) -> Result<Response, EconError> {
        let usage =
            "Please provide a valid amount and a user to donate coins to, e.g. `donate 10 @user`.";
        let amount: u64 = amount_raw
            .parse()
            .map_err(|_| EconError::InvalidArgument(usage.to_string()))?;
        let target_id = match target_raw {
            Some(raw) => parse_mention(raw),
            None => return Err(EconError::InvalidArgument(usage.to_string())),
        };
        // Checked before lock_pair, which requires distinct participants.
        if target_id == inv.participant_id {
            return Err(EconError::InvalidArgument(
                "You cannot donate coins to yourself.".to_string(),
            ));
        }
        // The recipient may have no profile yet; seed it with placeholder
        // presentation fields until they speak for themselves.
        let target = Recipient {
            id: target_id.clone(),
            display_name: target_id.clone(),
            discriminator: "0000".to_string(),
        };

        let _guards = self
            .locks
            .lock_pair(&inv.participant_id, &target_id)
            .await;
        timeout(
            self.op_timeout,
            self.rewards.donate(&inv.participant_id, &target, amount),
        )
        .await
        .map_err(|_| EconError::Timeout)??;

        Ok(Response::Text(format!(
            "You donated {} coins to {}.",
            amount, target_id
        )))
    }

    async fn sell(
        &self,
        inv: &CommandInvocation,
        item_raw: &str,
        amount_raw: Option<&str>,
    ) -> Result<Response, EconError> {
        let item = ItemKind::parse(item_raw).ok_or_else(|| {
            EconError::InvalidArgument(format!(
                "`{}` is not something you can sell. Sellable items: {}.",
                item_raw,
                ItemKind::ALL
                    .iter()
                    .map(|k| k.key())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;
        let amount = match amount_raw {
            // An omitted amount reads as the full holding.
            None | Some("all") => SellAmount::All,
            Some(raw) => SellAmount::Count(raw.parse().map_err(|_| {
                EconError::InvalidArgument(format!(
                    "Please provide a valid amount of {} to sell.",
                    item.key()
                ))
            })?),
        };

        let _guard = self.locks.lock(&inv.participant_id).await;
        let receipt = timeout(
            self.op_timeout,
            self.rewards.sell(&inv.participant_id, item, amount),
        )
        .await
        .map_err(|_| EconError::Timeout)??;

        Ok(Response::Text(format!(
            "You sold {} {} for {} coins!",
            receipt.quantity,
            receipt.item.key(),
            receipt.earned
        )))
    }

    async fn bag(&self, inv: &CommandInvocation) -> Result<Response, EconError> {
        let slots = self.rewards.inventory(&inv.participant_id).await?;
        if slots.is_empty() {
            return Ok(Response::Text("Your bag is empty.".to_string()));
        }
        let fields = slots
            .into_iter()
            .map(|(item, held)| (item.label().to_string(), held.to_string()))
            .collect();
        Ok(Response::Summary {
            title: format!("{}'s bag", inv.display_name),
            fields,
        })
    }

    fn prices(&self) -> Response {
        let fields = ItemKind::ALL
            .iter()
            .map(|&item| {
                (
                    item.label().to_string(),
                    format!("{} coins", self.rewards.unit_price(item)),
                )
            })
            .collect();
        Response::Summary {
            title: "Item Prices".to_string(),
            fields,
        }
    }

    fn help(&self) -> Response {
        Response::Summary {
            title: "Economy Commands".to_string(),
            fields: vec![
                (
                    "Earning".to_string(),
                    "daily, mine, chop, fish (plus XP for chatting)".to_string(),
                ),
                (
                    "Trading".to_string(),
                    "donate <amount> <user>, sell <item> [amount|all], prices".to_string(),
                ),
                (
                    "Status".to_string(),
                    "bal, level, bag, leaderboard, rich".to_string(),
                ),
            ],
        }
    }
}

/// Strip chat-platform mention framing (`<@123>`, `<@!123>`, `@name`) down
/// to the bare participant id.
fn parse_mention(raw: &str) -> String {
    raw.trim_start_matches("<@!")
        .trim_start_matches("<@")
        .trim_start_matches('@')
        .trim_end_matches('>')
        .to_string()
}

fn friendly_error(e: &EconError) -> String {
    match e {
        EconError::NotFound(_) => "You have not sent any messages yet.".to_string(),
        EconError::InsufficientFunds => {
            "You do not have enough coins to donate.".to_string()
        }
        EconError::InsufficientInventory { item, .. } => {
            format!("You do not have any {} to sell.", item.key())
        }
        EconError::InvalidArgument(msg) => msg.clone(),
        other if other.is_retryable() => {
            error!("command failed: {}", other);
            "Something went wrong. Please try again later.".to_string()
        }
        other => {
            error!("command failed: {}", other);
            "Something went wrong.".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_aliases() {
        assert_eq!(Action::parse("Mine", &[]), Action::Gather(GatherKind::Mine));
        assert_eq!(Action::parse("lb", &[]), Action::Chatters);
        assert_eq!(Action::parse("baltop", &[]), Action::Richest);
        assert_eq!(Action::parse("inventory", &[]), Action::Bag);
        assert!(matches!(
            Action::parse("frobnicate", &[]),
            Action::Unknown(_)
        ));
    }

    #[test]
    fn parse_donate_keeps_raw_arguments() {
        let args = vec!["10".to_string(), "<@991>".to_string()];
        assert_eq!(
            Action::parse("donate", &args),
            Action::Donate {
                amount_raw: "10".to_string(),
                target_raw: Some("<@991>".to_string()),
            }
        );
    }

    #[test]
    fn mention_framing_is_stripped() {
        assert_eq!(parse_mention("<@991>"), "991");
        assert_eq!(parse_mention("<@!991>"), "991");
        assert_eq!(parse_mention("@bob"), "bob");
        assert_eq!(parse_mention("991"), "991");
    }

    #[test]
    fn friendly_error_passes_usage_text_through() {
        let msg = friendly_error(&EconError::InvalidArgument("try again".to_string()));
        assert_eq!(msg, "try again");
        assert_eq!(
            friendly_error(&EconError::NotFound("42".to_string())),
            "You have not sent any messages yet."
        );
    }
}
