//! Binary entrypoint for the autoecon CLI.
//!
//! Commands:
//! - `run` - start the console front end, reading participant lines on stdin
//! - `init` - create a starter `config.toml`
//! - `status` - print store statistics and the current leaderboards
//!
//! See the library crate docs for module-level details: `autoecon::`.
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use autoecon::config::Config;
use autoecon::econ::leaderboard::{format_chatters, format_richest, Leaderboard};
use autoecon::econ::{
    CommandInvocation, Dispatcher, ProfileStore, ProfileStoreBuilder, ProgressionEngine,
    Response, RewardEngine, SystemClock, XpCooldowns,
};

#[derive(Parser)]
#[command(name = "autoecon")]
#[command(about = "A progression and economy backend for chat communities")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the console front end (stdin lines: `<participant> <message>`)
    Run,
    /// Initialize a new configuration file
    Init,
    /// Show store statistics and leaderboards
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config it would otherwise load.
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Run => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            info!("Starting autoecon v{}", env!("CARGO_PKG_VERSION"));
            let store = open_store(&config)?;
            let dispatcher = build_dispatcher(store, &config);
            run_console(&dispatcher, &config).await?;
        }
        Commands::Init => {
            info!("Initializing new configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let store = open_store(&config)?;
            println!("Profiles: {}", store.profile_count());
            let board = Leaderboard::new(store);
            let chatters = board.top_chatters()?;
            if !chatters.is_empty() {
                println!("Top chatters:\n{}", format_chatters(&chatters));
                println!("Richest:\n{}", format_richest(&board.richest()?));
            }
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Result<Arc<ProfileStore>> {
    Ok(Arc::new(
        ProfileStoreBuilder::new(&config.storage.data_dir).open()?,
    ))
}

fn build_dispatcher(store: Arc<ProfileStore>, config: &Config) -> Dispatcher {
    let clock = Arc::new(SystemClock);
    let cooldowns = Arc::new(XpCooldowns::new(config.economy.xp_cooldown_secs));
    let progression =
        ProgressionEngine::new(store.clone(), cooldowns, clock.clone(), &config.economy);
    let rewards = RewardEngine::new(store.clone(), clock, config.economy.clone());
    Dispatcher::new(store, progression, rewards, &config.economy)
}

/// Console transport: each stdin line is `<participant> <message...>`, where
/// `<participant>` is `id`, `id:name`, or `id:name#discriminator`. Messages
/// beginning with the configured prefix are commands; everything else earns
/// passive XP.
async fn run_console(dispatcher: &Dispatcher, config: &Config) -> Result<()> {
    let prefix = format!("{} ", config.bot.command_prefix);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!(
        "Console ready; command prefix is `{}`",
        config.bot.command_prefix
    );

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (participant, text) = match line.split_once(char::is_whitespace) {
            Some((p, t)) => (p, t.trim()),
            None => {
                warn!("ignoring line with no message body");
                continue;
            }
        };
        let (id, display_name, discriminator) = parse_participant(participant);
        let mut tokens = text
            .strip_prefix(&prefix)
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string);
        let inv = CommandInvocation {
            participant_id: id,
            display_name,
            discriminator,
            guild_context: None,
            action: tokens.next().unwrap_or_default(),
            args: tokens.collect(),
        };

        if text.starts_with(&prefix) {
            render(&dispatcher.handle(&inv).await);
        } else if let Some(notice) = dispatcher.handle_message(&inv).await {
            println!("{}", notice);
        }
    }
    Ok(())
}

fn parse_participant(token: &str) -> (String, String, String) {
    let (id, rest) = match token.split_once(':') {
        Some((id, rest)) => (id, rest),
        None => (token, token),
    };
    let (name, disc) = match rest.split_once('#') {
        Some((name, disc)) => (name, disc),
        None => (rest, "0000"),
    };
    (id.to_string(), name.to_string(), disc.to_string())
}

fn render(response: &Response) {
    match response {
        Response::Text(text) => println!("{}", text),
        Response::Summary { title, fields } => {
            println!("== {} ==", title);
            for (name, value) in fields {
                println!("{}: {}", name, value);
            }
        }
    }
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config.as_ref().and_then(|c| c.logging.file.clone());
    if let Some(path) = file {
        if let Ok(f) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Foreground runs echo to the console as well; under a service
            // manager stdout is not a TTY and the file gets everything.
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        } else {
            builder.format(|fmt, record| {
                writeln!(
                    fmt,
                    "{} [{}] {}",
                    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                    record.level(),
                    record.args()
                )
            });
        }
    } else {
        builder.format(|fmt, record| {
            writeln!(
                fmt,
                "{} [{}] {}",
                chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ"),
                record.level(),
                record.args()
            )
        });
    }
    let _ = builder.try_init();
}
