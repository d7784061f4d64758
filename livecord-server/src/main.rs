use std::path::PathBuf;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use livecord_common::models::platform::StreamPlatform;
use livecord_core::config::DEFAULT_CONFIG_PATH;

mod admin;
mod context;
mod server;

use context::{DiscordMode, ServerContext};

#[derive(Parser, Debug, Clone)]
#[command(name = "livecord")]
#[command(author, version, about = "livecord - stream live notifications and live roles for Discord")]
pub struct Args {
    /// Path to the JSON config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Overrides `data_dir` from config and LIVECORD_DATA_DIR
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Connect to Discord and poll until Ctrl-C (default)
    Run,
    /// Manage tracked streamers
    Stream {
        #[command(subcommand)]
        action: StreamCommand,
    },
    /// Manage per-guild presence rules
    Presence {
        #[command(subcommand)]
        action: PresenceCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum StreamCommand {
    Add {
        guild: String,
        platform: StreamPlatform,
        external_id: String,
        /// Channel that receives the announcement
        channel: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        vod_message: Option<String>,
        /// Discord member bound to this stream (required for presence platforms)
        #[arg(long)]
        user: Option<String>,
        #[arg(long = "live-role", value_delimiter = ',')]
        live_roles: Vec<String>,
        #[arg(long = "whitelist-role", value_delimiter = ',')]
        whitelist_roles: Vec<String>,
    },
    Remove {
        guild: String,
        platform: StreamPlatform,
        external_id: String,
    },
    /// Change selected fields; pass an empty string to clear --vod-message or --user
    Edit {
        guild: String,
        platform: StreamPlatform,
        external_id: String,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        vod_message: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long = "live-role", value_delimiter = ',', num_args = 0..)]
        live_roles: Option<Vec<String>>,
        #[arg(long = "whitelist-role", value_delimiter = ',', num_args = 0..)]
        whitelist_roles: Option<Vec<String>>,
    },
    List {
        guild: String,
    },
    /// Post a sample announcement without touching live state
    Test {
        guild: String,
        platform: StreamPlatform,
        external_id: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PresenceCommand {
    Set {
        guild: String,
        platform: StreamPlatform,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long = "live-role", value_delimiter = ',')]
        live_roles: Vec<String>,
        #[arg(long = "whitelist-role", value_delimiter = ',')]
        whitelist_roles: Vec<String>,
    },
    Remove {
        guild: String,
        platform: StreamPlatform,
    },
    Show {
        guild: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("livecord_core=info".parse().unwrap_or_default())
        .add_directive("livecord_server=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let command = args.command.clone().unwrap_or(Command::Run);
    match command {
        Command::Run => {
            info!("livecord starting (config={})", args.config.display());
            let ctx = ServerContext::new(&args, DiscordMode::Gateway).await?;
            if let Err(e) = server::run_server(ctx).await {
                error!("Server error: {:?}", e);
                return Err(e.into());
            }
        }
        Command::Stream { action } => {
            let mode = match action {
                StreamCommand::Test { .. } => DiscordMode::RestOnly,
                StreamCommand::Remove { .. } => DiscordMode::RestIfConfigured,
                _ => DiscordMode::Offline,
            };
            let ctx = ServerContext::new(&args, mode).await?;
            admin::run_stream_command(&ctx, action).await?;
        }
        Command::Presence { action } => {
            let mode = match action {
                PresenceCommand::Remove { .. } => DiscordMode::RestIfConfigured,
                _ => DiscordMode::Offline,
            };
            let ctx = ServerContext::new(&args, mode).await?;
            admin::run_presence_command(&ctx, action).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stream_add_with_role_lists() {
        let args = Args::try_parse_from([
            "livecord", "stream", "add", "1", "yt", "@chan", "100",
            "--live-role", "7,8", "--user", "42",
        ])
        .unwrap();
        let Some(Command::Stream { action: StreamCommand::Add { platform, live_roles, user, .. } }) = args.command
        else {
            panic!("expected stream add");
        };
        assert_eq!(platform, StreamPlatform::YouTube);
        assert_eq!(live_roles, vec!["7", "8"]);
        assert_eq!(user.as_deref(), Some("42"));
    }

    #[test]
    fn unknown_platform_is_rejected() {
        assert!(Args::try_parse_from(["livecord", "stream", "list", "1"]).is_ok());
        assert!(Args::try_parse_from(["livecord", "stream", "remove", "1", "myspace", "x"]).is_err());
    }
}
