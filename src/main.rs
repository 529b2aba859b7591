//! Chatai - location-aware chat assistant client
//!
#![doc = "Chatai - location-aware chat assistant client"]
#![doc = "Main entry point for the chatai command-line application."]

use anyhow::Result;
use colored::Colorize;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatai::cli::{Cli, Commands};
use chatai::commands::{self, AppContext};
use chatai::config::Config;
use chatai::error::is_auth_failure;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let ctx = AppContext::new(config)?;
    let result = run(&ctx, cli.command).await;

    if let Err(e) = &result {
        if is_auth_failure(e) {
            // The stored credential is no longer accepted
            ctx.session.clear();
            eprintln!("{}", "Please sign in with `chatai login`.".red());
        }
    }
    result
}

async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email } => {
            tracing::info!("Starting login");
            commands::auth::login(ctx, email).await
        }
        Commands::Register { name, email } => {
            tracing::info!("Starting registration");
            commands::auth::register(ctx, name, email).await
        }
        Commands::Logout => {
            commands::auth::logout(ctx);
            Ok(())
        }
        Commands::Whoami => commands::auth::whoami(ctx).await,
        Commands::Chat { resume } => {
            if let Some(id) = &resume {
                tracing::debug!("Resuming chat: {}", id);
            }
            commands::chat::run_chat(ctx, resume).await
        }
        Commands::Chats { command } => commands::chats::handle_chats(ctx, command).await,
        Commands::Settings { command } => commands::account::handle_settings(ctx, command).await,
        Commands::Profile { command } => commands::account::handle_profile(ctx, command).await,
        Commands::Password => commands::account::change_password(ctx).await,
        Commands::Location { command } => commands::account::handle_location(ctx, command).await,
        Commands::Account { command } => commands::account::handle_account(ctx, command).await,
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "chatai=debug" } else { "chatai=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
