/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `auth`     Login, registration, logout, and account info
- `chat`     Interactive chat mode
- `chats`    Non-interactive chat list management
- `account`  Settings, profile, password, location, export, deletion

Every handler works on an [`AppContext`] that wires the HTTP client, the
keyring-backed session, and console notices together.
*/

use crate::api::{AuthToken, HttpApiClient, User};
use crate::chat::ChatSessionManager;
use crate::config::Config;
use crate::error::{ChataiError, Result};
use crate::location::{LocationService, OpenCageGeocoder, PositionSource};
use crate::notify::{Confirmer, ConsoleNotifier, Notifier};
use crate::session::{KeyringCredentialStore, Session};
use crate::settings::{AccountService, SettingsManager};
use rustyline::DefaultEditor;
use std::sync::Arc;

// Special commands parser for the chat REPL
pub mod special_commands;

// Table and message rendering
pub mod render;

// Chat list management commands
pub mod chats;

// Settings, profile, location, and account commands
pub mod account;

/// Read one line from the terminal
///
/// Returns `None` on Ctrl-C, Ctrl-D, or a terminal error.
pub fn prompt_line(label: &str) -> Option<String> {
    let mut rl = DefaultEditor::new().ok()?;
    rl.readline(label).ok().map(|line| line.trim().to_string())
}

/// Read a required value, prompting when it was not given on the command line
pub fn prompt_required(given: Option<String>, label: &str) -> Result<String> {
    let value = match given {
        Some(value) => value,
        None => prompt_line(label).unwrap_or_default(),
    };
    if value.trim().is_empty() {
        return Err(ChataiError::Validation(format!(
            "{} is required",
            label.trim_end_matches(|c: char| c == ':' || c.is_whitespace())
        ))
        .into());
    }
    Ok(value.trim().to_string())
}

/// Confirmation prompts on the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleConfirmer;

impl Confirmer for ConsoleConfirmer {
    fn confirm(&self, question: &str) -> bool {
        prompt_line(&format!("{} [y/N]: ", question))
            .is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    fn ask(&self, question: &str) -> Option<String> {
        prompt_line(&format!("{} ", question))
    }
}

/// Confirmer that agrees without asking, for `--yes` flags
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _question: &str) -> bool {
        true
    }

    fn ask(&self, _question: &str) -> Option<String> {
        None
    }
}

/// Everything a command handler needs
pub struct AppContext {
    pub config: Config,
    pub api: Arc<HttpApiClient>,
    pub session: Session,
    pub notifier: Arc<dyn Notifier>,
    pub confirmer: Arc<dyn Confirmer>,
}

impl AppContext {
    /// Wire up the HTTP client, keyring session, and console I/O
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: Config) -> Result<Self> {
        let token = AuthToken::new();
        let api = Arc::new(HttpApiClient::new(&config.api, token.clone())?);
        let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
        let session = Session::new(
            api.clone(),
            Arc::new(KeyringCredentialStore::new(&config.session)),
            token,
            notifier.clone(),
            &config.session,
        );

        Ok(Self {
            config,
            api,
            session,
            notifier,
            confirmer: Arc::new(ConsoleConfirmer),
        })
    }

    /// Restore the stored session or fail with a hint to log in
    pub async fn require_session(&self) -> Result<User> {
        match self.session.init().await? {
            Some(user) => Ok(user),
            None => Err(ChataiError::Authentication(
                "Not logged in. Run `chatai login` first.".to_string(),
            )
            .into()),
        }
    }

    pub fn chat_manager(&self) -> ChatSessionManager {
        ChatSessionManager::new(self.api.clone(), self.notifier.clone())
            .with_title_max_chars(self.config.chat.title_max_chars)
    }

    pub fn settings_manager(&self) -> SettingsManager {
        SettingsManager::new(self.api.clone(), self.notifier.clone())
    }

    pub fn account_service(&self) -> AccountService {
        AccountService::new(self.api.clone(), self.notifier.clone())
    }

    /// Location service reading positions from `source`
    ///
    /// # Errors
    ///
    /// Returns error if the geocoder's HTTP client cannot be built
    pub fn location_service(&self, source: Arc<dyn PositionSource>) -> Result<LocationService> {
        let service = LocationService::new(
            self.api.clone(),
            source,
            self.notifier.clone(),
            &self.config.location,
        );
        Ok(match OpenCageGeocoder::from_config(&self.config.location)? {
            Some(geocoder) => service.with_geocoder(Arc::new(geocoder)),
            None => service,
        })
    }
}

// Authentication command handlers
pub mod auth {
    //! Login, registration, and account info

    use super::*;
    use colored::Colorize;

    /// Sign in, prompting for missing fields
    pub async fn login(ctx: &AppContext, email: Option<String>) -> Result<()> {
        let email = prompt_required(email, "Email: ")?;
        let password = prompt_required(None, "Password: ")?;

        let user = ctx.session.login(&email, &password).await?;
        println!("Signed in as {} <{}>", user.name.bold(), user.email);
        Ok(())
    }

    /// Create an account, prompting for missing fields
    pub async fn register(
        ctx: &AppContext,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<()> {
        let name = prompt_required(name, "Name: ")?;
        let email = prompt_required(email, "Email: ")?;
        let password = prompt_required(None, "Password: ")?;
        let confirm = prompt_required(None, "Confirm password: ")?;
        if password != confirm {
            ctx.notifier.error("Passwords do not match");
            return Err(ChataiError::Validation("Passwords do not match".to_string()).into());
        }

        let user = ctx.session.register(&name, &email, &password).await?;
        println!("Welcome, {}!", user.name.bold());
        Ok(())
    }

    /// Sign out
    pub fn logout(ctx: &AppContext) {
        ctx.session.logout();
    }

    /// Print the signed-in account
    pub async fn whoami(ctx: &AppContext) -> Result<()> {
        let user = ctx.require_session().await?;
        println!("{} <{}>", user.name.bold(), user.email);
        println!("ID:       {}", user.id);
        println!("Language: {}", user.preferred_language);
        if let Some(location) = &user.location {
            let label = location
                .address
                .clone()
                .unwrap_or_else(|| format!("{}, {}", location.latitude, location.longitude));
            println!("Location: {}", label);
        }
        println!("API:      {}", ctx.api.base_url().dimmed());
        Ok(())
    }
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Restores the session, loads the chat list, and runs a readline loop
    //! that sends plain input to the assistant and dispatches `/` commands.

    use super::render::{print_chat, print_chat_list, print_message};
    use super::special_commands::{parse_special_command, print_help, SpecialCommand};
    use super::*;
    use crate::chat::SendOutcome;
    use crate::error::is_auth_failure;
    use crate::location::{FixedPositionSource, UnavailablePositionSource};
    use colored::Colorize;
    use rustyline::error::ReadlineError;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `ctx` - Application context
    /// * `resume` - Optional chat ID to open first
    pub async fn run_chat(ctx: &AppContext, resume: Option<String>) -> Result<()> {
        let user = ctx.require_session().await?;
        tracing::info!(user_id = %user.id, "Starting interactive chat mode");

        let manager = ctx.chat_manager();
        if let Err(e) = manager.refresh_chats().await {
            if is_auth_failure(&e) {
                return Err(e);
            }
        }

        let mut location = ctx.location_service(Arc::new(UnavailablePositionSource::new(
            "no coordinates supplied",
        )))?;
        if ctx.settings_manager().load().await.location_sharing {
            if let Err(e) = location.load_user_location().await {
                tracing::debug!("No saved location: {}", e);
            }
        }

        if let Some(id) = resume {
            manager.select_chat(&id).await?;
            if let Some(chat) = manager.active_chat() {
                print_chat(&chat);
            }
        }

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner(&user);

        loop {
            let prompt = match manager.active_chat() {
                Some(chat) => format!("[{}] > ", chat.title),
                None => "[new chat] > ".to_string(),
            };

            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = rl.add_history_entry(trimmed);

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}", e.to_string().red());
                            continue;
                        }
                    };

                    let result = match command {
                        SpecialCommand::Exit => break,
                        SpecialCommand::Help => {
                            print_help();
                            Ok(())
                        }
                        SpecialCommand::NewChat => {
                            manager.start_new_chat();
                            println!("{}", "Your next message starts a new chat.".cyan());
                            Ok(())
                        }
                        SpecialCommand::ListChats => {
                            print_chat_list(&manager.chats(), manager.active_chat_id().as_deref());
                            Ok(())
                        }
                        SpecialCommand::Search(query) => {
                            print_chat_list(
                                &manager.search(&query),
                                manager.active_chat_id().as_deref(),
                            );
                            Ok(())
                        }
                        SpecialCommand::Open(id) => open_chat(&manager, &id).await,
                        SpecialCommand::Find(query) => match manager.find(&query) {
                            Some(chat) => open_chat(&manager, &chat.id).await,
                            None => {
                                println!("{}", format!("No chat matches \"{}\"", query).yellow());
                                Ok(())
                            }
                        },
                        SpecialCommand::Rename { id, title } => {
                            rename_chat(&manager, &mut rl, &id, title).await
                        }
                        SpecialCommand::Delete(id) => manager
                            .delete_chat(&id, ctx.confirmer.as_ref())
                            .await
                            .map(|_| ()),
                        SpecialCommand::ShowLocation => {
                            match location.current() {
                                Some(loc) => println!("Location: {}", loc.display_label()),
                                None => println!("{}", "Location is off.".yellow()),
                            }
                            Ok(())
                        }
                        SpecialCommand::SetLocation {
                            latitude,
                            longitude,
                        } => {
                            location = ctx.location_service(Arc::new(
                                FixedPositionSource::new(latitude, longitude),
                            ))?;
                            location.request_location().await.map(|_| ())
                        }
                        SpecialCommand::ClearLocation => location.clear_location().await,
                        SpecialCommand::None => send(&manager, trimmed, location.current()).await,
                    };

                    if let Err(e) = result {
                        if is_auth_failure(&e) {
                            return Err(e);
                        }
                        tracing::debug!("Command failed: {}", e);
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    async fn open_chat(manager: &ChatSessionManager, id: &str) -> Result<()> {
        manager.select_chat(id).await?;
        if let Some(chat) = manager.active_chat() {
            print_chat(&chat);
        }
        Ok(())
    }

    /// Open the title editor and save it, prompting when no title was typed
    async fn rename_chat(
        manager: &ChatSessionManager,
        rl: &mut DefaultEditor,
        id: &str,
        title: Option<String>,
    ) -> Result<()> {
        let draft = manager.begin_rename(id)?;
        let input = match title {
            Some(title) => Some(title),
            None => {
                println!("Current title: {}", draft.title.cyan());
                rl.readline("New title (blank to cancel): ").ok()
            }
        };
        if !super::chats::finish_rename(manager, input.as_deref()).await? {
            println!("{}", "Rename cancelled.".yellow());
        }
        Ok(())
    }

    async fn send(
        manager: &ChatSessionManager,
        text: &str,
        location: Option<crate::api::Location>,
    ) -> Result<()> {
        println!("{}", "Thinking...".dimmed());
        match manager.send_message(text, location).await? {
            SendOutcome::Sent { reply, .. } => {
                println!();
                print_message(&reply);
            }
            SendOutcome::SkippedInFlight => {
                println!("{}", "Still waiting for the previous reply.".yellow());
            }
            SendOutcome::SkippedEmpty => {}
        }
        Ok(())
    }

    /// Display welcome banner at the start of interactive chat mode
    fn print_welcome_banner(user: &User) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║            Chatai Interactive Chat - Welcome!                ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Signed in as {}", user.name.bold());
        println!("Type '/help' for available commands, 'exit' to quit\n");
    }
}
