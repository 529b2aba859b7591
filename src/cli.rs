//! Command-line interface definition for Chatai
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for chatting, managing chats, and the account.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chatai - location-aware chat assistant client
///
/// Talk to the assistant, keep a list of conversations, and manage
/// your account from the terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatai")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL from config
    #[arg(long)]
    pub api_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatai
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Create an account and sign in
    Register {
        /// Display name (prompted when omitted)
        #[arg(short, long)]
        name: Option<String>,

        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Sign out and forget the stored credential
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Start an interactive chat
    Chat {
        /// Open an existing chat by ID
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Manage saved chats
    Chats {
        /// Chat management subcommand
        #[command(subcommand)]
        command: ChatsCommand,
    },

    /// View or change preferences
    Settings {
        /// Settings subcommand
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// View or edit the profile
    Profile {
        /// Profile subcommand
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Change the account password
    Password,

    /// Manage the location used for place recommendations
    Location {
        /// Location subcommand
        #[command(subcommand)]
        command: LocationCommand,
    },

    /// Export or delete the account
    Account {
        /// Account subcommand
        #[command(subcommand)]
        command: AccountCommand,
    },
}

/// Chat management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChatsCommand {
    /// List chats, most recently updated first
    List,

    /// List chats whose title or messages contain the query
    Search {
        /// Case-insensitive text to look for
        query: String,
    },

    /// Print a chat's messages
    Show {
        /// Chat ID
        id: String,
    },

    /// Rename a chat
    Rename {
        /// Chat ID
        id: String,

        /// New title
        title: String,
    },

    /// Delete a chat
    Delete {
        /// Chat ID
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print current preferences
    Show,

    /// Change one or more preferences
    Set {
        /// Theme (light, dark, system)
        #[arg(long)]
        theme: Option<String>,

        /// Enable or disable notifications
        #[arg(long)]
        notifications: Option<bool>,

        /// Enable or disable location sharing
        #[arg(long)]
        location_sharing: Option<bool>,

        /// Interface language tag
        #[arg(long)]
        language: Option<String>,

        /// Enable or disable auto-save
        #[arg(long)]
        auto_save: Option<bool>,
    },
}

/// Profile subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Print the profile
    Show,

    /// Update profile fields; omitted fields keep their value
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Preferred language tag
        #[arg(long)]
        language: Option<String>,
    },
}

/// Location subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum LocationCommand {
    /// Print the saved location
    Show,

    /// Enable location from coordinates and save it to the profile
    Set {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,

        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
    },

    /// Remove the saved location
    Clear,
}

/// Account subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AccountCommand {
    /// Download all account data as JSON
    Export {
        /// Directory to write into (defaults to the download directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Permanently delete the account
    Delete,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
