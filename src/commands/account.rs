//! Settings, profile, password, location, and account commands

use super::{prompt_line, AppContext};
use crate::api::{AppSettings, SettingsPatch, Theme, UserProfile};
use crate::cli::{AccountCommand, LocationCommand, ProfileCommand, SettingsCommand};
use crate::error::{ChataiError, Result};
use crate::location::{FixedPositionSource, UnavailablePositionSource};
use crate::settings::{default_export_dir, PasswordForm};
use colored::Colorize;
use std::sync::Arc;

fn on_off(value: bool) -> &'static str {
    if value {
        "on"
    } else {
        "off"
    }
}

fn print_settings(settings: &AppSettings) {
    let theme = match settings.theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
        Theme::System => "system",
    };
    println!("Theme:            {}", theme);
    println!("Notifications:    {}", on_off(settings.notifications));
    println!("Location sharing: {}", on_off(settings.location_sharing));
    println!("Language:         {}", settings.language);
    println!("Auto-save:        {}", on_off(settings.auto_save));
}

/// Handle settings commands
pub async fn handle_settings(ctx: &AppContext, command: SettingsCommand) -> Result<()> {
    ctx.require_session().await?;
    let manager = ctx.settings_manager();
    manager.load().await;

    match command {
        SettingsCommand::Show => print_settings(&manager.settings()),
        SettingsCommand::Set {
            theme,
            notifications,
            location_sharing,
            language,
            auto_save,
        } => {
            let theme = theme
                .map(|t| t.parse::<Theme>())
                .transpose()
                .map_err(ChataiError::Validation)?;
            let patch = SettingsPatch {
                theme,
                notifications,
                location_sharing,
                language,
                auto_save,
            };
            if patch.is_empty() {
                println!("{}", "Nothing to change.".yellow());
                return Ok(());
            }
            let saved = manager.save(&patch).await?;
            print_settings(&saved);
        }
    }
    Ok(())
}

/// Handle profile commands
pub async fn handle_profile(ctx: &AppContext, command: ProfileCommand) -> Result<()> {
    let user = ctx.require_session().await?;

    match command {
        ProfileCommand::Show => {
            println!("Name:     {}", user.name.bold());
            println!("Email:    {}", user.email);
            println!("Language: {}", user.preferred_language);
        }
        ProfileCommand::Update {
            name,
            email,
            language,
        } => {
            let current = user.profile();
            let profile = UserProfile {
                name: name.unwrap_or(current.name),
                email: email.unwrap_or(current.email),
                preferred_language: language.unwrap_or(current.preferred_language),
            };
            ctx.account_service()
                .save_profile(&ctx.session, &profile)
                .await?;
        }
    }
    Ok(())
}

/// Prompt for and apply a password change
pub async fn change_password(ctx: &AppContext) -> Result<()> {
    ctx.require_session().await?;
    let form = PasswordForm {
        current_password: prompt_line("Current password: ").unwrap_or_default(),
        new_password: prompt_line("New password: ").unwrap_or_default(),
        confirm_password: prompt_line("Confirm new password: ").unwrap_or_default(),
    };
    ctx.account_service().change_password(&form).await
}

/// Handle location commands
pub async fn handle_location(ctx: &AppContext, command: LocationCommand) -> Result<()> {
    ctx.require_session().await?;

    match command {
        LocationCommand::Show => {
            let service = ctx.location_service(Arc::new(UnavailablePositionSource::new(
                "no coordinates supplied",
            )))?;
            match service.load_user_location().await? {
                Some(location) => println!("Location: {}", location.display_label()),
                None => println!("{}", "No saved location.".yellow()),
            }
        }
        LocationCommand::Set { lat, lon } => {
            let service = ctx.location_service(Arc::new(FixedPositionSource::new(lat, lon)))?;
            let location = service.request_location().await?;
            println!("Location: {}", location.display_label());
        }
        LocationCommand::Clear => {
            let service = ctx.location_service(Arc::new(UnavailablePositionSource::new(
                "no coordinates supplied",
            )))?;
            service.clear_location().await?;
        }
    }
    Ok(())
}

/// Handle account commands
pub async fn handle_account(ctx: &AppContext, command: AccountCommand) -> Result<()> {
    ctx.require_session().await?;
    let service = ctx.account_service();

    match command {
        AccountCommand::Export { output } => {
            let dir = output.unwrap_or_else(default_export_dir);
            let path = service.export_data(&dir).await?;
            println!("Wrote {}", path.display().to_string().cyan());
        }
        AccountCommand::Delete => {
            if !service
                .delete_account(&ctx.session, ctx.confirmer.as_ref())
                .await?
            {
                return Err(ChataiError::ConfirmationDeclined(
                    "account was not deleted".to_string(),
                )
                .into());
            }
        }
    }
    Ok(())
}
