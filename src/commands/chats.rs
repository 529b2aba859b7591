use super::render::{print_chat, print_chat_list};
use super::{AppContext, AssumeYes};
use crate::chat::ChatSessionManager;
use crate::cli::ChatsCommand;
use crate::error::{ChataiError, Result};
use colored::Colorize;

/// Handle chat list commands
pub async fn handle_chats(ctx: &AppContext, command: ChatsCommand) -> Result<()> {
    ctx.require_session().await?;
    let manager = ctx.chat_manager();
    manager.refresh_chats().await?;

    match command {
        ChatsCommand::List => {
            print_chat_list(&manager.chats(), None);
            if !manager.chats().is_empty() {
                println!(
                    "Use {} to continue a chat.",
                    "chatai chat --resume <ID>".cyan()
                );
                println!();
            }
        }
        ChatsCommand::Search { query } => {
            let matches = manager.search(&query);
            if matches.is_empty() {
                println!("{}", format!("No chats match \"{}\".", query).yellow());
            } else {
                print_chat_list(&matches, None);
            }
        }
        ChatsCommand::Show { id } => {
            manager.select_chat(&id).await?;
            if let Some(chat) = manager.active_chat() {
                print_chat(&chat);
            }
        }
        ChatsCommand::Rename { id, title } => {
            manager.begin_rename(&id)?;
            manager.edit_rename(&title);
            manager.commit_rename().await?;
        }
        ChatsCommand::Delete { id, yes } => {
            let deleted = if yes {
                manager.delete_chat(&id, &AssumeYes).await?
            } else {
                manager.delete_chat(&id, ctx.confirmer.as_ref()).await?
            };
            if !deleted {
                return Err(ChataiError::ConfirmationDeclined(format!(
                    "chat {} was not deleted",
                    id
                ))
                .into());
            }
        }
    }

    Ok(())
}

/// Save the open title editor, or close it when `input` is blank
///
/// Returns whether a new title was saved. A failed save leaves the editor
/// open with the attempted title.
pub async fn finish_rename(manager: &ChatSessionManager, input: Option<&str>) -> Result<bool> {
    match input.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => {
            manager.edit_rename(title);
            manager.commit_rename().await?;
            Ok(true)
        }
        None => {
            manager.cancel_rename();
            Ok(false)
        }
    }
}
