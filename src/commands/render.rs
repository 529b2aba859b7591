//! Terminal rendering of chats, messages, and place results

use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use prettytable::{format, Table};

use crate::api::{Chat, Message, PlaceData, Role};

/// Place results shown under an assistant reply
pub const MAX_PLACES_SHOWN: usize = 3;

const TITLE_COLUMN_CHARS: usize = 40;

/// Local wall-clock time of a timestamp
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

/// `$` repeated once per price level; empty for level 0
pub fn price_label(level: u8) -> String {
    "$".repeat(level as usize)
}

/// Multi-line description of one place
pub fn format_place(place: &PlaceData) -> String {
    let mut lines = vec![place.name.bold().to_string()];
    if !place.address.is_empty() {
        lines.push(place.address.clone());
    }

    let mut details = Vec::new();
    if let Some(rating) = place.rating.filter(|r| *r > 0.0) {
        details.push(format!("★ {}", rating));
    }
    if let Some(level) = place.price_level.filter(|l| *l > 0) {
        details.push(price_label(level));
    }
    if let Some(phone) = &place.phone_number {
        details.push(format!("☎ {}", phone));
    }
    if !details.is_empty() {
        lines.push(details.join("  "));
    }
    if let Some(website) = &place.website {
        lines.push(website.cyan().to_string());
    }

    lines.join("\n    ")
}

/// Print a message with its author and, for replies, up to three places
pub fn print_message(message: &Message) {
    match message.role {
        Role::User => println!("{} {}", "you>".green().bold(), message.content),
        Role::Assistant => println!("{} {}", "assistant>".blue().bold(), message.content),
    }

    let places = message.places();
    if !places.is_empty() {
        println!("\n  {}", "Places found:".bold());
        for place in places.iter().take(MAX_PLACES_SHOWN) {
            println!("  • {}", format_place(place));
        }
    }
    println!();
}

/// Print every loaded message of a chat
pub fn print_chat(chat: &Chat) {
    println!(
        "\n{} {}\n",
        chat.title.bold(),
        format!("({})", chat.id).dimmed()
    );
    if chat.messages().is_empty() {
        println!("{}", "No messages yet.".yellow());
        return;
    }
    for message in chat.messages() {
        print_message(message);
    }
}

/// Build the chat list table, marking the active chat
pub fn chat_table(chats: &[Chat], active: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "",
        "ID".bold(),
        "Title".bold(),
        "Messages".bold(),
        "Last Updated".bold()
    ]);

    for chat in chats {
        let marker = if active == Some(chat.id.as_str()) { "*" } else { "" };
        let messages = if chat.is_loaded() {
            chat.messages().len().to_string()
        } else {
            "-".to_string()
        };
        table.add_row(prettytable::row![
            marker,
            chat.id.cyan(),
            truncate_chars(&chat.title, TITLE_COLUMN_CHARS),
            messages,
            format_timestamp(chat.updated_at)
        ]);
    }

    table
}

/// Print the chat list, or a hint when it is empty
pub fn print_chat_list(chats: &[Chat], active: Option<&str>) {
    if chats.is_empty() {
        println!("{}", "No chats found.".yellow());
        return;
    }
    println!();
    chat_table(chats, active).printstd();
    println!();
}
