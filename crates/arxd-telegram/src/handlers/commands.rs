use std::sync::Arc;

use chrono::Local;
use teloxide::{prelude::*, types::Message};

use arxd_core::{
    digest::{build_digest, render_digest, Digest},
    domain::{ChatId, ChatKind, ChatRef},
    formatting::escape_html,
    items::{self, ItemAction, ItemList},
    Error,
};

use crate::router::AppState;

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn chat_ref(chat: &teloxide::types::Chat) -> ChatRef {
    let kind = if chat.is_private() {
        ChatKind::Private
    } else if chat.is_group() {
        ChatKind::Group
    } else if chat.is_supergroup() {
        ChatKind::Supergroup
    } else {
        ChatKind::Channel
    };
    ChatRef {
        id: ChatId(chat.id.0),
        kind,
    }
}

/// Human-readable chat name for status messages: group title, else
/// username, else the bare id.
fn chat_label(chat: &teloxide::types::Chat) -> String {
    chat.title()
        .or_else(|| chat.username())
        .map(|s| s.to_string())
        .unwrap_or_else(|| chat.id.0.to_string())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConfigStatus {
    Created,
    Exists,
    Missing,
    Error,
}

fn status_html(chat: &ChatRef, label: &str, status: ConfigStatus) -> String {
    let kind = chat.kind.as_str();
    let label = escape_html(label);
    let id = chat.id.0;
    match status {
        ConfigStatus::Created => format!(
            "Configuration created for the {kind} chat <b>{label}</b> with ID <b>{id}</b>."
        ),
        ConfigStatus::Exists => format!(
            "Configuration for the {kind} chat <b>{label}</b> with ID <b>{id}</b> already exists."
        ),
        ConfigStatus::Missing => format!(
            "Configuration not found for the {kind} chat <b>{label}</b> with ID <b>{id}</b>.\n\
             Please initialize the configuration with <b>/start</b>."
        ),
        ConfigStatus::Error => format!(
            "There is an issue with the configuration for the {kind} chat <b>{label}</b> with ID <b>{id}</b>."
        ),
    }
}

async fn send(state: &AppState, chat_id: ChatId, html: &str) {
    if let Err(e) = state.messenger.send_html(chat_id, html).await {
        eprintln!("[BOT] Failed to send message to chat {}: {e}", chat_id.0);
    }
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let (cmd, args) = parse_command(text);
    let chat = chat_ref(&msg.chat);
    let label = chat_label(&msg.chat);

    match cmd.as_str() {
        "start" => start(&state, chat, &label).await,
        "add_author" | "aa" => {
            apply_item(&state, chat, &label, ItemList::Authors, ItemAction::Add, &args).await
        }
        "add_keyword" | "ak" => {
            apply_item(&state, chat, &label, ItemList::Keywords, ItemAction::Add, &args).await
        }
        "del_author" | "da" => {
            apply_item(&state, chat, &label, ItemList::Authors, ItemAction::Remove, &args).await
        }
        "del_keyword" | "dk" => {
            apply_item(&state, chat, &label, ItemList::Keywords, ItemAction::Remove, &args).await
        }
        "list" | "ls" => list_items(&state, chat, &label).await,
        "latest" => latest(&state, chat, &label).await,
        "help" => send(&state, chat.id, &help_html()).await,
        _ => {
            let html = format!("Unknown command: /{}", escape_html(&cmd));
            send(&state, chat.id, &html).await;
        }
    }

    Ok(())
}

/// `/start`: create the chat's config if needed, then make sure its daily
/// digest job is running. Safe to repeat.
async fn start(state: &AppState, chat: ChatRef, label: &str) {
    if state.store.exists(&chat) {
        send(state, chat.id, &status_html(&chat, label, ConfigStatus::Exists)).await;
    } else {
        match state.store.create(chat) {
            Ok(_) => {
                send(state, chat.id, &status_html(&chat, label, ConfigStatus::Created)).await;
            }
            Err(e) => {
                eprintln!("[BOT] Failed to create config for chat {}: {e}", chat.id.0);
                send(state, chat.id, &status_html(&chat, label, ConfigStatus::Error)).await;
                return;
            }
        }
    }

    state.scheduler.register(chat).await;
}

async fn apply_item(
    state: &AppState,
    chat: ChatRef,
    label: &str,
    list: ItemList,
    action: ItemAction,
    args: &str,
) {
    match items::apply(&state.store, &chat, list, action, args) {
        Ok(report) => send(state, chat.id, &report.render_html()).await,
        Err(Error::ConfigMissing { .. }) => {
            send(state, chat.id, &status_html(&chat, label, ConfigStatus::Missing)).await;
        }
        Err(Error::EmptyItem { list }) => {
            let html = format!("Please specify the name of the {}!", list.singular());
            send(state, chat.id, &html).await;
        }
        Err(e) => {
            eprintln!("[BOT] Item update for chat {} failed: {e}", chat.id.0);
            send(state, chat.id, &status_html(&chat, label, ConfigStatus::Error)).await;
        }
    }
}

async fn list_items(state: &AppState, chat: ChatRef, label: &str) {
    let config = match state.store.load(&chat) {
        Ok(config) => config,
        Err(Error::ConfigMissing { .. }) => {
            send(state, chat.id, &status_html(&chat, label, ConfigStatus::Missing)).await;
            return;
        }
        Err(e) => {
            eprintln!("[BOT] Failed to load config for chat {}: {e}", chat.id.0);
            send(state, chat.id, &status_html(&chat, label, ConfigStatus::Error)).await;
            return;
        }
    };

    if config.authors.is_empty() && config.keywords.is_empty() {
        send(
            state,
            chat.id,
            "There are no authors and keywords in both lists!",
        )
        .await;
        return;
    }

    let mut lines = Vec::new();
    for (name, entries) in [("authors", &config.authors), ("keywords", &config.keywords)] {
        if entries.is_empty() {
            lines.push(format!("There are no {name} in the {name} list!"));
        } else {
            lines.push(format!(
                "<b>List of {name}</b>: {}.",
                escape_html(&entries.join(", "))
            ));
        }
    }

    send(state, chat.id, &lines.join("\n")).await;
}

/// `/latest`: on-demand digest, always answered inline. Unlike the
/// scheduled job, an unconfigured chat gets an explicit reply here.
async fn latest(state: &AppState, chat: ChatRef, label: &str) {
    let config = match state.store.load(&chat) {
        Ok(config) => config,
        Err(Error::ConfigMissing { .. }) => {
            send(state, chat.id, &status_html(&chat, label, ConfigStatus::Missing)).await;
            return;
        }
        Err(e) => {
            eprintln!("[BOT] Failed to load config for chat {}: {e}", chat.id.0);
            send(state, chat.id, &status_html(&chat, label, ConfigStatus::Error)).await;
            return;
        }
    };

    match build_digest(state.index.as_ref(), &config, state.cfg.max_results).await {
        Ok(Digest::Empty) => {
            send(
                state,
                chat.id,
                "No authors or keywords configured yet. Add some with /add_author or /add_keyword!",
            )
            .await;
        }
        Ok(Digest::NoResults) => send(state, chat.id, "No new papers found.").await,
        Ok(Digest::Found(papers)) => {
            let html = render_digest(&papers, Local::now().date_naive());
            send(state, chat.id, &html).await;
        }
        Err(e) => {
            eprintln!("[DIGEST] On-demand fetch for chat {} failed: {e}", chat.id.0);
            send(
                state,
                chat.id,
                "Could not fetch the latest papers, please try again later.",
            )
            .await;
        }
    }
}

fn help_html() -> String {
    [
        "<b>/start</b> - initialize this chat and schedule the daily digest",
        "<b>/add_author</b> (or /aa) &lt;name&gt; - track an author",
        "<b>/add_keyword</b> (or /ak) &lt;word&gt; - track a keyword",
        "<b>/del_author</b> (or /da) &lt;name&gt; - stop tracking an author",
        "<b>/del_keyword</b> (or /dk) &lt;word&gt; - stop tracking a keyword",
        "<b>/list</b> (or /ls) - show tracked authors and keywords",
        "<b>/latest</b> - fetch the latest matching papers now",
    ]
    .join("\n")
}
