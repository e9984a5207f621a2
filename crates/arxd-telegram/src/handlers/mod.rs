//! Telegram update handlers.
//!
//! Only commands are meaningful to this bot; everything else is ignored.
//! Each command runs under its chat's lock so config read-modify-write
//! cycles from rapid-fire commands cannot race.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.starts_with('/') {
        return Ok(());
    }

    let chat_id = msg.chat.id.0;
    let _guard = state.chat_locks.lock_chat(chat_id).await;
    commands::handle_command(msg, state).await
}
