use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};

use arxd_core::{
    config::Config,
    ports::{MessagingPort, PaperIndexPort},
    scheduler::DigestScheduler,
    store::ConfigStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: ConfigStore,
    pub index: Arc<dyn PaperIndexPort>,
    pub messenger: Arc<dyn MessagingPort>,
    pub scheduler: Arc<DigestScheduler>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Per-chat mutual exclusion. Command handlers do read-modify-write cycles
/// on the chat's config file; holding the chat's lock serializes them.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

pub async fn run_polling(
    cfg: Arc<Config>,
    store: ConfigStore,
    index: Arc<dyn PaperIndexPort>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        println!("arxd started: @{}", me.username());
    }
    println!("Config directory: {}", cfg.config_dir.display());
    println!(
        "Daily digest at {:02}:{:02} local time",
        cfg.digest_hour, cfg.digest_minute
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let scheduler = Arc::new(DigestScheduler::new(
        cfg.clone(),
        store.clone(),
        index.clone(),
        messenger.clone(),
    ));
    if let Err(e) = scheduler.register_existing().await {
        eprintln!("[SCHED] Failed to restore digest jobs: {e}");
    }

    let state = Arc::new(AppState {
        cfg,
        store,
        index,
        messenger,
        scheduler,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
