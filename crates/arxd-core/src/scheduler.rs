//! Per-chat daily digest scheduler.
//!
//! One tokio task per registered chat. Each task sleeps until the next
//! occurrence of the configured local fire time, runs a digest tick, and
//! loops. A failing tick is logged and never affects other chats' jobs.

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Local, NaiveTime};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    digest::{build_digest, render_digest, Digest},
    domain::ChatRef,
    ports::{MessagingPort, PaperIndexPort},
    store::ConfigStore,
    Result,
};

#[derive(Clone)]
pub struct DigestScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    cfg: Arc<Config>,
    store: ConfigStore,
    index: Arc<dyn PaperIndexPort>,
    messenger: Arc<dyn MessagingPort>,
    state: tokio::sync::Mutex<SchedulerState>,
}

#[derive(Default)]
struct SchedulerState {
    jobs: HashMap<i64, JobEntry>,
}

struct JobEntry {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl DigestScheduler {
    pub fn new(
        cfg: Arc<Config>,
        store: ConfigStore,
        index: Arc<dyn PaperIndexPort>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                cfg,
                store,
                index,
                messenger,
                state: tokio::sync::Mutex::new(SchedulerState::default()),
            }),
        }
    }

    /// Register a daily job for a chat. Idempotent per chat id: returns
    /// `false` without touching anything when a job is already running.
    pub async fn register(&self, chat: ChatRef) -> bool {
        let mut st = self.inner.state.lock().await;
        if st.jobs.contains_key(&chat.id.0) {
            return false;
        }

        let cancel = CancellationToken::new();
        let scheduler = self.clone();
        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(async move {
            scheduler.job_loop(chat, cancel_clone).await;
        });

        st.jobs.insert(chat.id.0, JobEntry { cancel, handle });
        println!("[SCHED] Registered daily digest for chat {}", chat.id.0);
        true
    }

    /// Re-register a job for every chat already on disk. Called at startup
    /// so schedules survive process restarts.
    pub async fn register_existing(&self) -> Result<usize> {
        let chats = self.inner.store.list_chats()?;
        let mut loaded = 0usize;
        for chat in chats {
            if self.register(chat).await {
                loaded += 1;
            }
        }
        if loaded > 0 {
            println!("[SCHED] Restored {loaded} daily digest jobs");
        }
        Ok(loaded)
    }

    pub async fn job_count(&self) -> usize {
        self.inner.state.lock().await.jobs.len()
    }

    pub async fn stop(&self) {
        let mut st = self.inner.state.lock().await;
        for (_, job) in st.jobs.drain() {
            job.cancel.cancel();
            job.handle.abort(); // best-effort
        }
    }

    async fn job_loop(&self, chat: ChatRef, cancel: CancellationToken) {
        loop {
            let Some(next) = next_fire_after(
                Local::now(),
                self.inner.cfg.digest_hour,
                self.inner.cfg.digest_minute,
            ) else {
                eprintln!("[SCHED] Chat {} has no next run (stopping)", chat.id.0);
                break;
            };

            let dur = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
              _ = cancel.cancelled() => break,
              _ = sleep(dur) => {
                if let Err(e) = self.run_digest_tick(&chat).await {
                  eprintln!("[DIGEST] Digest for chat {} failed: {e}", chat.id.0);
                }
              }
            }
        }
    }

    /// One scheduled tick: fresh config read, one query, one message.
    /// Chats with no filters configured are skipped silently.
    async fn run_digest_tick(&self, chat: &ChatRef) -> Result<()> {
        let config = self.inner.store.load(chat)?;
        let digest = build_digest(
            self.inner.index.as_ref(),
            &config,
            self.inner.cfg.max_results,
        )
        .await?;

        match digest {
            Digest::Empty => {}
            Digest::NoResults => {
                self.inner
                    .messenger
                    .send_html(chat.id, "No new papers found.")
                    .await?;
            }
            Digest::Found(papers) => {
                let html = render_digest(&papers, Local::now().date_naive());
                self.inner.messenger.send_html(chat.id, &html).await?;
                println!(
                    "[DIGEST] Sent {} papers to chat {}",
                    papers.len(),
                    chat.id.0
                );
            }
        }

        Ok(())
    }
}

/// Next occurrence of `hour:minute` local time strictly after `now`.
/// Skips over times a DST transition removes.
fn next_fire_after(now: DateTime<Local>, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let fire = NaiveTime::from_hms_opt(hour, minute, 0)?;
    let mut day = now.date_naive();
    for _ in 0..4 {
        if let Some(candidate) = day.and_time(fire).and_local_timezone(Local).earliest() {
            if candidate > now {
                return Some(candidate);
            }
        }
        day = day.succ_opt()?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, ChatKind, MessageId, MessageRef};
    use crate::ports::{MessagingCapabilities, Paper};
    use async_trait::async_trait;
    use chrono::{Datelike, TimeZone, Timelike};
    use std::path::PathBuf;

    struct NullMessenger;

    #[async_trait]
    impl MessagingPort for NullMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                supports_html: true,
                max_message_len: 4096,
            }
        }

        async fn send_html(&self, chat_id: ChatId, _html: &str) -> Result<MessageRef> {
            Ok(MessageRef {
                chat_id,
                message_id: MessageId(1),
            })
        }
    }

    struct NullIndex;

    #[async_trait]
    impl PaperIndexPort for NullIndex {
        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<Paper>> {
            Ok(Vec::new())
        }
    }

    fn test_config(dir: PathBuf) -> Arc<Config> {
        Arc::new(Config {
            telegram_bot_token: "test-token".to_string(),
            config_dir: dir,
            digest_hour: 9,
            digest_minute: 0,
            max_results: 10,
            arxiv_api_url: "http://localhost/api/query".to_string(),
            http_timeout: Duration::from_secs(5),
        })
    }

    #[test]
    fn next_fire_is_today_when_still_ahead() {
        let now = Local.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let next = next_fire_after(now, 9, 0).unwrap();
        assert_eq!(next.day(), 2);
        assert_eq!((next.hour(), next.minute()), (9, 0));
    }

    #[test]
    fn next_fire_rolls_to_tomorrow_once_passed() {
        let now = Local.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let next = next_fire_after(now, 9, 0).unwrap();
        assert_eq!(next.day(), 3);
        assert_eq!((next.hour(), next.minute()), (9, 0));
    }

    #[tokio::test]
    async fn register_is_idempotent_per_chat() {
        let dir = tempfile::tempdir().unwrap();
        let scheduler = DigestScheduler::new(
            test_config(dir.path().to_path_buf()),
            ConfigStore::new(dir.path()),
            Arc::new(NullIndex),
            Arc::new(NullMessenger),
        );

        let chat = ChatRef {
            id: ChatId(1),
            kind: ChatKind::Private,
        };
        assert!(scheduler.register(chat).await);
        assert!(!scheduler.register(chat).await);
        assert_eq!(scheduler.job_count().await, 1);

        scheduler.stop().await;
        assert_eq!(scheduler.job_count().await, 0);
    }

    #[tokio::test]
    async fn register_existing_picks_up_on_disk_chats() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        store
            .create(ChatRef {
                id: ChatId(10),
                kind: ChatKind::Private,
            })
            .unwrap();
        store
            .create(ChatRef {
                id: ChatId(-20),
                kind: ChatKind::Group,
            })
            .unwrap();

        let scheduler = DigestScheduler::new(
            test_config(dir.path().to_path_buf()),
            store,
            Arc::new(NullIndex),
            Arc::new(NullMessenger),
        );

        assert_eq!(scheduler.register_existing().await.unwrap(), 2);
        // A second scan finds everything already registered.
        assert_eq!(scheduler.register_existing().await.unwrap(), 0);
        scheduler.stop().await;
    }
}
