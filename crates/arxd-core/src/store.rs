//! Per-chat JSON configuration store.
//!
//! One file per chat at `<root>/<kind>/<id>_config.json`. Existence of the
//! file is the "chat is initialized" state; there is no cache, every
//! operation goes back to disk so external edits are picked up immediately.

use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatId, ChatKind, ChatRef},
    errors::Error,
    Result,
};

/// The persisted per-chat document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub chat: ChatRef,
    pub keywords: Vec<String>,
    pub authors: Vec<String>,
}

impl ChatConfig {
    pub fn new(chat: ChatRef) -> Self {
        Self {
            chat,
            keywords: Vec::new(),
            authors: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ConfigStore {
    root: PathBuf,
}

impl ConfigStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, chat: &ChatRef) -> PathBuf {
        self.root
            .join(chat.kind.as_str())
            .join(format!("{}_config.json", chat.id.0))
    }

    pub fn exists(&self, chat: &ChatRef) -> bool {
        self.path_for(chat).is_file()
    }

    /// Write the initial empty-lists document. Callers check `exists` first.
    pub fn create(&self, chat: ChatRef) -> Result<ChatConfig> {
        if self.exists(&chat) {
            return Err(Error::Config(format!(
                "chat {} is already initialized",
                chat.id.0
            )));
        }
        let config = ChatConfig::new(chat);
        self.save(&config)?;
        Ok(config)
    }

    pub fn load(&self, chat: &ChatRef) -> Result<ChatConfig> {
        let path = self.path_for(chat);
        if !path.is_file() {
            return Err(Error::ConfigMissing { chat: chat.id });
        }
        let txt = fs::read_to_string(&path)?;
        let config: ChatConfig = serde_json::from_str(&txt)?;
        Ok(config)
    }

    /// Atomic replace: serialize next to the target, then rename over it.
    pub fn save(&self, config: &ChatConfig) -> Result<()> {
        let path = self.path_for(&config.chat);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let txt = serde_json::to_string_pretty(config)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, txt)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Scan the config tree for every chat that has been initialized.
    /// Used at startup to re-register daily jobs after a restart.
    pub fn list_chats(&self) -> Result<Vec<ChatRef>> {
        let mut out = Vec::new();
        for kind in [
            ChatKind::Private,
            ChatKind::Group,
            ChatKind::Supergroup,
            ChatKind::Channel,
        ] {
            let dir = self.root.join(kind.as_str());
            if !dir.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().to_string();
                if let Some(id) = parse_config_file_name(&name) {
                    out.push(ChatRef {
                        id: ChatId(id),
                        kind,
                    });
                }
            }
        }
        out.sort_by_key(|c| c.id.0);
        Ok(out)
    }
}

fn parse_config_file_name(name: &str) -> Option<i64> {
    name.strip_suffix("_config.json")?.parse::<i64>().ok()
}
