//! Add/remove of authors and keywords on a chat's config.
//!
//! Actions are data interpreted by one `match`; matching is exact string
//! equality after normalization (lowercase, single-space joined).

use crate::{
    domain::ChatRef,
    errors::Error,
    formatting::escape_html,
    store::{ChatConfig, ConfigStore},
    Result,
};

/// Which of the two filter lists an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemList {
    Authors,
    Keywords,
}

impl ItemList {
    pub fn singular(&self) -> &'static str {
        match self {
            ItemList::Authors => "author",
            ItemList::Keywords => "keyword",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            ItemList::Authors => "authors",
            ItemList::Keywords => "keywords",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemAction {
    Add,
    Remove,
}

/// What an apply actually did. `Duplicate` and `NotFound` are expected
/// outcomes, not failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    Added,
    Removed,
    Duplicate,
    NotFound,
}

#[derive(Clone, Debug)]
pub struct ItemReport {
    pub item: String,
    pub list: ItemList,
    pub outcome: ItemOutcome,
}

impl ItemReport {
    /// User-facing status line (Telegram HTML subset).
    pub fn render_html(&self) -> String {
        let item = escape_html(&self.item);
        let list = self.list.plural();
        match self.outcome {
            ItemOutcome::Added => format!("<b>{item}</b> has been added to the {list} list!"),
            ItemOutcome::Removed => format!("<b>{item}</b> has been removed from the {list} list!"),
            ItemOutcome::Duplicate => format!("<b>{item}</b> is already in the {list} list!"),
            ItemOutcome::NotFound => format!("<b>{item}</b> is not in the {list} list!"),
        }
    }
}

/// Lowercase every whitespace-separated token and join with single spaces.
/// No other trimming; membership checks are exact equality on the result.
pub fn normalize_item(raw: &str) -> String {
    raw.split_whitespace()
        .map(|t| t.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply one add/remove to a chat's config, persisting only on mutation.
pub fn apply(
    store: &ConfigStore,
    chat: &ChatRef,
    list: ItemList,
    action: ItemAction,
    raw: &str,
) -> Result<ItemReport> {
    let item = normalize_item(raw);
    if item.is_empty() {
        return Err(Error::EmptyItem { list });
    }

    let mut config = store.load(chat)?;
    let entries = list_mut(&mut config, list);
    let present = entries.iter().any(|e| e == &item);

    let outcome = match (action, present) {
        (ItemAction::Add, true) => ItemOutcome::Duplicate,
        (ItemAction::Add, false) => {
            entries.push(item.clone());
            store.save(&config)?;
            ItemOutcome::Added
        }
        (ItemAction::Remove, true) => {
            entries.retain(|e| e != &item);
            store.save(&config)?;
            ItemOutcome::Removed
        }
        (ItemAction::Remove, false) => ItemOutcome::NotFound,
    };

    Ok(ItemReport {
        item,
        list,
        outcome,
    })
}

fn list_mut(config: &mut ChatConfig, list: ItemList) -> &mut Vec<String> {
    match list {
        ItemList::Authors => &mut config.authors,
        ItemList::Keywords => &mut config.keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, ChatKind};

    fn setup() -> (tempfile::TempDir, ConfigStore, ChatRef) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let chat = ChatRef {
            id: ChatId(1),
            kind: ChatKind::Private,
        };
        store.create(chat).unwrap();
        (dir, store, chat)
    }

    #[test]
    fn normalization_lowercases_and_joins_tokens() {
        assert_eq!(normalize_item("Alice  Smith"), "alice smith");
        assert_eq!(normalize_item("  Quantum\tComputing "), "quantum computing");
        assert_eq!(normalize_item("   "), "");
    }

    #[test]
    fn add_then_remove_restores_prior_list() {
        let (_dir, store, chat) = setup();
        apply(&store, &chat, ItemList::Authors, ItemAction::Add, "alice").unwrap();
        apply(&store, &chat, ItemList::Authors, ItemAction::Add, "Bob Jones").unwrap();

        let r = apply(&store, &chat, ItemList::Authors, ItemAction::Remove, "bob jones").unwrap();
        assert_eq!(r.outcome, ItemOutcome::Removed);

        let config = store.load(&chat).unwrap();
        assert_eq!(config.authors, vec!["alice".to_string()]);
    }

    #[test]
    fn adding_a_duplicate_leaves_the_list_unchanged() {
        let (_dir, store, chat) = setup();
        apply(&store, &chat, ItemList::Keywords, ItemAction::Add, "quantum").unwrap();

        let r = apply(&store, &chat, ItemList::Keywords, ItemAction::Add, "Quantum").unwrap();
        assert_eq!(r.outcome, ItemOutcome::Duplicate);

        let config = store.load(&chat).unwrap();
        assert_eq!(config.keywords, vec!["quantum".to_string()]);
    }

    #[test]
    fn removing_a_missing_item_reports_not_found() {
        let (_dir, store, chat) = setup();
        let r = apply(&store, &chat, ItemList::Keywords, ItemAction::Remove, "nothere").unwrap();
        assert_eq!(r.outcome, ItemOutcome::NotFound);
        assert!(store.load(&chat).unwrap().keywords.is_empty());
    }

    #[test]
    fn case_insensitive_membership() {
        let (_dir, store, chat) = setup();
        apply(&store, &chat, ItemList::Authors, ItemAction::Add, "Alice Smith").unwrap();

        let r = apply(&store, &chat, ItemList::Authors, ItemAction::Add, "alice smith").unwrap();
        assert_eq!(r.outcome, ItemOutcome::Duplicate);
    }

    #[test]
    fn empty_value_is_rejected_without_mutation() {
        let (_dir, store, chat) = setup();
        match apply(&store, &chat, ItemList::Authors, ItemAction::Add, "  ") {
            Err(Error::EmptyItem { list }) => assert_eq!(list, ItemList::Authors),
            other => panic!("expected EmptyItem, got {other:?}"),
        }
        assert!(store.load(&chat).unwrap().authors.is_empty());
    }

    #[test]
    fn uninitialized_chat_is_config_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path());
        let chat = ChatRef {
            id: ChatId(99),
            kind: ChatKind::Private,
        };
        match apply(&store, &chat, ItemList::Authors, ItemAction::Add, "alice") {
            Err(Error::ConfigMissing { .. }) => {}
            other => panic!("expected ConfigMissing, got {other:?}"),
        }
        // The failed apply must not create a file as a side effect.
        assert!(!store.exists(&chat));
    }

    #[test]
    fn report_messages_name_the_list() {
        let r = ItemReport {
            item: "alice <smith>".to_string(),
            list: ItemList::Authors,
            outcome: ItemOutcome::Added,
        };
        assert_eq!(
            r.render_html(),
            "<b>alice &lt;smith&gt;</b> has been added to the authors list!"
        );

        let r = ItemReport {
            item: "quantum".to_string(),
            list: ItemList::Keywords,
            outcome: ItemOutcome::Removed,
        };
        assert_eq!(
            r.render_html(),
            "<b>quantum</b> has been removed from the keywords list!"
        );
    }
}
