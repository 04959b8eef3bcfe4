//! Serializable domain snapshot: the concrete [`SidebarSource`] read from disk.
//!
//! A snapshot is a frozen copy of the account hierarchy with unread counts.
//! The first account in the file is the default account shown in the sidebar.
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::ids::{AccountId, ContainerId, SidebarItemId};
use super::source::{AccountSummary, ContainerChildren, ItemSummary, SidebarSource};
use crate::util::strip_control_chars;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in snapshot file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON in snapshot file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Snapshot Structs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
    pub smart_feeds: Vec<SmartFeed>,
    pub accounts: Vec<Account>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartFeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unread_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub feeds: Vec<Feed>,
    #[serde(default)]
    pub folders: Vec<Folder>,
}

/// Display name for a folder whose name is empty after sanitizing.
const UNTITLED_FOLDER: &str = "Untitled Folder";

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    #[serde(default)]
    pub feeds: Vec<Feed>,
}

impl Folder {
    /// Unread articles across every feed in the folder.
    pub fn unread_count(&self) -> u64 {
        self.feeds
            .iter()
            .map(|f| f.unread_count)
            .fold(0, u64::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unread_count: u64,
}

impl Account {
    pub fn unread_count(&self) -> u64 {
        self.feeds
            .iter()
            .map(|f| f.unread_count)
            .chain(self.folders.iter().map(Folder::unread_count))
            .fold(0, u64::saturating_add)
    }

    fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    fn feed_summary(&self, feed: &Feed) -> ItemSummary {
        ItemSummary::new(
            SidebarItemId::feed(&self.id, &feed.id),
            &feed.name,
            feed.unread_count,
        )
    }
}

// ============================================================================
// Loading
// ============================================================================

impl Snapshot {
    /// Maximum snapshot file size (4 MB).
    const MAX_FILE_SIZE: u64 = 4 * 1_048_576;

    /// Load a snapshot from `path`.
    ///
    /// Files ending in `.json` are parsed as JSON, anything else as TOML.
    /// Display names are sanitized after parsing.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(SnapshotError::TooLarge(format!(
                "Snapshot file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let mut snapshot = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_toml(&content)?
        };
        snapshot.sanitize_names();

        tracing::debug!(
            path = %path.display(),
            accounts = snapshot.accounts.len(),
            smart_feeds = snapshot.smart_feeds.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    pub fn from_toml(content: &str) -> Result<Self, SnapshotError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(content)?)
    }

    /// The default account regardless of whether it is active.
    pub fn default_account(&self) -> Option<&Account> {
        self.accounts.first()
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id.as_str())
    }

    /// Name and unread count of the item `id` names.
    pub fn item(&self, id: &SidebarItemId) -> Option<ItemSummary> {
        match id {
            SidebarItemId::SmartFeed { id: smart_id } => self
                .smart_feeds
                .iter()
                .find(|s| &s.id == smart_id)
                .map(|s| ItemSummary::new(id.clone(), &s.name, s.unread_count)),
            SidebarItemId::Feed {
                account_id,
                feed_id,
            } => {
                let account = self.account(&AccountId::new(account_id.as_str()))?;
                account
                    .feeds
                    .iter()
                    .chain(account.folders.iter().flat_map(|f| f.feeds.iter()))
                    .find(|f| &f.id == feed_id)
                    .map(|f| account.feed_summary(f))
            }
            SidebarItemId::Folder {
                account_id,
                folder_name,
            } => {
                let folder = self
                    .account(&AccountId::new(account_id.as_str()))?
                    .folder(folder_name)?;
                Some(ItemSummary::new(id.clone(), &folder.name, folder.unread_count()))
            }
        }
    }

    /// Strip control characters from every display name.
    ///
    /// A name that is empty after stripping falls back to the item's id so
    /// rows never render blank. Folders are keyed by name, so their ids are
    /// derived from the cleaned name.
    pub fn sanitize_names(&mut self) {
        fn clean(name: &mut String, fallback: &str) {
            let stripped = strip_control_chars(name);
            let trimmed = stripped.trim();
            let cleaned = if trimmed.is_empty() {
                fallback.to_string()
            } else {
                trimmed.to_string()
            };
            *name = cleaned;
        }

        for smart in &mut self.smart_feeds {
            clean(&mut smart.name, &smart.id);
        }
        for account in &mut self.accounts {
            clean(&mut account.name, &account.id);
            for feed in &mut account.feeds {
                clean(&mut feed.name, &feed.id);
            }
            for folder in &mut account.folders {
                clean(&mut folder.name, UNTITLED_FOLDER);
                for feed in &mut folder.feeds {
                    clean(&mut feed.name, &feed.id);
                }
            }
        }
    }
}

impl SidebarSource for Snapshot {
    fn active_account(&self) -> Option<AccountId> {
        self.default_account()
            .filter(|a| a.active)
            .map(|a| AccountId::new(&a.id))
    }

    fn smart_feeds(&self) -> Vec<ItemSummary> {
        self.smart_feeds
            .iter()
            .map(|s| ItemSummary::new(SidebarItemId::smart_feed(&s.id), &s.name, s.unread_count))
            .collect()
    }

    fn container_children(&self, container: &ContainerId) -> Option<ContainerChildren> {
        let account = self.account(container.account_id())?;

        match container {
            ContainerId::Account(_) => Some(ContainerChildren {
                feeds: account.feeds.iter().map(|f| account.feed_summary(f)).collect(),
                folders: account
                    .folders
                    .iter()
                    .map(|folder| {
                        ItemSummary::new(
                            SidebarItemId::folder(&account.id, &folder.name),
                            &folder.name,
                            folder.unread_count(),
                        )
                    })
                    .collect(),
            }),
            ContainerId::Folder { folder_name, .. } => {
                let folder = account.folder(folder_name)?;
                Some(ContainerChildren {
                    feeds: folder.feeds.iter().map(|f| account.feed_summary(f)).collect(),
                    folders: Vec::new(),
                })
            }
        }
    }

    fn active_accounts(&self) -> Vec<AccountSummary> {
        self.accounts
            .iter()
            .filter(|a| a.active)
            .map(|a| AccountSummary {
                id: AccountId::new(&a.id),
                name: a.name.clone(),
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
