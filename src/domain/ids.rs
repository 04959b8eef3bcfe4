use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Stable identifier of an account (the data store that owns feeds and folders).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of anything that can appear as a selectable sidebar row.
///
/// Feeds are keyed by their account and feed id; folders by their account and
/// name (folder names are unique within an account). Smart feeds carry a
/// process-wide identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SidebarItemId {
    #[serde(rename_all = "camelCase")]
    SmartFeed { id: String },
    #[serde(rename_all = "camelCase")]
    Feed { account_id: String, feed_id: String },
    #[serde(rename_all = "camelCase")]
    Folder {
        account_id: String,
        folder_name: String,
    },
}

impl SidebarItemId {
    pub fn smart_feed(id: impl Into<String>) -> Self {
        Self::SmartFeed { id: id.into() }
    }

    pub fn feed(account_id: impl Into<String>, feed_id: impl Into<String>) -> Self {
        Self::Feed {
            account_id: account_id.into(),
            feed_id: feed_id.into(),
        }
    }

    pub fn folder(account_id: impl Into<String>, folder_name: impl Into<String>) -> Self {
        Self::Folder {
            account_id: account_id.into(),
            folder_name: folder_name.into(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    /// The container this id names, if it names one.
    pub fn as_container(&self) -> Option<ContainerId> {
        match self {
            Self::Folder {
                account_id,
                folder_name,
            } => Some(ContainerId::Folder {
                account_id: AccountId::new(account_id.as_str()),
                folder_name: folder_name.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for SidebarItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SmartFeed { id } => write!(f, "smartFeed:{}", id),
            Self::Feed {
                account_id,
                feed_id,
            } => write!(f, "feed:{}/{}", account_id, feed_id),
            Self::Folder {
                account_id,
                folder_name,
            } => write!(f, "folder:{}/{}", account_id, folder_name),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseItemIdError {
    #[error("Missing item type prefix in '{0}' (expected smartFeed:, feed: or folder:)")]
    MissingType(String),

    #[error("Unknown item type '{0}'")]
    UnknownType(String),

    #[error("Expected '<account>/<id>' after the type prefix in '{0}'")]
    MissingAccount(String),
}

/// Parses the `Display` form, e.g. `feed:local/42` or `smartFeed:today`.
impl FromStr for SidebarItemId {
    type Err = ParseItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| ParseItemIdError::MissingType(s.to_string()))?;

        match kind {
            "smartFeed" => Ok(Self::smart_feed(rest)),
            "feed" | "folder" => {
                let (account, id) = rest
                    .split_once('/')
                    .filter(|(a, i)| !a.is_empty() && !i.is_empty())
                    .ok_or_else(|| ParseItemIdError::MissingAccount(s.to_string()))?;
                if kind == "feed" {
                    Ok(Self::feed(account, id))
                } else {
                    Ok(Self::folder(account, id))
                }
            }
            other => Err(ParseItemIdError::UnknownType(other.to_string())),
        }
    }
}

/// Anything that owns feeds and folders: an account, or a folder inside one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Account(AccountId),
    Folder {
        account_id: AccountId,
        folder_name: String,
    },
}

impl ContainerId {
    pub fn account_id(&self) -> &AccountId {
        match self {
            Self::Account(id) => id,
            Self::Folder { account_id, .. } => account_id,
        }
    }
}
