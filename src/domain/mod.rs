//! Domain-side types the sidebar reads from: identifiers, the
//! [`SidebarSource`] collaborator trait, and the on-disk [`Snapshot`].

mod ids;
mod snapshot;
mod source;

pub use ids::{AccountId, ContainerId, ParseItemIdError, SidebarItemId};
pub use snapshot::{Account, Feed, Folder, SmartFeed, Snapshot, SnapshotError};
pub use source::{AccountSummary, ContainerChildren, ItemSummary, SidebarSource};
