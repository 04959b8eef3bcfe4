use super::ids::{AccountId, ContainerId, SidebarItemId};

/// What the sidebar needs to know about one feed, folder or smart feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: SidebarItemId,
    pub name: String,
    pub unread_count: u64,
}

impl ItemSummary {
    pub fn new(id: SidebarItemId, name: impl Into<String>, unread_count: u64) -> Self {
        Self {
            id,
            name: name.into(),
            unread_count,
        }
    }
}

/// Direct children of a container. Order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerChildren {
    pub feeds: Vec<ItemSummary>,
    pub folders: Vec<ItemSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: AccountId,
    pub name: String,
}

/// Read-only view of the domain hierarchy the sidebar is derived from.
///
/// Implementations must answer every call of one reconciliation pass from the
/// same consistent state; the tree never caches anything it reads here.
pub trait SidebarSource {
    /// The default account, if it is currently active.
    fn active_account(&self) -> Option<AccountId>;

    /// Smart feeds in display order.
    fn smart_feeds(&self) -> Vec<ItemSummary>;

    /// Children of `container`, or `None` when the container no longer exists.
    fn container_children(&self, container: &ContainerId) -> Option<ContainerChildren>;

    /// Every active account, in no particular order.
    fn active_accounts(&self) -> Vec<AccountSummary>;
}

impl<S: SidebarSource + ?Sized> SidebarSource for &S {
    fn active_account(&self) -> Option<AccountId> {
        (**self).active_account()
    }

    fn smart_feeds(&self) -> Vec<ItemSummary> {
        (**self).smart_feeds()
    }

    fn container_children(&self, container: &ContainerId) -> Option<ContainerChildren> {
        (**self).container_children(container)
    }

    fn active_accounts(&self) -> Vec<AccountSummary> {
        (**self).active_accounts()
    }
}
