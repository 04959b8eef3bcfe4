use super::controller::{TreeController, TreeDelegate};
use super::node::{NodeId, Represented};
use super::sort::{sort_alphabetically, SortEntry};
use super::store::NodeStore;
use super::TreeError;
use crate::domain::{ContainerId, SidebarSource};

/// Tree offered when choosing a destination folder: accounts, then folders.
pub type FolderTree<S> = TreeController<FolderTreeDelegate<S>>;

/// Child rules for the folder picker. Accounts expand to their folders;
/// folders are leaves here. No read filter applies.
#[derive(Debug)]
pub struct FolderTreeDelegate<S> {
    source: S,
}

impl<S: SidebarSource> FolderTreeDelegate<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn replace_source(&mut self, source: S) -> S {
        std::mem::replace(&mut self.source, source)
    }
}

impl<S: SidebarSource> TreeDelegate for FolderTreeDelegate<S> {
    fn child_nodes(
        &mut self,
        store: &mut NodeStore,
        node: NodeId,
    ) -> Result<Option<Vec<NodeId>>, TreeError> {
        let represented = store.represented(node)?.clone();

        let named: Vec<(NodeId, String)> = match represented {
            Represented::Root => {
                let mut accounts = Vec::new();
                for account in self.source.active_accounts() {
                    let child = store.existing_or_new_child(node, Represented::Account(account.id))?;
                    store.set_can_have_child_nodes(child, true)?;
                    accounts.push((child, account.name));
                }
                accounts
            }
            Represented::Account(account) => {
                let Some(contents) = self
                    .source
                    .container_children(&ContainerId::Account(account))
                else {
                    return Ok(Some(Vec::new()));
                };
                let mut folders = Vec::new();
                for folder in contents.folders {
                    let child = store.existing_or_new_child(node, Represented::Item(folder.id))?;
                    folders.push((child, folder.name));
                }
                folders
            }
            _ => return Ok(None),
        };

        let mut entries: Vec<SortEntry<'_>> = named
            .iter()
            .map(|(node, name)| SortEntry {
                node: *node,
                name,
                is_folder: false,
            })
            .collect();
        sort_alphabetically(&mut entries);
        Ok(Some(entries.into_iter().map(|e| e.node).collect()))
    }
}

impl<S: SidebarSource> FolderTree<S> {
    pub fn with_source(source: S) -> Result<Self, TreeError> {
        Self::new(FolderTreeDelegate::new(source))
    }
}
