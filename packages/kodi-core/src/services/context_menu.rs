//! Context menu entries contributed by add-ons.

use std::sync::Arc;

use parking_lot::RwLock;

use super::addons::{AddonManager, AddonType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenuItem {
    pub addon_id: String,
    pub label: String,
}

pub struct ContextMenuManager {
    addons: Arc<AddonManager>,
    items: RwLock<Vec<ContextMenuItem>>,
}

impl ContextMenuManager {
    pub fn new(addons: Arc<AddonManager>) -> Self {
        let manager = Self {
            addons,
            items: RwLock::new(Vec::new()),
        };
        manager.reload();
        manager
    }

    /// Rebuilds the entries from the enabled context item add-ons.
    pub fn reload(&self) {
        let items: Vec<ContextMenuItem> = self
            .addons
            .enabled_of_type(AddonType::ContextItem)
            .into_iter()
            .map(|addon| ContextMenuItem {
                label: addon.label.unwrap_or(addon.name),
                addon_id: addon.id,
            })
            .collect();
        log::debug!("[ContextMenu] {} add-on item(s)", items.len());
        *self.items.write() = items;
    }

    pub fn items(&self) -> Vec<ContextMenuItem> {
        self.items.read().clone()
    }

    pub fn remove_addon(&self, addon_id: &str) {
        self.items.write().retain(|item| item.addon_id != addon_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::addons::test_support::write_addon;

    #[test]
    fn items_use_label_or_name() {
        let dir = tempfile::tempdir().unwrap();
        write_addon(dir.path(), "context.a", "context_item", r#","label":"Play trailer""#);
        write_addon(dir.path(), "context.b", "context_item", "");
        let addons = Arc::new(AddonManager::load(dir.path()).unwrap());
        let menu = ContextMenuManager::new(addons);

        let labels: Vec<String> = menu.items().into_iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["Play trailer", "context.b"]);

        menu.remove_addon("context.a");
        assert_eq!(menu.items().len(), 1);
    }
}
