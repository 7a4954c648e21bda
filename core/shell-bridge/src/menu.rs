//! Context-menu model.
//!
//! The engine owns menu wording (it has the translation tables); the
//! extension only caches the four current label strings and pairs them with
//! URL commands. English defaults apply until the first `setConfig` push.

use harbor_shell_protocol::{UrlCommand, MENU_LABEL_SLOTS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLabels {
    pub access_online: String,
    pub copy_share_link: String,
    pub edit_metadata: String,
    pub direct_transfer: String,
}

impl Default for MenuLabels {
    fn default() -> Self {
        Self {
            access_online: "Access online".to_string(),
            copy_share_link: "Copy share-link".to_string(),
            edit_metadata: "Edit metadata".to_string(),
            direct_transfer: "Upload content".to_string(),
        }
    }
}

impl MenuLabels {
    /// Replaces labels slot-by-slot from a `setConfig` push. A short list
    /// replaces only the leading slots; extra entries are ignored.
    pub fn apply_entries(&mut self, entries: &[String]) {
        let slots: [&mut String; MENU_LABEL_SLOTS] = [
            &mut self.access_online,
            &mut self.copy_share_link,
            &mut self.edit_metadata,
            &mut self.direct_transfer,
        ];
        for (slot, entry) in slots.into_iter().zip(entries) {
            *slot = entry.clone();
        }
    }

    /// Menu offered when the selection is inside a synchronized root.
    pub fn synced_menu(&self) -> Vec<MenuItem> {
        vec![
            MenuItem {
                label: self.access_online.clone(),
                command: UrlCommand::AccessOnline,
            },
            MenuItem {
                label: self.copy_share_link.clone(),
                command: UrlCommand::CopyShareLink,
            },
            MenuItem {
                label: self.edit_metadata.clone(),
                command: UrlCommand::EditMetadata,
            },
        ]
    }

    /// Menu offered everywhere else: upload the selection.
    pub fn unsynced_menu(&self) -> Vec<MenuItem> {
        vec![MenuItem {
            label: self.direct_transfer.clone(),
            command: UrlCommand::DirectTransfer,
        }]
    }
}

/// One clickable entry handed to the file browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub command: UrlCommand,
}
