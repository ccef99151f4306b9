// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Icon definitions installed by `icon/create`.

use std::collections::HashMap;

use mapsync_port::IconDefinition;
use mapsync_proto::IconId;
use serde_json::Value;

/// Icon definitions keyed by id. Entries are overwritten, never removed.
#[derive(Debug, Default)]
pub struct IconRegistry {
    icons: HashMap<IconId, IconDefinition>,
}

impl IconRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install (or overwrite) an icon. Returns the replaced definition.
    pub fn install(&mut self, id: IconId, options: Value) -> Option<IconDefinition> {
        self.icons
            .insert(id.clone(), IconDefinition { id, options })
    }

    /// Look up an icon by id.
    pub fn get(&self, id: &IconId) -> Option<&IconDefinition> {
        self.icons.get(id)
    }

    /// Number of installed icons.
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Whether no icon is installed.
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}
