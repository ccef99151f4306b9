// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted settings for the map host.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Saved host settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostPrefs {
    /// Socket the controller connects to.
    pub controller_socket: PathBuf,
    /// Socket the rendering surface connects to.
    pub surface_socket: PathBuf,
    /// Quiet period before a view change is reported, in milliseconds.
    pub view_debounce_ms: u64,
    /// Ignore `initialize` for a map id that is already live.
    pub strict_session_ids: bool,
}

impl HostPrefs {
    /// Config key the prefs are stored under.
    pub const KEY: &'static str = "map_host";

    /// View debounce as a duration.
    pub fn view_debounce(&self) -> Duration {
        Duration::from_millis(self.view_debounce_ms)
    }
}

impl Default for HostPrefs {
    fn default() -> Self {
        Self {
            controller_socket: mapsync_proto::default_controller_socket(),
            surface_socket: mapsync_proto::default_surface_socket(),
            view_debounce_ms: 200,
            strict_session_ids: true,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::tests::MemStore;
    use crate::config::ConfigService;

    #[test]
    fn partial_prefs_fill_in_defaults() {
        let prefs: HostPrefs = serde_json::from_str(r#"{"view_debounce_ms": 75}"#).unwrap();
        assert_eq!(prefs.view_debounce(), Duration::from_millis(75));
        assert!(prefs.strict_session_ids);
        assert_eq!(prefs.surface_socket, HostPrefs::default().surface_socket);
    }

    #[test]
    fn first_load_writes_defaults_under_the_host_key() {
        let svc = ConfigService::new(MemStore::default());
        let prefs: HostPrefs = svc.load_or_init(HostPrefs::KEY).unwrap();
        assert_eq!(prefs, HostPrefs::default());
        assert!(svc.into_inner().0.borrow().contains_key("map_host"));
    }
}
