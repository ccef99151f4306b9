// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wholesale marker reconciliation.

use mapsync_port::{MapWidget, MarkerDef, MarkerHandle};
use mapsync_proto::MarkerSpec;
use tracing::debug;

use crate::IconRegistry;

/// The markers a session currently owns.
///
/// Updates are never partial: [`MarkerSet::replace`] destroys every live
/// marker before creating the new ones.
#[derive(Debug, Default)]
pub struct MarkerSet {
    live: Vec<MarkerHandle>,
}

impl MarkerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection with `specs`, in order.
    ///
    /// Unknown icon ids render with the widget's default icon.
    pub fn replace<W>(&mut self, widget: &mut W, specs: &[MarkerSpec], icons: &IconRegistry)
    where
        W: MapWidget + ?Sized,
    {
        self.clear(widget);
        self.live.reserve(specs.len());
        for spec in specs {
            let icon = spec.icon.as_ref().and_then(|id| {
                let found = icons.get(id).cloned();
                if found.is_none() {
                    debug!(icon = %id, "unknown icon; using default");
                }
                found
            });
            let handle = widget.add_marker(&MarkerDef {
                position: spec.position,
                label: spec.label.clone(),
                icon,
            });
            self.live.push(handle);
        }
    }

    /// Pointer entered a marker: open its label popup.
    pub fn marker_over<W>(&self, widget: &mut W, marker: MarkerHandle) -> bool
    where
        W: MapWidget + ?Sized,
    {
        if !self.live.contains(&marker) {
            return false;
        }
        widget.open_popup(marker);
        true
    }

    /// Destroy every live marker.
    pub fn clear<W>(&mut self, widget: &mut W)
    where
        W: MapWidget + ?Sized,
    {
        for handle in self.live.drain(..) {
            widget.remove_marker(handle);
        }
    }

    /// Handles of live markers, in creation order.
    pub fn handles(&self) -> &[MarkerHandle] {
        &self.live
    }

    /// Number of live markers.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no marker is live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
