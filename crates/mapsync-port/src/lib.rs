// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Map widget port contract for mapsync sessions.
//!
//! This crate defines the contract between a map session and the widget that
//! actually draws tiles, zones and markers. Sessions own all state-machine
//! behavior; widgets only render what they are told and report what the user
//! did.
//!
//! # Design Principles
//!
//! - **Widgets are dumb**: They render commands and report raw events. No
//!   debouncing, batching or reconciliation.
//! - **No time ownership**: Timing is the session's concern.
//! - **Handles, not references**: Layers and markers are addressed by
//!   opaque handles the widget hands out.

use thiserror::Error;

mod feature;
mod port;
mod types;

pub use feature::{Feature, FeatureCollection, Geometry, Ring, ZoneProperties};
pub use mapsync_proto::{LatLng, LatLngBounds, ViewState};
pub use port::{MapWidget, WidgetFactory};
pub use types::{IconDefinition, LayerHandle, MarkerDef, MarkerHandle, WidgetEvent, ZoneStyle};

/// Error type for widget-side failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Zone geometry could not be turned into renderable features.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// A backend-specific error occurred.
    #[error("backend error: {0}")]
    Backend(String),
}
