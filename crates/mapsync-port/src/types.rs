// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core widget types for the port contract.

use mapsync_proto::{IconId, LatLng, ViewState, ZoneId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque handle to a rendered geometry layer.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerHandle(pub u64);

/// Opaque handle to a rendered marker.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerHandle(pub u64);

/// Icon installed by the controller; immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IconDefinition {
    /// Identifier markers refer to.
    pub id: IconId,
    /// Renderer-specific options (size, anchor, url...).
    pub options: Value,
}

/// A marker ready to render, with its icon already resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDef {
    /// Marker position.
    pub position: LatLng,
    /// Popup label.
    pub label: String,
    /// Resolved icon; `None` renders the widget's default icon.
    pub icon: Option<IconDefinition>,
}

/// Path style for a zone feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStyle {
    /// Stroke and fill color.
    pub color: String,
    /// Stroke width in pixels.
    pub weight: f64,
    /// Fill opacity in `[0, 1]`.
    pub fill_opacity: f64,
}

impl ZoneStyle {
    /// Resting style of a zone.
    pub fn base(color: &str) -> Self {
        Self {
            color: color.to_owned(),
            weight: 1.0,
            fill_opacity: 0.35,
        }
    }

    /// Style of a hovered zone.
    pub fn emphasized(color: &str) -> Self {
        Self {
            color: color.to_owned(),
            weight: 3.0,
            fill_opacity: 0.6,
        }
    }
}

/// Raw event reported by a widget.
#[derive(Clone, Debug, PartialEq)]
pub enum WidgetEvent {
    /// The widget finished loading.
    Ready,
    /// A pan or zoom ended; carries the viewport at that moment.
    ViewChanged {
        /// Viewport reported with the event.
        view: ViewState,
    },
    /// Click on the base map (not on a zone).
    MapClick(LatLng),
    /// Pointer entered a zone feature.
    ZoneOver(ZoneId),
    /// Pointer left a zone feature.
    ZoneOut(ZoneId),
    /// Click on a zone feature.
    ZoneClick(ZoneId),
    /// Pointer entered a marker.
    MarkerOver(MarkerHandle),
}
