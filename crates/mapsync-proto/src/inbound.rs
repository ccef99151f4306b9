// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Inbound catalog (controller -> module).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Envelope, IconId, LatLng, LatLngBounds, MapId, ProtoError, ZoneId};

/// Inbound message tags.
pub mod tags {
    /// Re-notify the current step.
    pub const ENTER_STEP: &str = "enterStep";
    /// Install or overwrite an icon definition.
    pub const ICON_CREATE: &str = "icon/create";
    /// Create a map session.
    pub const INITIALIZE: &str = "initialize";
    /// Set center and zoom.
    pub const MAP_VIEW: &str = "map/view";
    /// Set zoom only.
    pub const MAP_ZOOM: &str = "map/zoom";
    /// Fit the viewport to bounds.
    pub const MAP_FIT: &str = "map/fit";
    /// Replace the marker collection.
    pub const MARKERS_UPDATE: &str = "markers/update";
    /// Replace the legend content.
    pub const LEGEND_UPDATE: &str = "legend/update";
    /// Queue one zone feature.
    pub const GEOJSON_ADD: &str = "geojson/add";
    /// Commit queued zone features as one layer.
    pub const GEOJSON_FLUSH: &str = "geojson/flush";
    /// Show the loading indicator.
    pub const LOADING_SHOW: &str = "loading/show";
    /// Hide the loading indicator.
    pub const LOADING_HIDE: &str = "loading/false";
    /// Accepted spelling of [`LOADING_HIDE`].
    pub const LOADING_HIDE_ALIAS: &str = "loading/hide";
}

/// Explicit polygon discriminant for a zone feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    /// One ring.
    #[serde(alias = "Polygon")]
    Polygon,
    /// A sequence of rings, one polygon each.
    #[serde(alias = "MultiPolygon", alias = "multipolygon")]
    MultiPolygon,
}

/// `icon/create` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateIcon {
    /// Icon identifier referenced by markers.
    pub icon_id: IconId,
    /// Renderer-specific icon options, passed through verbatim.
    #[serde(default)]
    pub options: Value,
}

/// `initialize` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeMap {
    /// Identifier of the new session.
    pub map_id: MapId,
    /// Base tile layer URL template.
    #[serde(default)]
    pub layer: Option<String>,
    /// Container height (number of pixels or CSS length).
    #[serde(default)]
    pub height: Option<Value>,
    /// Widget options, passed through verbatim.
    #[serde(default)]
    pub options: Value,
    /// Base layer options, passed through verbatim.
    #[serde(default)]
    pub layer_options: Value,
}

/// `map/view` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetView {
    /// Target session.
    pub map_id: MapId,
    /// New center.
    pub center: LatLng,
    /// New zoom level.
    pub zoom: f64,
}

/// `map/zoom` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SetZoom {
    /// Target session.
    pub map_id: MapId,
    /// New zoom level.
    pub zoom: f64,
}

/// `map/fit` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FitBounds {
    /// Target session.
    pub map_id: MapId,
    /// Bounds to fit.
    pub bounds: LatLngBounds,
}

/// One entry of a `markers/update` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarkerSpec {
    /// Marker position (`lat`/`lng` fields).
    #[serde(flatten)]
    pub position: LatLng,
    /// Popup label.
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    /// Icon to resolve against the icon registry.
    #[serde(default)]
    pub icon: Option<IconId>,
}

/// `markers/update` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMarkers {
    /// Target session.
    pub map_id: MapId,
    /// Complete replacement marker set.
    #[serde(default, deserialize_with = "null_as_default")]
    pub markers: Vec<MarkerSpec>,
}

/// `legend/update` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLegend {
    /// Target session.
    pub map_id: MapId,
    /// Legend HTML/text, applied verbatim.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

/// `geojson/add` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddZone {
    /// Target session.
    pub map_id: MapId,
    /// Zone identifier echoed on click.
    pub zone_id: ZoneId,
    /// One ring, or a sequence of rings. Left unvalidated until flush.
    pub points: Value,
    /// Hover tooltip.
    #[serde(default, deserialize_with = "null_as_default")]
    pub tooltip: String,
    /// Fill/stroke color.
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
    /// Overrides the structural shape heuristic when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeKind>,
}

/// Payload carrying only a map id (`geojson/flush`, `loading/*`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapRef {
    /// Target session.
    pub map_id: MapId,
}

/// Decoded inbound command.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Re-emit the cached step id, if any.
    EnterStep,
    /// Install an icon definition.
    CreateIcon(CreateIcon),
    /// Create a map session.
    Initialize(InitializeMap),
    /// Set center and zoom.
    SetView(SetView),
    /// Set zoom only.
    SetZoom(SetZoom),
    /// Fit viewport to bounds.
    FitBounds(FitBounds),
    /// Replace all markers.
    UpdateMarkers(UpdateMarkers),
    /// Replace legend content.
    UpdateLegend(UpdateLegend),
    /// Queue a zone feature.
    AddZone(AddZone),
    /// Commit queued zone features.
    FlushZones(MapRef),
    /// Show the loading indicator.
    ShowLoading(MapRef),
    /// Hide the loading indicator.
    HideLoading(MapRef),
}

impl Inbound {
    /// Canonical tag for this command.
    pub fn tag(&self) -> &'static str {
        match self {
            Inbound::EnterStep => tags::ENTER_STEP,
            Inbound::CreateIcon(_) => tags::ICON_CREATE,
            Inbound::Initialize(_) => tags::INITIALIZE,
            Inbound::SetView(_) => tags::MAP_VIEW,
            Inbound::SetZoom(_) => tags::MAP_ZOOM,
            Inbound::FitBounds(_) => tags::MAP_FIT,
            Inbound::UpdateMarkers(_) => tags::MARKERS_UPDATE,
            Inbound::UpdateLegend(_) => tags::LEGEND_UPDATE,
            Inbound::AddZone(_) => tags::GEOJSON_ADD,
            Inbound::FlushZones(_) => tags::GEOJSON_FLUSH,
            Inbound::ShowLoading(_) => tags::LOADING_SHOW,
            Inbound::HideLoading(_) => tags::LOADING_HIDE,
        }
    }

    /// Session targeted by a map-scoped command. `None` for control-plane
    /// commands (`enterStep`, `icon/create`, `initialize`).
    pub fn map_id(&self) -> Option<&MapId> {
        match self {
            Inbound::EnterStep | Inbound::CreateIcon(_) | Inbound::Initialize(_) => None,
            Inbound::SetView(p) => Some(&p.map_id),
            Inbound::SetZoom(p) => Some(&p.map_id),
            Inbound::FitBounds(p) => Some(&p.map_id),
            Inbound::UpdateMarkers(p) => Some(&p.map_id),
            Inbound::UpdateLegend(p) => Some(&p.map_id),
            Inbound::AddZone(p) => Some(&p.map_id),
            Inbound::FlushZones(p) | Inbound::ShowLoading(p) | Inbound::HideLoading(p) => {
                Some(&p.map_id)
            }
        }
    }

    /// Decode an envelope. Returns `Ok(None)` for tags this build does not
    /// know; a known tag with a malformed payload is an error.
    pub fn from_envelope(env: Envelope) -> Result<Option<Self>, ProtoError> {
        let Envelope { message, data } = env;
        let msg = match message.as_str() {
            tags::ENTER_STEP => Inbound::EnterStep,
            tags::ICON_CREATE => Inbound::CreateIcon(payload(tags::ICON_CREATE, data)?),
            tags::INITIALIZE => Inbound::Initialize(payload(tags::INITIALIZE, data)?),
            tags::MAP_VIEW => Inbound::SetView(payload(tags::MAP_VIEW, data)?),
            tags::MAP_ZOOM => Inbound::SetZoom(payload(tags::MAP_ZOOM, data)?),
            tags::MAP_FIT => Inbound::FitBounds(payload(tags::MAP_FIT, data)?),
            tags::MARKERS_UPDATE => Inbound::UpdateMarkers(payload(tags::MARKERS_UPDATE, data)?),
            tags::LEGEND_UPDATE => Inbound::UpdateLegend(payload(tags::LEGEND_UPDATE, data)?),
            tags::GEOJSON_ADD => Inbound::AddZone(payload(tags::GEOJSON_ADD, data)?),
            tags::GEOJSON_FLUSH => Inbound::FlushZones(payload(tags::GEOJSON_FLUSH, data)?),
            tags::LOADING_SHOW => Inbound::ShowLoading(payload(tags::LOADING_SHOW, data)?),
            tags::LOADING_HIDE | tags::LOADING_HIDE_ALIAS => {
                Inbound::HideLoading(payload(tags::LOADING_HIDE, data)?)
            }
            _ => return Ok(None),
        };
        Ok(Some(msg))
    }

    /// Encode into an envelope (controller side).
    pub fn to_envelope(&self) -> Result<Envelope, ProtoError> {
        let data = match self {
            Inbound::EnterStep => Value::Null,
            Inbound::CreateIcon(p) => serde_json::to_value(p)?,
            Inbound::Initialize(p) => serde_json::to_value(p)?,
            Inbound::SetView(p) => serde_json::to_value(p)?,
            Inbound::SetZoom(p) => serde_json::to_value(p)?,
            Inbound::FitBounds(p) => serde_json::to_value(p)?,
            Inbound::UpdateMarkers(p) => serde_json::to_value(p)?,
            Inbound::UpdateLegend(p) => serde_json::to_value(p)?,
            Inbound::AddZone(p) => serde_json::to_value(p)?,
            Inbound::FlushZones(p) | Inbound::ShowLoading(p) | Inbound::HideLoading(p) => {
                serde_json::to_value(p)?
            }
        };
        Ok(Envelope::new(self.tag(), data))
    }
}

fn payload<T: DeserializeOwned>(tag: &'static str, data: Value) -> Result<T, ProtoError> {
    serde_json::from_value(data).map_err(|source| ProtoError::Payload { tag, source })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
