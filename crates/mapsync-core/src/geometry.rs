// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Zone geometry batching.
//!
//! Zone features are queued one `geojson/add` at a time and committed by
//! `geojson/flush` as a single layer that replaces whatever was drawn before.

use mapsync_port::{
    Feature, FeatureCollection, Geometry, LayerHandle, MapWidget, RenderError, Ring,
    ZoneProperties, ZoneStyle,
};
use mapsync_proto::{AddZone, LatLng, ShapeKind, ZoneId};
use serde_json::Value;

/// A queued zone feature. Points stay raw until the batch is flushed.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneFeature {
    /// Zone identifier.
    pub zone_id: ZoneId,
    /// One ring or a sequence of rings.
    pub points: Value,
    /// Hover tooltip.
    pub tooltip: String,
    /// Zone color.
    pub color: String,
    /// Explicit shape; `None` falls back to [`classify_points`].
    pub shape: Option<ShapeKind>,
}

impl From<AddZone> for ZoneFeature {
    fn from(p: AddZone) -> Self {
        Self {
            zone_id: p.zone_id,
            points: p.points,
            tooltip: p.tooltip,
            color: p.color,
            shape: p.shape,
        }
    }
}

impl ZoneFeature {
    /// Shape this feature will be rendered as.
    pub fn shape(&self) -> ShapeKind {
        self.shape.unwrap_or_else(|| classify_points(&self.points))
    }

    fn properties(&self) -> ZoneProperties {
        ZoneProperties {
            zone_id: self.zone_id.clone(),
            tooltip: self.tooltip.clone(),
            color: self.color.clone(),
        }
    }

    /// Convert into a renderable feature.
    pub fn to_feature(&self) -> Result<Feature, RenderError> {
        let geometry = self.geometry().map_err(|err| match err {
            RenderError::InvalidGeometry(msg) => {
                RenderError::InvalidGeometry(format!("zone {}: {msg}", self.zone_id))
            }
            other => other,
        })?;
        Ok(Feature {
            geometry,
            properties: self.properties(),
        })
    }

    fn geometry(&self) -> Result<Geometry, RenderError> {
        Ok(match self.shape() {
            ShapeKind::Polygon => Geometry::Polygon(vec![ring(&self.points)?]),
            ShapeKind::MultiPolygon => Geometry::MultiPolygon(
                elements(&self.points)?
                    .iter()
                    .map(|r| ring(r).map(|r| vec![r]))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }
}

/// Structural shape heuristic.
///
/// `points` is a multi-polygon when its first element is itself a sequence of
/// coordinates rather than a single coordinate; anything else is a polygon.
/// A single polygon whose first ring element happens to be nested is
/// misclassified; callers that care should send an explicit `shape`.
pub fn classify_points(points: &Value) -> ShapeKind {
    match points.as_array().and_then(|p| p.first()) {
        Some(first @ Value::Array(_)) if !is_coordinate(first) => ShapeKind::MultiPolygon,
        _ => ShapeKind::Polygon,
    }
}

fn is_coordinate(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.first().is_some_and(Value::is_number),
        _ => false,
    }
}

fn elements(value: &Value) -> Result<&[Value], RenderError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| RenderError::InvalidGeometry(format!("expected a sequence, got {value}")))
}

fn ring(value: &Value) -> Result<Ring, RenderError> {
    elements(value)?
        .iter()
        .map(|c| {
            LatLng::from_value(c)
                .map(LatLng::to_lng_lat)
                .map_err(|err| RenderError::InvalidGeometry(err.to_string()))
        })
        .collect()
}

#[derive(Debug)]
struct CommittedLayer {
    handle: LayerHandle,
    features: FeatureCollection,
}

/// Queue of zone features plus the single layer currently on screen.
#[derive(Debug, Default)]
pub struct GeometryBatch {
    queue: Vec<ZoneFeature>,
    current: Option<CommittedLayer>,
}

impl GeometryBatch {
    /// Create an empty batch with nothing rendered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a feature for the next flush.
    pub fn add(&mut self, zone: ZoneFeature) {
        self.queue.push(zone);
    }

    /// Features waiting for the next flush, in insertion order.
    pub fn queued(&self) -> &[ZoneFeature] {
        &self.queue
    }

    /// Handle of the layer on screen.
    pub fn current_layer(&self) -> Option<LayerHandle> {
        self.current.as_ref().map(|l| l.handle)
    }

    /// Features of the layer on screen.
    pub fn current_features(&self) -> Option<&FeatureCollection> {
        self.current.as_ref().map(|l| &l.features)
    }

    /// Properties of a zone in the layer on screen.
    pub fn zone(&self, zone: &ZoneId) -> Option<&ZoneProperties> {
        self.current.as_ref()?.features.zone(zone)
    }

    /// Commit the queue as one layer.
    ///
    /// The queue is emptied and the previous layer removed before anything can
    /// fail, so a rejected batch is never resubmitted and two layers never
    /// coexist. On error no layer is left on screen.
    pub fn flush<W>(&mut self, widget: &mut W) -> Result<LayerHandle, RenderError>
    where
        W: MapWidget + ?Sized,
    {
        let queued = std::mem::take(&mut self.queue);
        if let Some(old) = self.current.take() {
            widget.remove_geometry_layer(old.handle);
        }
        let features = FeatureCollection {
            features: queued
                .iter()
                .map(ZoneFeature::to_feature)
                .collect::<Result<_, _>>()?,
        };
        let handle = widget.add_geometry_layer(&features)?;
        self.current = Some(CommittedLayer { handle, features });
        Ok(handle)
    }

    /// Hover: emphasize the zone and show its properties.
    pub fn zone_over<W>(&self, widget: &mut W, zone: &ZoneId) -> bool
    where
        W: MapWidget + ?Sized,
    {
        let Some(layer) = &self.current else {
            return false;
        };
        let Some(props) = layer.features.zone(zone) else {
            return false;
        };
        widget.set_zone_style(layer.handle, props, &ZoneStyle::emphasized(&props.color));
        widget.set_info_panel(Some(props));
        true
    }

    /// Hover-out: restore the resting style and clear the info panel.
    pub fn zone_out<W>(&self, widget: &mut W, zone: &ZoneId) -> bool
    where
        W: MapWidget + ?Sized,
    {
        let Some(layer) = &self.current else {
            return false;
        };
        let Some(props) = layer.features.zone(zone) else {
            return false;
        };
        widget.set_zone_style(layer.handle, props, &ZoneStyle::base(&props.color));
        widget.set_info_panel(None);
        true
    }

    /// Drop the queue and remove the layer on screen.
    pub fn clear<W>(&mut self, widget: &mut W)
    where
        W: MapWidget + ?Sized,
    {
        self.queue.clear();
        if let Some(old) = self.current.take() {
            widget.remove_geometry_layer(old.handle);
        }
    }
}
