// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! GeoJSON-shaped feature collection handed to widgets.
//!
//! Positions use GeoJSON order (`[lng, lat]`).

use mapsync_proto::ZoneId;
use serde::{Deserialize, Serialize};

/// One linear ring of `[lng, lat]` positions.
pub type Ring = Vec<[f64; 2]>;

/// Polygonal geometry of a zone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    /// Single polygon (outer ring only).
    Polygon(Vec<Ring>),
    /// One polygon per ring.
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    /// GeoJSON type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

/// Properties carried by every zone feature; shown in the info panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneProperties {
    /// Zone identifier.
    pub zone_id: ZoneId,
    /// Hover tooltip.
    pub tooltip: String,
    /// Zone color.
    pub color: String,
}

/// A single zone feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    /// Feature geometry.
    pub geometry: Geometry,
    /// Feature properties.
    pub properties: ZoneProperties,
}

/// Ordered collection rendered as one layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    /// Features in insertion order.
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Properties of the first feature belonging to `zone`.
    pub fn zone(&self, zone: &ZoneId) -> Option<&ZoneProperties> {
        self.features
            .iter()
            .map(|f| &f.properties)
            .find(|p| &p.zone_id == zone)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn collection_serializes_as_geojson() {
        let fc = FeatureCollection {
            features: vec![Feature {
                geometry: Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]),
                properties: ZoneProperties {
                    zone_id: ZoneId::from(1),
                    tooltip: "t".into(),
                    color: "red".into(),
                },
            }],
        };
        assert_eq!(
            serde_json::to_value(&fc).unwrap(),
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]
                    },
                    "properties": {"zoneId": 1, "tooltip": "t", "color": "red"}
                }]
            })
        );
    }
}
