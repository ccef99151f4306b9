// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geographic coordinate types shared by envelopes and the widget port.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ProtoError;

/// A validated latitude/longitude pair (degrees).
///
/// Decodes from either `[lat, lng]` or `{lat, lng}` (`lon` is accepted as an
/// alias). Missing, non-numeric and non-finite components are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Build a coordinate, rejecting non-finite components.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ProtoError> {
        if lat.is_finite() && lng.is_finite() {
            Ok(Self { lat, lng })
        } else {
            Err(ProtoError::InvalidCoordinate(format!(
                "non-finite component in ({lat}, {lng})"
            )))
        }
    }

    /// Parse a coordinate from a raw JSON value.
    pub fn from_value(value: &Value) -> Result<Self, ProtoError> {
        let (lat, lng) = match value {
            Value::Array(pair) => (pair.first(), pair.get(1)),
            Value::Object(obj) => (obj.get("lat"), obj.get("lng").or_else(|| obj.get("lon"))),
            other => {
                return Err(ProtoError::InvalidCoordinate(format!(
                    "expected [lat, lng] or {{lat, lng}}, got {other}"
                )))
            }
        };
        Self::new(component(lat, "lat", value)?, component(lng, "lng", value)?)
    }

    /// GeoJSON position order (`[lng, lat]`).
    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

fn component(raw: Option<&Value>, name: &str, whole: &Value) -> Result<f64, ProtoError> {
    raw.and_then(Value::as_f64).ok_or_else(|| {
        ProtoError::InvalidCoordinate(format!("missing or non-numeric {name} in {whole}"))
    })
}

impl<'de> Deserialize<'de> for LatLng {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        LatLng::from_value(&value).map_err(de::Error::custom)
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLngBounds {
    /// Southern edge latitude.
    pub south: f64,
    /// Western edge longitude.
    pub west: f64,
    /// Northern edge latitude.
    pub north: f64,
    /// Eastern edge longitude.
    pub east: f64,
}

impl LatLngBounds {
    /// Bounds spanning two arbitrary corners.
    pub fn from_corners(a: LatLng, b: LatLng) -> Self {
        Self {
            south: a.lat.min(b.lat),
            west: a.lng.min(b.lng),
            north: a.lat.max(b.lat),
            east: a.lng.max(b.lng),
        }
    }

    /// Smallest bounds containing every point. `None` when `points` is empty.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::from_corners(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    /// Grow the bounds to include `p`.
    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.west = self.west.min(p.lng);
        self.north = self.north.max(p.lat);
        self.east = self.east.max(p.lng);
    }

    /// Midpoint of the bounds.
    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }

    /// Whether `p` lies inside (edges inclusive).
    pub fn contains(&self, p: LatLng) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lng)
    }
}

impl<'de> Deserialize<'de> for LatLngBounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Edges {
            south: f64,
            west: f64,
            north: f64,
            east: f64,
        }

        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Array(points) => {
                let points = points
                    .iter()
                    .map(LatLng::from_value)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(de::Error::custom)?;
                LatLngBounds::from_points(points)
                    .ok_or_else(|| de::Error::custom("bounds need at least one coordinate"))
            }
            Value::Object(_) => {
                let e: Edges = serde_json::from_value(value.clone()).map_err(de::Error::custom)?;
                let sw = LatLng::new(e.south, e.west).map_err(de::Error::custom)?;
                let ne = LatLng::new(e.north, e.east).map_err(de::Error::custom)?;
                Ok(LatLngBounds::from_corners(sw, ne))
            }
            other => Err(de::Error::custom(format!(
                "expected a coordinate list or {{south, west, north, east}}, got {other}"
            ))),
        }
    }
}

/// Read-only snapshot of a map widget's viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Northern edge latitude.
    pub north_lat: f64,
    /// Eastern edge longitude.
    pub east_lng: f64,
    /// Southern edge latitude.
    pub south_lat: f64,
    /// Western edge longitude.
    pub west_lng: f64,
    /// Current zoom level.
    pub zoom_level: f64,
}

impl ViewState {
    /// Snapshot from visible bounds and zoom.
    pub fn from_bounds(bounds: &LatLngBounds, zoom_level: f64) -> Self {
        Self {
            north_lat: bounds.north,
            east_lng: bounds.east,
            south_lat: bounds.south,
            west_lng: bounds.west,
            zoom_level,
        }
    }

    /// Visible bounds of this snapshot.
    pub fn bounds(&self) -> LatLngBounds {
        LatLngBounds {
            south: self.south_lat,
            west: self.west_lng,
            north: self.north_lat,
            east: self.east_lng,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn latlng_accepts_pairs_and_objects() {
        let pair: LatLng = serde_json::from_value(json!([51.5, -0.12])).unwrap();
        let obj: LatLng = serde_json::from_value(json!({"lat": 51.5, "lng": -0.12})).unwrap();
        let lon: LatLng = serde_json::from_value(json!({"lat": 51.5, "lon": -0.12})).unwrap();
        assert_eq!(pair, obj);
        assert_eq!(obj, lon);
    }

    #[test]
    fn latlng_rejects_missing_or_non_numeric_components() {
        for bad in [json!({"lat": 1.0}), json!(["a", 2.0]), json!([1.0]), json!("1,2")] {
            assert!(matches!(
                LatLng::from_value(&bad),
                Err(ProtoError::InvalidCoordinate(_))
            ));
        }
        assert!(LatLng::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn bounds_cover_every_point_regardless_of_order() {
        let b: LatLngBounds =
            serde_json::from_value(json!([[10.0, 5.0], [-2.0, 7.0], [4.0, -1.0]])).unwrap();
        assert_eq!(
            b,
            LatLngBounds {
                south: -2.0,
                west: -1.0,
                north: 10.0,
                east: 7.0
            }
        );
        assert!(b.contains(LatLng::new(0.0, 0.0).unwrap()));
        assert!(serde_json::from_value::<LatLngBounds>(json!([])).is_err());
    }

    #[test]
    fn view_state_uses_camel_case_field_names() {
        let bounds = LatLngBounds::from_corners(
            LatLng::new(1.0, 2.0).unwrap(),
            LatLng::new(3.0, 4.0).unwrap(),
        );
        let v = serde_json::to_value(ViewState::from_bounds(&bounds, 6.0)).unwrap();
        assert_eq!(
            v,
            json!({
                "northLat": 3.0,
                "eastLng": 4.0,
                "southLat": 1.0,
                "westLng": 2.0,
                "zoomLevel": 6.0
            })
        );
    }
}
