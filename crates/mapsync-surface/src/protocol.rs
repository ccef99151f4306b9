// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Rendering surface wire protocol.
//!
//! Commands flow host -> surface and events flow surface -> host, one JSON
//! object per line, discriminated by `type`.

use mapsync_port::{
    FeatureCollection, LatLng, LatLngBounds, LayerHandle, MarkerDef, MarkerHandle, ViewState,
    WidgetEvent, ZoneProperties, ZoneStyle,
};
use mapsync_proto::{InitializeMap, MapId, StepId, ZoneId};
use serde::{Deserialize, Serialize};

/// Widget call forwarded to the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SurfaceCommand {
    /// Mount a new map.
    CreateMap {
        /// Initialization payload as received from the controller.
        #[serde(flatten)]
        init: InitializeMap,
    },
    /// Center and zoom.
    SetView {
        /// Target map.
        map_id: MapId,
        /// New center.
        center: LatLng,
        /// New zoom.
        zoom: f64,
    },
    /// Zoom only.
    SetZoom {
        /// Target map.
        map_id: MapId,
        /// New zoom.
        zoom: f64,
    },
    /// Fit the viewport to bounds.
    FitBounds {
        /// Target map.
        map_id: MapId,
        /// Bounds to fit.
        bounds: LatLngBounds,
    },
    /// Replace legend content.
    SetLegend {
        /// Target map.
        map_id: MapId,
        /// Legend HTML/text.
        content: String,
    },
    /// Toggle the loading indicator.
    SetLoading {
        /// Target map.
        map_id: MapId,
        /// Indicator visibility.
        visible: bool,
    },
    /// Render a feature collection as one layer.
    AddGeometryLayer {
        /// Target map.
        map_id: MapId,
        /// Handle allocated by the host.
        layer: LayerHandle,
        /// Features to draw.
        features: FeatureCollection,
    },
    /// Remove a layer.
    RemoveGeometryLayer {
        /// Target map.
        map_id: MapId,
        /// Layer to remove.
        layer: LayerHandle,
    },
    /// Restyle one zone of a layer.
    SetZoneStyle {
        /// Target map.
        map_id: MapId,
        /// Layer holding the zone.
        layer: LayerHandle,
        /// Zone to restyle.
        zone_id: ZoneId,
        /// New style.
        style: ZoneStyle,
    },
    /// Show or clear the info panel.
    SetInfoPanel {
        /// Target map.
        map_id: MapId,
        /// Properties to display; `None` clears the panel.
        info: Option<ZoneProperties>,
    },
    /// Render one marker.
    AddMarker {
        /// Target map.
        map_id: MapId,
        /// Handle allocated by the host.
        marker: MarkerHandle,
        /// Marker definition with its icon resolved.
        def: MarkerDef,
    },
    /// Destroy one marker.
    RemoveMarker {
        /// Target map.
        map_id: MapId,
        /// Marker to remove.
        marker: MarkerHandle,
    },
    /// Open a marker popup.
    OpenPopup {
        /// Target map.
        map_id: MapId,
        /// Marker whose popup opens.
        marker: MarkerHandle,
    },
    /// Unmount a map.
    Dispose {
        /// Target map.
        map_id: MapId,
    },
}

impl SurfaceCommand {
    /// Map this command targets.
    pub fn map_id(&self) -> &MapId {
        match self {
            SurfaceCommand::CreateMap { init } => &init.map_id,
            SurfaceCommand::SetView { map_id, .. }
            | SurfaceCommand::SetZoom { map_id, .. }
            | SurfaceCommand::FitBounds { map_id, .. }
            | SurfaceCommand::SetLegend { map_id, .. }
            | SurfaceCommand::SetLoading { map_id, .. }
            | SurfaceCommand::AddGeometryLayer { map_id, .. }
            | SurfaceCommand::RemoveGeometryLayer { map_id, .. }
            | SurfaceCommand::SetZoneStyle { map_id, .. }
            | SurfaceCommand::SetInfoPanel { map_id, .. }
            | SurfaceCommand::AddMarker { map_id, .. }
            | SurfaceCommand::RemoveMarker { map_id, .. }
            | SurfaceCommand::OpenPopup { map_id, .. }
            | SurfaceCommand::Dispose { map_id } => map_id,
        }
    }
}

/// Event reported by the surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SurfaceEvent {
    /// The map finished loading.
    Ready {
        /// Reporting map.
        map_id: MapId,
    },
    /// A pan ended.
    MoveEnd {
        /// Reporting map.
        map_id: MapId,
        /// Viewport after the pan.
        view: ViewState,
    },
    /// A zoom ended.
    ZoomEnd {
        /// Reporting map.
        map_id: MapId,
        /// Viewport after the zoom.
        view: ViewState,
    },
    /// Click on the base map.
    Click {
        /// Reporting map.
        map_id: MapId,
        /// Clicked position.
        at: LatLng,
    },
    /// Pointer entered a zone.
    ZoneOver {
        /// Reporting map.
        map_id: MapId,
        /// Hovered zone.
        zone_id: ZoneId,
    },
    /// Pointer left a zone.
    ZoneOut {
        /// Reporting map.
        map_id: MapId,
        /// Zone left.
        zone_id: ZoneId,
    },
    /// Click on a zone.
    ZoneClick {
        /// Reporting map.
        map_id: MapId,
        /// Clicked zone.
        zone_id: ZoneId,
    },
    /// Pointer entered a marker.
    MarkerOver {
        /// Reporting map.
        map_id: MapId,
        /// Hovered marker.
        marker: MarkerHandle,
    },
    /// The hosting content entered a step.
    StepEntered {
        /// Step entered.
        step_id: StepId,
    },
}

/// A surface event resolved to its destination.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceInput {
    /// Event for one map's widget.
    Widget {
        /// Target map.
        map_id: MapId,
        /// Widget event.
        event: WidgetEvent,
    },
    /// Step notification, not tied to a map.
    StepEntered(StepId),
}

impl From<SurfaceEvent> for SurfaceInput {
    fn from(ev: SurfaceEvent) -> Self {
        let widget = |map_id, event| SurfaceInput::Widget { map_id, event };
        match ev {
            SurfaceEvent::Ready { map_id } => widget(map_id, WidgetEvent::Ready),
            SurfaceEvent::MoveEnd { map_id, view } | SurfaceEvent::ZoomEnd { map_id, view } => {
                widget(map_id, WidgetEvent::ViewChanged { view })
            }
            SurfaceEvent::Click { map_id, at } => widget(map_id, WidgetEvent::MapClick(at)),
            SurfaceEvent::ZoneOver { map_id, zone_id } => {
                widget(map_id, WidgetEvent::ZoneOver(zone_id))
            }
            SurfaceEvent::ZoneOut { map_id, zone_id } => {
                widget(map_id, WidgetEvent::ZoneOut(zone_id))
            }
            SurfaceEvent::ZoneClick { map_id, zone_id } => {
                widget(map_id, WidgetEvent::ZoneClick(zone_id))
            }
            SurfaceEvent::MarkerOver { map_id, marker } => {
                widget(map_id, WidgetEvent::MarkerOver(marker))
            }
            SurfaceEvent::StepEntered { step_id } => SurfaceInput::StepEntered(step_id),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn commands_are_type_tagged_camel_case() {
        let cmd = SurfaceCommand::SetZoneStyle {
            map_id: MapId::from(1),
            layer: LayerHandle(3),
            zone_id: ZoneId::from("z"),
            style: ZoneStyle::emphasized("red"),
        };
        assert_eq!(
            serde_json::to_value(&cmd).unwrap(),
            json!({
                "type": "setZoneStyle",
                "mapId": 1,
                "layer": 3,
                "zoneId": "z",
                "style": {"color": "red", "weight": 3.0, "fillOpacity": 0.6}
            })
        );
    }

    #[test]
    fn create_map_flattens_the_initialize_payload() {
        let value = json!({
            "type": "createMap",
            "mapId": "m",
            "height": 320,
            "options": {"zoomControl": false}
        });
        let cmd: SurfaceCommand = serde_json::from_value(value).unwrap();
        assert_eq!(cmd.map_id(), &MapId::from("m"));
        let SurfaceCommand::CreateMap { init } = cmd else {
            unreachable!("decoded {cmd:?}");
        };
        assert_eq!(init.height, Some(json!(320)));
        assert_eq!(init.options, json!({"zoomControl": false}));
    }

    #[test]
    fn events_resolve_to_widget_inputs() {
        let ev: SurfaceEvent = serde_json::from_value(json!({
            "type": "click", "mapId": 2, "at": [10.5, 20.25]
        }))
        .unwrap();
        assert_eq!(
            SurfaceInput::from(ev),
            SurfaceInput::Widget {
                map_id: MapId::from(2),
                event: WidgetEvent::MapClick(LatLng::new(10.5, 20.25).unwrap()),
            }
        );

        let ev: SurfaceEvent = serde_json::from_value(json!({
            "type": "zoomEnd", "mapId": 2,
            "view": {
                "northLat": 1.0, "eastLng": 1.0, "southLat": 0.0, "westLng": 0.0, "zoomLevel": 9.0
            }
        }))
        .unwrap();
        assert!(matches!(
            SurfaceInput::from(ev),
            SurfaceInput::Widget { event: WidgetEvent::ViewChanged { .. }, .. }
        ));

        let ev: SurfaceEvent =
            serde_json::from_value(json!({"type": "stepEntered", "stepId": 7})).unwrap();
        assert_eq!(SurfaceInput::from(ev), SurfaceInput::StepEntered(StepId::from(7)));
    }
}
