// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Widget adapter for an out-of-process rendering surface.

use mapsync_port::{
    FeatureCollection, LatLng, LatLngBounds, LayerHandle, MapWidget, MarkerDef, MarkerHandle,
    RenderError, ViewState, WidgetEvent, WidgetFactory, ZoneProperties, ZoneStyle,
};
use mapsync_proto::{InitializeMap, MapId};
use tokio::sync::mpsc::UnboundedSender;

use crate::SurfaceCommand;

/// Forwards widget calls to a surface as [`SurfaceCommand`]s.
///
/// The surface is the source of truth for the viewport: [`MapWidget::view`]
/// returns the last viewport the surface reported through a view event.
#[derive(Debug)]
pub struct RemoteWidget {
    map_id: MapId,
    tx: UnboundedSender<SurfaceCommand>,
    view: ViewState,
    next_handle: u64,
}

impl RemoteWidget {
    /// Adapter for `map_id` writing to `tx`.
    pub fn new(map_id: MapId, tx: UnboundedSender<SurfaceCommand>) -> Self {
        Self {
            map_id,
            tx,
            view: ViewState::default(),
            next_handle: 0,
        }
    }

    /// Map this widget renders.
    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    fn send(&self, cmd: SurfaceCommand) -> Result<(), RenderError> {
        self.tx
            .send(cmd)
            .map_err(|_| RenderError::Backend("surface channel closed".into()))
    }

    // Fire-and-forget calls have no error path on the port.
    fn post(&self, cmd: SurfaceCommand) {
        let _ = self.send(cmd);
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl MapWidget for RemoteWidget {
    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.post(SurfaceCommand::SetView {
            map_id: self.map_id.clone(),
            center,
            zoom,
        });
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.post(SurfaceCommand::SetZoom {
            map_id: self.map_id.clone(),
            zoom,
        });
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds) {
        self.post(SurfaceCommand::FitBounds {
            map_id: self.map_id.clone(),
            bounds: *bounds,
        });
    }

    fn view(&self) -> ViewState {
        self.view
    }

    fn set_legend(&mut self, content: &str) {
        self.post(SurfaceCommand::SetLegend {
            map_id: self.map_id.clone(),
            content: content.to_owned(),
        });
    }

    fn set_loading(&mut self, visible: bool) {
        self.post(SurfaceCommand::SetLoading {
            map_id: self.map_id.clone(),
            visible,
        });
    }

    fn add_geometry_layer(
        &mut self,
        features: &FeatureCollection,
    ) -> Result<LayerHandle, RenderError> {
        let layer = LayerHandle(self.handle());
        self.send(SurfaceCommand::AddGeometryLayer {
            map_id: self.map_id.clone(),
            layer,
            features: features.clone(),
        })?;
        Ok(layer)
    }

    fn remove_geometry_layer(&mut self, layer: LayerHandle) {
        self.post(SurfaceCommand::RemoveGeometryLayer {
            map_id: self.map_id.clone(),
            layer,
        });
    }

    fn set_zone_style(&mut self, layer: LayerHandle, props: &ZoneProperties, style: &ZoneStyle) {
        self.post(SurfaceCommand::SetZoneStyle {
            map_id: self.map_id.clone(),
            layer,
            zone_id: props.zone_id.clone(),
            style: style.clone(),
        });
    }

    fn set_info_panel(&mut self, info: Option<&ZoneProperties>) {
        self.post(SurfaceCommand::SetInfoPanel {
            map_id: self.map_id.clone(),
            info: info.cloned(),
        });
    }

    fn add_marker(&mut self, marker: &MarkerDef) -> MarkerHandle {
        let handle = MarkerHandle(self.handle());
        self.post(SurfaceCommand::AddMarker {
            map_id: self.map_id.clone(),
            marker: handle,
            def: marker.clone(),
        });
        handle
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.post(SurfaceCommand::RemoveMarker {
            map_id: self.map_id.clone(),
            marker,
        });
    }

    fn open_popup(&mut self, marker: MarkerHandle) {
        self.post(SurfaceCommand::OpenPopup {
            map_id: self.map_id.clone(),
            marker,
        });
    }

    fn observe(&mut self, event: &WidgetEvent) {
        if let WidgetEvent::ViewChanged { view } = event {
            self.view = *view;
        }
    }

    fn dispose(&mut self) {
        self.post(SurfaceCommand::Dispose {
            map_id: self.map_id.clone(),
        });
    }
}

/// Creates [`RemoteWidget`]s that share one surface channel.
#[derive(Debug, Clone)]
pub struct RemoteFactory {
    tx: UnboundedSender<SurfaceCommand>,
}

impl RemoteFactory {
    /// Factory writing to `tx`.
    pub fn new(tx: UnboundedSender<SurfaceCommand>) -> Self {
        Self { tx }
    }
}

impl WidgetFactory for RemoteFactory {
    type Widget = RemoteWidget;

    fn create(&mut self, init: &InitializeMap) -> Result<RemoteWidget, RenderError> {
        self.tx
            .send(SurfaceCommand::CreateMap { init: init.clone() })
            .map_err(|_| RenderError::Backend("surface channel closed".into()))?;
        Ok(RemoteWidget::new(init.map_id.clone(), self.tx.clone()))
    }
}
