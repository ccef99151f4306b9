// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Mock widget for headless testing of map sessions.
//!
//! MockWidget tracks widget state in maps without rendering anything. Use it
//! to verify layer replacement, marker reconciliation and hover styling.

use std::collections::{BTreeMap, HashMap};

use mapsync_port::{
    FeatureCollection, LatLng, LatLngBounds, LayerHandle, MapWidget, MarkerDef, MarkerHandle,
    RenderError, ViewState, WidgetEvent, WidgetFactory, ZoneProperties, ZoneStyle,
};
use mapsync_proto::{InitializeMap, ZoneId};

/// Mock map widget.
#[derive(Debug, Default)]
pub struct MockWidget {
    /// Current viewport.
    pub view: ViewState,
    /// Last center set through `set_view`.
    pub center: Option<LatLng>,
    /// Last bounds passed to `fit_bounds`.
    pub fitted: Option<LatLngBounds>,
    /// Legend content.
    pub legend: String,
    /// Loading indicator visibility.
    pub loading: bool,
    /// Live geometry layers.
    pub layers: BTreeMap<LayerHandle, FeatureCollection>,
    /// Live markers.
    pub markers: BTreeMap<MarkerHandle, MarkerDef>,
    /// Styles applied per zone.
    pub zone_styles: HashMap<(LayerHandle, ZoneId), ZoneStyle>,
    /// Info panel content.
    pub info_panel: Option<ZoneProperties>,
    /// Markers whose popup was opened, in order.
    pub popups: Vec<MarkerHandle>,
    /// Whether dispose has been called.
    pub disposed: bool,
    /// Reject the next `add_geometry_layer` call.
    pub fail_next_render: bool,
    next_handle: u64,
}

impl MockWidget {
    /// Create a new mock widget.
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn span(zoom: f64) -> (f64, f64) {
        let scale = zoom.exp2();
        (90.0 / scale, 180.0 / scale)
    }
}

impl MapWidget for MockWidget {
    fn set_view(&mut self, center: LatLng, zoom: f64) {
        let (dlat, dlng) = Self::span(zoom);
        let bounds = LatLngBounds {
            south: center.lat - dlat,
            west: center.lng - dlng,
            north: center.lat + dlat,
            east: center.lng + dlng,
        };
        self.center = Some(center);
        self.view = ViewState::from_bounds(&bounds, zoom);
    }

    fn set_zoom(&mut self, zoom: f64) {
        let center = self.view.bounds().center();
        self.set_view(center, zoom);
    }

    fn fit_bounds(&mut self, bounds: &LatLngBounds) {
        self.fitted = Some(*bounds);
        self.view = ViewState::from_bounds(bounds, self.view.zoom_level);
    }

    fn view(&self) -> ViewState {
        self.view
    }

    fn set_legend(&mut self, content: &str) {
        content.clone_into(&mut self.legend);
    }

    fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
    }

    fn add_geometry_layer(
        &mut self,
        features: &FeatureCollection,
    ) -> Result<LayerHandle, RenderError> {
        if std::mem::take(&mut self.fail_next_render) {
            return Err(RenderError::Backend("mock render failure".into()));
        }
        let handle = LayerHandle(self.handle());
        self.layers.insert(handle, features.clone());
        Ok(handle)
    }

    fn remove_geometry_layer(&mut self, layer: LayerHandle) {
        self.layers.remove(&layer);
        self.zone_styles.retain(|(l, _), _| *l != layer);
    }

    fn set_zone_style(&mut self, layer: LayerHandle, props: &ZoneProperties, style: &ZoneStyle) {
        self.zone_styles
            .insert((layer, props.zone_id.clone()), style.clone());
    }

    fn set_info_panel(&mut self, info: Option<&ZoneProperties>) {
        self.info_panel = info.cloned();
    }

    fn add_marker(&mut self, marker: &MarkerDef) -> MarkerHandle {
        let handle = MarkerHandle(self.handle());
        self.markers.insert(handle, marker.clone());
        handle
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        self.markers.remove(&marker);
    }

    fn open_popup(&mut self, marker: MarkerHandle) {
        self.popups.push(marker);
    }

    fn observe(&mut self, event: &WidgetEvent) {
        if let WidgetEvent::ViewChanged { view } = event {
            self.view = *view;
        }
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Factory producing [`MockWidget`]s.
#[derive(Debug, Default)]
pub struct MockFactory {
    /// Widgets created so far.
    pub created: usize,
    /// Make every `create` call fail.
    pub fail: bool,
}

impl WidgetFactory for MockFactory {
    type Widget = MockWidget;

    fn create(&mut self, init: &InitializeMap) -> Result<MockWidget, RenderError> {
        if self.fail {
            return Err(RenderError::Backend(format!(
                "mock factory refused map {}",
                init.map_id
            )));
        }
        self.created += 1;
        Ok(MockWidget::new())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn set_view_centers_the_viewport() {
        let mut w = MockWidget::new();
        w.set_view(LatLng::new(10.0, 20.0).unwrap(), 3.0);
        assert_eq!(w.view().bounds().center(), LatLng::new(10.0, 20.0).unwrap());
        assert!((w.view().zoom_level - 3.0).abs() < f64::EPSILON);

        w.set_zoom(5.0);
        assert_eq!(w.view().bounds().center(), LatLng::new(10.0, 20.0).unwrap());
        assert!(w.view().north_lat - w.view().south_lat < 10.0);
    }

    #[test]
    fn handles_are_unique_across_layers_and_markers() {
        let mut w = MockWidget::new();
        let a = w.add_geometry_layer(&FeatureCollection::default()).unwrap();
        let m = w.add_marker(&MarkerDef {
            position: LatLng::new(0.0, 0.0).unwrap(),
            label: String::new(),
            icon: None,
        });
        let b = w.add_geometry_layer(&FeatureCollection::default()).unwrap();
        assert!(a < b);
        assert_ne!(a.0, m.0);
        assert_ne!(b.0, m.0);
    }

    #[test]
    fn fail_next_render_fails_once() {
        let mut w = MockWidget::new();
        w.fail_next_render = true;
        assert!(w.add_geometry_layer(&FeatureCollection::default()).is_err());
        assert!(w.add_geometry_layer(&FeatureCollection::default()).is_ok());
    }
}
