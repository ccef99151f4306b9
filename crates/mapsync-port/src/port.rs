// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Widget port traits defining the renderer contract.

use mapsync_proto::{InitializeMap, LatLng, LatLngBounds, ViewState};

use crate::{
    FeatureCollection, LayerHandle, MarkerDef, MarkerHandle, RenderError, WidgetEvent,
    ZoneProperties, ZoneStyle,
};

/// Map widget port.
///
/// Implementors draw what they are told. Sessions decide when to draw.
///
/// # Layers
///
/// A session keeps at most one geometry layer alive. It always removes the
/// previous handle before adding a new collection, so implementors never need
/// to reconcile overlapping layers themselves.
pub trait MapWidget {
    /// Center the viewport on `center` at `zoom`.
    fn set_view(&mut self, center: LatLng, zoom: f64);

    /// Change zoom, keeping the center.
    fn set_zoom(&mut self, zoom: f64);

    /// Fit the viewport to `bounds`.
    fn fit_bounds(&mut self, bounds: &LatLngBounds);

    /// Current viewport. Read fresh on every call.
    fn view(&self) -> ViewState;

    /// Replace legend content verbatim.
    fn set_legend(&mut self, content: &str);

    /// Toggle the loading indicator.
    fn set_loading(&mut self, visible: bool);

    /// Render `features` as one layer.
    fn add_geometry_layer(&mut self, features: &FeatureCollection)
        -> Result<LayerHandle, RenderError>;

    /// Remove a layer previously returned by `add_geometry_layer`.
    fn remove_geometry_layer(&mut self, layer: LayerHandle);

    /// Restyle every feature of `layer` whose zone matches `props.zone_id`.
    fn set_zone_style(&mut self, layer: LayerHandle, props: &ZoneProperties, style: &ZoneStyle);

    /// Show zone properties in the info panel, or clear it with `None`.
    fn set_info_panel(&mut self, info: Option<&ZoneProperties>);

    /// Render one marker.
    fn add_marker(&mut self, marker: &MarkerDef) -> MarkerHandle;

    /// Destroy one marker.
    fn remove_marker(&mut self, marker: MarkerHandle);

    /// Open the label popup of a marker.
    fn open_popup(&mut self, marker: MarkerHandle);

    /// Observe a raw event before the session acts on it.
    ///
    /// Adapters whose state is reported by the event stream (e.g. a remote
    /// renderer announcing its viewport) refresh their caches here.
    fn observe(&mut self, _event: &WidgetEvent) {}

    /// Release all resources.
    fn dispose(&mut self);
}

/// Creates widgets for new sessions.
pub trait WidgetFactory {
    /// Widget type produced by this factory.
    type Widget: MapWidget;

    /// Construct and mount a widget for `init.map_id`.
    fn create(&mut self, init: &InitializeMap) -> Result<Self::Widget, RenderError>;
}
