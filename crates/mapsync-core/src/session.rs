// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! One map instance and its widget.

use std::time::{Duration, Instant};

use mapsync_port::{LatLng, LatLngBounds, MapWidget, WidgetEvent};
use mapsync_proto::{ClickMap, ClickZone, Load, MapId, MarkerSpec, Outbound};
use tracing::{debug, warn};

use crate::{GeometryBatch, IconRegistry, MarkerSet, ViewReporter, ZoneFeature};

/// A live map session.
///
/// Owns its widget exclusively. Commands mutate the widget immediately;
/// widget events come back through [`MapSession::handle_widget_event`] and
/// may produce controller events.
#[derive(Debug)]
pub struct MapSession<W: MapWidget> {
    id: MapId,
    widget: W,
    legend: String,
    loading: bool,
    loaded: bool,
    geometry: GeometryBatch,
    markers: MarkerSet,
    view: ViewReporter,
}

impl<W: MapWidget> MapSession<W> {
    /// Wrap a freshly created widget.
    pub fn new(id: MapId, widget: W, view_debounce: Duration) -> Self {
        Self {
            id,
            widget,
            legend: String::new(),
            loading: false,
            loaded: false,
            geometry: GeometryBatch::new(),
            markers: MarkerSet::new(),
            view: ViewReporter::new(view_debounce),
        }
    }

    /// Session id.
    pub fn id(&self) -> &MapId {
        &self.id
    }

    /// The session's widget.
    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Mutable access to the widget.
    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Current legend content.
    pub fn legend(&self) -> &str {
        &self.legend
    }

    /// Whether the loading indicator is shown.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether `onDidLoad` has been emitted.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Zone batch state.
    pub fn geometry(&self) -> &GeometryBatch {
        &self.geometry
    }

    /// Live markers.
    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// `map/view`.
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.widget.set_view(center, zoom);
    }

    /// `map/zoom`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.widget.set_zoom(zoom);
    }

    /// `map/fit`.
    pub fn fit_bounds(&mut self, bounds: &LatLngBounds) {
        self.widget.fit_bounds(bounds);
    }

    /// `markers/update`.
    pub fn update_markers(&mut self, specs: &[MarkerSpec], icons: &IconRegistry) {
        self.markers.replace(&mut self.widget, specs, icons);
    }

    /// `legend/update`.
    pub fn set_legend(&mut self, content: String) {
        self.widget.set_legend(&content);
        self.legend = content;
    }

    /// `loading/show` and `loading/false`.
    pub fn set_loading(&mut self, visible: bool) {
        self.loading = visible;
        self.widget.set_loading(visible);
    }

    /// `geojson/add`.
    pub fn add_zone(&mut self, zone: ZoneFeature) {
        self.geometry.add(zone);
    }

    /// `geojson/flush`. Render failures are logged; the session stays usable.
    pub fn flush_zones(&mut self) {
        match self.geometry.flush(&mut self.widget) {
            Ok(layer) => debug!(map = %self.id, layer = layer.0, "zone layer committed"),
            Err(err) => warn!(map = %self.id, error = %err, "zone layer rejected"),
        }
    }

    /// Translate a raw widget event into at most one controller event.
    pub fn handle_widget_event(&mut self, event: WidgetEvent, now: Instant) -> Option<Outbound> {
        self.widget.observe(&event);
        match event {
            WidgetEvent::Ready => {
                if self.loaded {
                    return None;
                }
                self.loaded = true;
                Some(Outbound::DidLoad(Load {
                    id: self.id.clone(),
                }))
            }
            WidgetEvent::ViewChanged { .. } => {
                self.view.view_changed(now);
                None
            }
            WidgetEvent::MapClick(at) => Some(Outbound::DidClickMap(ClickMap {
                id: self.id.clone(),
                lat: at.lat,
                lng: at.lng,
            })),
            WidgetEvent::ZoneOver(zone) => {
                self.geometry.zone_over(&mut self.widget, &zone);
                None
            }
            WidgetEvent::ZoneOut(zone) => {
                self.geometry.zone_out(&mut self.widget, &zone);
                None
            }
            WidgetEvent::ZoneClick(zone) => {
                if self.geometry.zone(&zone).is_none() {
                    debug!(map = %self.id, %zone, "click on a zone not in the current layer");
                    return None;
                }
                Some(Outbound::DidClickZone(ClickZone {
                    id: self.id.clone(),
                    zone_id: zone,
                }))
            }
            WidgetEvent::MarkerOver(marker) => {
                self.markers.marker_over(&mut self.widget, marker);
                None
            }
        }
    }

    /// Earliest pending timer.
    pub fn deadline(&self) -> Option<Instant> {
        self.view.deadline()
    }

    /// Fire due timers.
    pub fn poll_timers(&mut self, now: Instant) -> Option<Outbound> {
        self.view.poll(&self.id, &self.widget, now)
    }

    /// Cancel timers and release every widget resource. Returns the
    /// disposed widget.
    pub fn dispose(mut self) -> W {
        self.view.cancel();
        self.markers.clear(&mut self.widget);
        self.geometry.clear(&mut self.widget);
        self.widget.dispose();
        self.widget
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::DEFAULT_VIEW_DEBOUNCE;
    use mapsync_proto::ZoneId;
    use mapsync_surface::MockWidget;
    use serde_json::json;

    fn session() -> MapSession<MockWidget> {
        MapSession::new(MapId::from(1), MockWidget::new(), DEFAULT_VIEW_DEBOUNCE)
    }

    #[test]
    fn ready_emits_load_exactly_once() {
        let mut s = session();
        let now = Instant::now();
        assert_eq!(
            s.handle_widget_event(WidgetEvent::Ready, now),
            Some(Outbound::DidLoad(Load { id: MapId::from(1) }))
        );
        assert_eq!(s.handle_widget_event(WidgetEvent::Ready, now), None);
        assert!(s.is_loaded());
    }

    #[test]
    fn map_click_reports_coordinates() {
        let mut s = session();
        let at = LatLng::new(48.85, 2.35).unwrap();
        assert_eq!(
            s.handle_widget_event(WidgetEvent::MapClick(at), Instant::now()),
            Some(Outbound::DidClickMap(ClickMap {
                id: MapId::from(1),
                lat: 48.85,
                lng: 2.35,
            }))
        );
    }

    #[test]
    fn zone_click_is_reported_only_for_committed_zones() {
        let mut s = session();
        let now = Instant::now();
        s.add_zone(ZoneFeature {
            zone_id: ZoneId::from(4),
            points: json!([[0, 0], [0, 1], [1, 1]]),
            tooltip: String::new(),
            color: "blue".into(),
            shape: None,
        });
        assert_eq!(s.handle_widget_event(WidgetEvent::ZoneClick(ZoneId::from(4)), now), None);
        s.flush_zones();
        assert_eq!(
            s.handle_widget_event(WidgetEvent::ZoneClick(ZoneId::from(4)), now),
            Some(Outbound::DidClickZone(ClickZone {
                id: MapId::from(1),
                zone_id: ZoneId::from(4),
            }))
        );
    }

    #[test]
    fn view_changes_report_after_the_quiet_period() {
        let mut s = session();
        let t0 = Instant::now();
        s.set_view(LatLng::new(1.0, 1.0).unwrap(), 4.0);
        let view = s.widget().view();
        assert_eq!(s.handle_widget_event(WidgetEvent::ViewChanged { view }, t0), None);
        assert_eq!(s.deadline(), Some(t0 + DEFAULT_VIEW_DEBOUNCE));
        assert_eq!(s.poll_timers(t0), None);
        let Some(Outbound::DidChangeView(report)) = s.poll_timers(t0 + DEFAULT_VIEW_DEBOUNCE)
        else {
            unreachable!("expected a view report");
        };
        assert_eq!(report.view, view);
    }

    #[test]
    fn dispose_releases_layers_markers_and_timers() {
        let mut s = session();
        s.update_markers(
            &[MarkerSpec {
                position: LatLng::new(0.0, 0.0).unwrap(),
                label: "m".into(),
                icon: None,
            }],
            &IconRegistry::new(),
        );
        s.add_zone(ZoneFeature {
            zone_id: ZoneId::from(1),
            points: json!([[0, 0], [0, 1], [1, 1]]),
            tooltip: String::new(),
            color: "red".into(),
            shape: None,
        });
        s.flush_zones();
        let view = s.widget().view();
        s.handle_widget_event(WidgetEvent::ViewChanged { view }, Instant::now());

        let widget = s.dispose();
        assert!(widget.disposed);
        assert!(widget.markers.is_empty());
        assert!(widget.layers.is_empty());
    }

    #[test]
    fn legend_and_loading_are_applied_to_the_widget() {
        let mut s = session();
        s.set_legend("<b>Key</b>".into());
        s.set_loading(true);
        assert_eq!(s.legend(), "<b>Key</b>");
        assert_eq!(s.widget().legend, "<b>Key</b>");
        assert!(s.widget().loading);
        s.set_loading(false);
        assert!(!s.is_loading());
        assert!(!s.widget().loading);
    }
}
