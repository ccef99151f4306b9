// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Debounced viewport reporting.

use std::time::{Duration, Instant};

use mapsync_port::MapWidget;
use mapsync_proto::{MapId, Outbound, ViewChange};

use crate::Debouncer;

/// Quiet period before a settled viewport is reported.
pub const DEFAULT_VIEW_DEBOUNCE: Duration = Duration::from_millis(200);

/// Reports a map's viewport at most once per quiet period.
///
/// Raw pan/zoom signals only re-arm the timer. The viewport is read from the
/// widget when the timer fires, so the report always reflects the final view.
#[derive(Debug, Clone)]
pub struct ViewReporter {
    debounce: Debouncer,
}

impl Default for ViewReporter {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_DEBOUNCE)
    }
}

impl ViewReporter {
    /// Create a reporter with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            debounce: Debouncer::new(delay),
        }
    }

    /// Record a raw view-change signal (pan end, zoom end).
    pub fn view_changed(&mut self, now: Instant) {
        self.debounce.trigger(now, ());
    }

    /// When the pending report is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.debounce.deadline()
    }

    /// Drop any pending report.
    pub fn cancel(&mut self) {
        self.debounce.cancel();
    }

    /// Emit `onDidChangeView` if the quiet period has elapsed.
    pub fn poll<W>(&mut self, id: &MapId, widget: &W, now: Instant) -> Option<Outbound>
    where
        W: MapWidget + ?Sized,
    {
        self.debounce.fire(now)?;
        Some(Outbound::DidChangeView(ViewChange {
            id: id.clone(),
            view: widget.view(),
        }))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use mapsync_port::{LatLng, WidgetEvent};
    use mapsync_surface::MockWidget;

    #[test]
    fn rapid_pans_report_the_final_viewport_once() {
        let id = MapId::from("m");
        let mut widget = MockWidget::new();
        let mut reporter = ViewReporter::default();
        let t0 = Instant::now();

        for i in 0..10u32 {
            let center = LatLng::new(f64::from(i), f64::from(i) * 2.0).unwrap();
            widget.set_view(center, 5.0);
            widget.observe(&WidgetEvent::ViewChanged { view: widget.view() });
            let at = t0 + Duration::from_millis(u64::from(i) * 20);
            reporter.view_changed(at);
            assert_eq!(reporter.poll(&id, &widget, at), None);
        }
        let last = t0 + Duration::from_millis(180);

        assert_eq!(reporter.poll(&id, &widget, last + Duration::from_millis(199)), None);
        let Some(Outbound::DidChangeView(report)) =
            reporter.poll(&id, &widget, last + DEFAULT_VIEW_DEBOUNCE)
        else {
            unreachable!("expected a view report");
        };
        assert_eq!(report.id, id);
        assert_eq!(report.view, widget.view());
        assert_eq!(report.view.bounds().center(), LatLng::new(9.0, 18.0).unwrap());
        assert_eq!(reporter.poll(&id, &widget, last + DEFAULT_VIEW_DEBOUNCE * 5), None);
    }

    #[test]
    fn cancelled_report_never_fires() {
        let id = MapId::from(1);
        let widget = MockWidget::new();
        let mut reporter = ViewReporter::new(Duration::from_millis(50));
        let t0 = Instant::now();
        reporter.view_changed(t0);
        reporter.cancel();
        assert_eq!(reporter.deadline(), None);
        assert_eq!(reporter.poll(&id, &widget, t0 + Duration::from_secs(1)), None);
    }
}
