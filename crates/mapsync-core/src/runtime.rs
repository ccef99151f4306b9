// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Cooperative event loop.
//!
//! Commands, widget events and timer expiries are all processed on one task,
//! one at a time. A timer callback never runs in the middle of a command.

use std::time::Instant;

use mapsync_port::{WidgetEvent, WidgetFactory};
use mapsync_proto::{Inbound, MapId, StepId};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{EventSink, RegistryError, SessionRegistry};

/// Anything the loop reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    /// Decoded controller command.
    Controller(Inbound),
    /// Raw event from a map widget.
    Widget {
        /// Session the widget belongs to.
        map_id: MapId,
        /// The event.
        event: WidgetEvent,
    },
    /// The upstream content source entered a step.
    StepEntered(StepId),
}

impl<F, S> SessionRegistry<F, S>
where
    F: WidgetFactory,
    S: EventSink,
{
    /// Apply one input at `now`.
    pub fn dispatch(&mut self, input: HostInput, now: Instant) -> Result<(), RegistryError> {
        match input {
            HostInput::Controller(msg) => self.handle(msg),
            HostInput::Widget { map_id, event } => {
                self.handle_widget_event(&map_id, event, now);
                Ok(())
            }
            HostInput::StepEntered(step) => {
                self.step_entered(step);
                Ok(())
            }
        }
    }
}

/// Drive `registry` until every input sender is dropped.
pub async fn run<F, S>(registry: &mut SessionRegistry<F, S>, mut inputs: mpsc::Receiver<HostInput>)
where
    F: WidgetFactory,
    S: EventSink,
{
    loop {
        let deadline = registry.next_deadline();
        tokio::select! {
            input = inputs.recv() => {
                let Some(input) = input else {
                    debug!("input channel closed");
                    break;
                };
                if let Err(err) = registry.dispatch(input, now()) {
                    warn!(error = %err, "command failed");
                }
            }
            () = sleep_until(deadline) => registry.poll_timers(now()),
        }
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::time::Duration;

    use super::*;
    use crate::RegistryConfig;
    use mapsync_proto::{InitializeMap, LatLng, LatLngBounds, Outbound, ViewState};
    use mapsync_surface::MockFactory;
    use serde_json::Value;

    fn view(i: u32) -> ViewState {
        let c = f64::from(i);
        ViewState::from_bounds(
            &LatLngBounds::from_corners(
                LatLng::new(c, c).unwrap(),
                LatLng::new(c + 1.0, c + 1.0).unwrap(),
            ),
            5.0,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn pan_burst_yields_one_report_with_the_last_view() {
        let mut registry =
            SessionRegistry::new(MockFactory::default(), Vec::new(), RegistryConfig::default());
        let (tx, rx) = mpsc::channel(16);
        let id = MapId::from(1);

        let feeder = tokio::spawn({
            let id = id.clone();
            async move {
                tx.send(HostInput::Controller(Inbound::Initialize(InitializeMap {
                    map_id: id.clone(),
                    layer: None,
                    height: None,
                    options: Value::Null,
                    layer_options: Value::Null,
                })))
                .await
                .unwrap();
                for i in 1..=10 {
                    tx.send(HostInput::Widget {
                        map_id: id.clone(),
                        event: WidgetEvent::ViewChanged { view: view(i) },
                    })
                    .await
                    .unwrap();
                    tokio::time::sleep(Duration::from_millis(15)).await;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });

        run(&mut registry, rx).await;
        feeder.await.unwrap();

        let reports: Vec<_> = registry
            .sink()
            .iter()
            .filter_map(|e| match e {
                Outbound::DidChangeView(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, id);
        assert_eq!(reports[0].view, view(10));
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_pans_report_each_settled_view() {
        let mut registry =
            SessionRegistry::new(MockFactory::default(), Vec::new(), RegistryConfig::default());
        let (tx, rx) = mpsc::channel(16);
        let id = MapId::from("m");

        let feeder = tokio::spawn({
            let id = id.clone();
            async move {
                tx.send(HostInput::Controller(Inbound::Initialize(InitializeMap {
                    map_id: id.clone(),
                    layer: None,
                    height: None,
                    options: Value::Null,
                    layer_options: Value::Null,
                })))
                .await
                .unwrap();
                for i in 1..=3 {
                    tx.send(HostInput::Widget {
                        map_id: id.clone(),
                        event: WidgetEvent::ViewChanged { view: view(i) },
                    })
                    .await
                    .unwrap();
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        });

        run(&mut registry, rx).await;
        feeder.await.unwrap();

        let views: Vec<_> = registry
            .sink()
            .iter()
            .filter_map(|e| match e {
                Outbound::DidChangeView(v) => Some(v.view),
                _ => None,
            })
            .collect();
        assert_eq!(views, vec![view(1), view(2), view(3)]);
    }
}
