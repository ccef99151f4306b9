// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Session registry and inbound dispatch.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use mapsync_port::{RenderError, WidgetEvent, WidgetFactory};
use mapsync_proto::{
    EnterStep, Envelope, Inbound, InitializeMap, MapId, Outbound, ProtoError, StepId,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{EventSink, IconRegistry, MapSession, DEFAULT_VIEW_DEBOUNCE};

/// Registry tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Quiet period before `onDidChangeView` is reported.
    pub view_debounce: Duration,
    /// Ignore `initialize` for an id that is already live. When false, the
    /// old session is disposed and replaced.
    pub strict_session_ids: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            view_debounce: DEFAULT_VIEW_DEBOUNCE,
            strict_session_ids: true,
        }
    }
}

/// Failures surfaced by the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A known tag carried a malformed payload.
    #[error(transparent)]
    Protocol(#[from] ProtoError),
    /// The widget factory refused to build a map.
    #[error("failed to create map {map_id}: {source}")]
    CreateWidget {
        /// Session that was being initialized.
        map_id: MapId,
        /// Factory error.
        #[source]
        source: RenderError,
    },
}

/// Routes controller commands and widget events to map sessions.
pub struct SessionRegistry<F: WidgetFactory, S> {
    factory: F,
    sink: S,
    config: RegistryConfig,
    sessions: HashMap<MapId, MapSession<F::Widget>>,
    icons: IconRegistry,
    current_step: Option<StepId>,
}

impl<F, S> SessionRegistry<F, S>
where
    F: WidgetFactory,
    S: EventSink,
{
    /// Create an empty registry.
    pub fn new(factory: F, sink: S, config: RegistryConfig) -> Self {
        Self {
            factory,
            sink,
            config,
            sessions: HashMap::new(),
            icons: IconRegistry::new(),
            current_step: None,
        }
    }

    /// Decode and apply one envelope. Unknown tags are dropped.
    pub fn handle_envelope(&mut self, env: Envelope) -> Result<(), RegistryError> {
        let tag = env.message.clone();
        match Inbound::from_envelope(env)? {
            Some(msg) => self.handle(msg),
            None => {
                debug!(%tag, "unknown message dropped");
                Ok(())
            }
        }
    }

    /// Apply one decoded command.
    pub fn handle(&mut self, msg: Inbound) -> Result<(), RegistryError> {
        match msg {
            Inbound::EnterStep => {
                match &self.current_step {
                    Some(step) => {
                        let event = Outbound::DidEnterStep(EnterStep {
                            step_id: step.clone(),
                        });
                        self.sink.emit(event);
                    }
                    None => debug!("enterStep before any step was entered"),
                }
                Ok(())
            }
            Inbound::CreateIcon(p) => {
                if self.icons.install(p.icon_id.clone(), p.options).is_some() {
                    debug!(icon = %p.icon_id, "icon redefined");
                }
                Ok(())
            }
            Inbound::Initialize(init) => self.initialize(&init),
            other => {
                self.route(other);
                Ok(())
            }
        }
    }

    fn initialize(&mut self, init: &InitializeMap) -> Result<(), RegistryError> {
        if self.config.strict_session_ids && self.sessions.contains_key(&init.map_id) {
            warn!(map = %init.map_id, "duplicate initialize ignored");
            return Ok(());
        }
        // The old session stays live if the factory refuses the replacement.
        let widget = self
            .factory
            .create(init)
            .map_err(|source| RegistryError::CreateWidget {
                map_id: init.map_id.clone(),
                source,
            })?;
        let session = MapSession::new(init.map_id.clone(), widget, self.config.view_debounce);
        match self.sessions.insert(init.map_id.clone(), session) {
            Some(old) => {
                info!(map = %init.map_id, "replaced existing session");
                old.dispose();
            }
            None => info!(map = %init.map_id, "session created"),
        }
        Ok(())
    }

    fn route(&mut self, msg: Inbound) {
        let Some(map_id) = msg.map_id() else {
            return;
        };
        let Some(session) = self.sessions.get_mut(map_id) else {
            debug!(map = %map_id, tag = msg.tag(), "no such map; dropped");
            return;
        };
        match msg {
            Inbound::SetView(p) => session.set_view(p.center, p.zoom),
            Inbound::SetZoom(p) => session.set_zoom(p.zoom),
            Inbound::FitBounds(p) => session.fit_bounds(&p.bounds),
            Inbound::UpdateMarkers(p) => session.update_markers(&p.markers, &self.icons),
            Inbound::UpdateLegend(p) => session.set_legend(p.content),
            Inbound::AddZone(p) => session.add_zone(p.into()),
            Inbound::FlushZones(_) => session.flush_zones(),
            Inbound::ShowLoading(_) => session.set_loading(true),
            Inbound::HideLoading(_) => session.set_loading(false),
            Inbound::EnterStep | Inbound::CreateIcon(_) | Inbound::Initialize(_) => {}
        }
    }

    /// Feed a widget event to its session.
    pub fn handle_widget_event(&mut self, map_id: &MapId, event: WidgetEvent, now: Instant) {
        let Some(session) = self.sessions.get_mut(map_id) else {
            debug!(map = %map_id, ?event, "event for unknown map dropped");
            return;
        };
        if let Some(out) = session.handle_widget_event(event, now) {
            self.sink.emit(out);
        }
    }

    /// The upstream source entered a step: cache it and notify.
    pub fn step_entered(&mut self, step: StepId) {
        self.current_step = Some(step.clone());
        self.sink
            .emit(Outbound::DidEnterStep(EnterStep { step_id: step }));
    }

    /// Earliest pending timer across all sessions.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.sessions.values().filter_map(MapSession::deadline).min()
    }

    /// Fire every due timer.
    pub fn poll_timers(&mut self, now: Instant) {
        for session in self.sessions.values_mut() {
            if let Some(out) = session.poll_timers(now) {
                self.sink.emit(out);
            }
        }
    }

    /// Session by id.
    pub fn session(&self, id: &MapId) -> Option<&MapSession<F::Widget>> {
        self.sessions.get(id)
    }

    /// Mutable session by id.
    pub fn session_mut(&mut self, id: &MapId) -> Option<&mut MapSession<F::Widget>> {
        self.sessions.get_mut(id)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Installed icons.
    pub fn icons(&self) -> &IconRegistry {
        &self.icons
    }

    /// Last step entered, if any.
    pub fn current_step(&self) -> Option<&StepId> {
        self.current_step.as_ref()
    }

    /// The widget factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The outbound sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable outbound sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Dispose every session.
    pub fn shutdown(&mut self) {
        for (id, session) in self.sessions.drain() {
            debug!(map = %id, "disposing session");
            session.dispose();
        }
    }
}
