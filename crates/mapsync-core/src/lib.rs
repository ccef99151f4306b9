// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Map session synchronization engine.
//!
//! A [`SessionRegistry`] routes controller commands to per-map
//! [`MapSession`]s. Each session composes three behaviors around its widget:
//!
//! - a [`ViewReporter`] that turns bursts of pan/zoom events into one settled
//!   `onDidChangeView` report per quiet period,
//! - a [`GeometryBatch`] that queues zone features and commits them as one
//!   atomic layer replacement,
//! - a [`MarkerSet`] that replaces the whole marker collection on each update.
//!
//! Everything runs on one cooperative loop ([`runtime::run`]); timers never
//! interleave with command handling.

pub mod debounce;
pub mod geometry;
pub mod icons;
pub mod markers;
pub mod registry;
pub mod runtime;
pub mod session;
pub mod sink;
pub mod view;

pub use debounce::Debouncer;
pub use geometry::{classify_points, GeometryBatch, ZoneFeature};
pub use icons::IconRegistry;
pub use markers::MarkerSet;
pub use registry::{RegistryConfig, RegistryError, SessionRegistry};
pub use runtime::HostInput;
pub use session::MapSession;
pub use sink::EventSink;
pub use view::{ViewReporter, DEFAULT_VIEW_DEBOUNCE};
