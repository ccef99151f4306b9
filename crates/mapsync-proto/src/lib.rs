// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Controller wire schema for mapsync map sessions.
//!
//! Every message exchanged with the controller is an [`Envelope`]: a string
//! `message` tag plus a JSON `data` payload. Inbound envelopes decode into
//! [`Inbound`] commands; engine events encode from [`Outbound`]. Envelopes
//! travel as newline-delimited JSON (see [`wire`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

mod coords;
mod inbound;
mod outbound;
pub mod wire;

pub use coords::{LatLng, LatLngBounds, ViewState};
pub use inbound::{
    tags, AddZone, CreateIcon, FitBounds, Inbound, InitializeMap, MapRef, MarkerSpec, SetView,
    SetZoom, ShapeKind, UpdateLegend, UpdateMarkers,
};
pub use outbound::{ClickMap, ClickZone, EnterStep, Load, Outbound, ViewChange};

/// Default Unix socket path for the controller channel.
///
/// Prefers a per-user runtime dir (XDG_RUNTIME_DIR) and falls back to `/tmp`
/// when unavailable.
pub fn default_controller_socket() -> PathBuf {
    runtime_dir().join("mapsync-controller.sock")
}

/// Default Unix socket path for the render-surface channel.
pub fn default_surface_socket() -> PathBuf {
    runtime_dir().join("mapsync-surface.sock")
}

fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// Tagged message-plus-payload unit exchanged with the controller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// Message tag (e.g., "map/view", "onDidLoad").
    pub message: String,
    /// Message-specific body. Missing bodies decode as `null`.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Envelope {
    /// Build an envelope from a tag and payload.
    pub fn new(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Controller-assigned identifier. Controllers may use numbers or strings;
/// the original form is preserved so it can be echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer identifier.
    Int(i64),
    /// String identifier.
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! key_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Key);

        impl From<i64> for $name {
            fn from(n: i64) -> Self {
                Self(Key::Int(n))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(Key::Text(s.to_owned()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Key::Text(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

key_type!(
    /// Identifier of one map session.
    MapId
);
key_type!(
    /// Identifier of an installed icon definition.
    IconId
);
key_type!(
    /// Identifier of a zone feature, echoed back on click.
    ZoneId
);
key_type!(
    /// Identifier of a step reported by the upstream step source.
    StepId
);

/// Error type for envelope decoding and framing.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// A coordinate was missing, non-numeric or non-finite.
    #[error("malformed coordinate: {0}")]
    InvalidCoordinate(String),
    /// A known message tag carried a payload that does not match its schema.
    #[error("malformed `{tag}` payload: {source}")]
    Payload {
        /// Message tag whose payload failed to decode.
        tag: &'static str,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// Raw JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// A single frame exceeded the configured size limit.
    #[error("frame exceeds {limit} bytes")]
    FrameTooLarge {
        /// Maximum accepted frame length.
        limit: usize,
    },
}
