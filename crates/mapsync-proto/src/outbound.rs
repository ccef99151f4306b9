// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Outbound catalog (module -> controller).

use serde::{Deserialize, Serialize};

use crate::{Envelope, MapId, ProtoError, StepId, ViewState, ZoneId};

/// `onDidEnterStep` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnterStep {
    /// Step the upstream source entered.
    pub step_id: StepId,
}

/// `onDidLoad` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Load {
    /// Session whose widget became ready.
    pub id: MapId,
}

/// `onDidChangeView` payload: the settled viewport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewChange {
    /// Reporting session.
    pub id: MapId,
    /// Final viewport after the quiet period.
    #[serde(flatten)]
    pub view: ViewState,
}

/// `onDidClickMap` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClickMap {
    /// Clicked session.
    pub id: MapId,
    /// Click latitude.
    pub lat: f64,
    /// Click longitude.
    pub lng: f64,
}

/// `onDidClickZone` payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClickZone {
    /// Clicked session.
    pub id: MapId,
    /// Zone whose feature was clicked.
    pub zone_id: ZoneId,
}

/// Event reported to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// `onDidEnterStep`.
    DidEnterStep(EnterStep),
    /// `onDidLoad`.
    DidLoad(Load),
    /// `onDidChangeView`.
    DidChangeView(ViewChange),
    /// `onDidClickMap`.
    DidClickMap(ClickMap),
    /// `onDidClickZone`.
    DidClickZone(ClickZone),
}

impl Outbound {
    /// Canonical tag for this event.
    pub fn tag(&self) -> &'static str {
        match self {
            Outbound::DidEnterStep(_) => "onDidEnterStep",
            Outbound::DidLoad(_) => "onDidLoad",
            Outbound::DidChangeView(_) => "onDidChangeView",
            Outbound::DidClickMap(_) => "onDidClickMap",
            Outbound::DidClickZone(_) => "onDidClickZone",
        }
    }

    /// Encode into an envelope.
    pub fn to_envelope(&self) -> Result<Envelope, ProtoError> {
        let data = match self {
            Outbound::DidEnterStep(p) => serde_json::to_value(p)?,
            Outbound::DidLoad(p) => serde_json::to_value(p)?,
            Outbound::DidChangeView(p) => serde_json::to_value(p)?,
            Outbound::DidClickMap(p) => serde_json::to_value(p)?,
            Outbound::DidClickZone(p) => serde_json::to_value(p)?,
        };
        Ok(Envelope::new(self.tag(), data))
    }

    /// Decode an envelope (controller side). Unknown tags yield `Ok(None)`.
    pub fn from_envelope(env: Envelope) -> Result<Option<Self>, ProtoError> {
        let Envelope { message, data } = env;
        let event = match message.as_str() {
            "onDidEnterStep" => Outbound::DidEnterStep(serde_json::from_value(data)?),
            "onDidLoad" => Outbound::DidLoad(serde_json::from_value(data)?),
            "onDidChangeView" => Outbound::DidChangeView(serde_json::from_value(data)?),
            "onDidClickMap" => Outbound::DidClickMap(serde_json::from_value(data)?),
            "onDidClickZone" => Outbound::DidClickZone(serde_json::from_value(data)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}
