// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Map widget adapters.
//!
//! [`RemoteWidget`] drives an out-of-process rendering surface over a
//! command channel; [`MockWidget`] records state in memory for tests.

mod mock;
mod protocol;
mod remote;

pub use mock::{MockFactory, MockWidget};
pub use protocol::{SurfaceCommand, SurfaceEvent, SurfaceInput};
pub use remote::{RemoteFactory, RemoteWidget};
