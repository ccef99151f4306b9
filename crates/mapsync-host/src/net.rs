// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Socket plumbing between the registry loop and its two peers.
//!
//! Each listener serves one connection at a time. A frame that fails to
//! decode drops the connection; the listener then waits for the next one.

use anyhow::Result;
use mapsync_core::HostInput;
use mapsync_proto::wire::{decode_line, encode_line, LineBuffer};
use mapsync_proto::{Envelope, Inbound, Outbound};
use mapsync_surface::{SurfaceCommand, SurfaceEvent, SurfaceInput};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

const READ_CHUNK: usize = 16 * 1024;

/// Accept controllers forever.
///
/// Events emitted while no controller is connected are discarded as they
/// arrive.
pub async fn controller_loop(
    listener: UnixListener,
    inputs: mpsc::Sender<HostInput>,
    mut events: mpsc::UnboundedReceiver<Outbound>,
) -> Result<()> {
    loop {
        let (stream, stale) = accept_discarding(&listener, &mut events).await?;
        info!(stale, "controller connected");
        let (reader, writer) = stream.into_split();
        if let Err(err) = serve_controller(reader, writer, &inputs, &mut events).await {
            warn!(?err, "dropping controller connection");
        }
        info!("controller disconnected");
    }
}

/// Wait for the next controller, dropping events until it connects.
async fn accept_discarding(
    listener: &UnixListener,
    events: &mut mpsc::UnboundedReceiver<Outbound>,
) -> Result<(UnixStream, usize)> {
    let mut dropped = 0usize;
    loop {
        tokio::select! {
            accepted = listener.accept() => return Ok((accepted?.0, dropped)),
            Some(event) = events.recv() => {
                trace!(?event, "no controller; event dropped");
                dropped += 1;
            }
        }
    }
}

/// Accept rendering surfaces forever. Commands queue until one connects.
pub async fn surface_loop(
    listener: UnixListener,
    inputs: mpsc::Sender<HostInput>,
    mut commands: mpsc::UnboundedReceiver<SurfaceCommand>,
) -> Result<()> {
    loop {
        let (stream, _) = listener.accept().await?;
        info!("surface connected");
        let (reader, writer) = stream.into_split();
        if let Err(err) = serve_surface(reader, writer, &inputs, &mut commands).await {
            warn!(?err, "dropping surface connection");
        }
        info!("surface disconnected");
    }
}

/// Pump one controller connection until it closes or sends a bad frame.
pub async fn serve_controller<R, W>(
    mut reader: R,
    mut writer: W,
    inputs: &mpsc::Sender<HostInput>,
    events: &mut mpsc::UnboundedReceiver<Outbound>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LineBuffer::default();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        tokio::select! {
            n = reader.read(&mut chunk) => {
                let n = n?;
                if n == 0 {
                    return Ok(());
                }
                lines.push(&chunk[..n]);
                while let Some(frame) = lines.next_frame()? {
                    let env: Envelope = decode_line(&frame)?;
                    let tag = env.message.clone();
                    match Inbound::from_envelope(env)? {
                        Some(msg) => inputs.send(HostInput::Controller(msg)).await?,
                        None => debug!(%tag, "unknown message dropped"),
                    }
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    return Ok(());
                };
                writer.write_all(&encode_line(&event.to_envelope()?)?).await?;
            }
        }
    }
}

/// Pump one surface connection until it closes or sends a bad frame.
pub async fn serve_surface<R, W>(
    mut reader: R,
    mut writer: W,
    inputs: &mpsc::Sender<HostInput>,
    commands: &mut mpsc::UnboundedReceiver<SurfaceCommand>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = LineBuffer::default();
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        tokio::select! {
            n = reader.read(&mut chunk) => {
                let n = n?;
                if n == 0 {
                    return Ok(());
                }
                lines.push(&chunk[..n]);
                while let Some(frame) = lines.next_frame()? {
                    let event: SurfaceEvent = decode_line(&frame)?;
                    inputs.send(host_input(event.into())).await?;
                }
            }
            cmd = commands.recv() => {
                let Some(cmd) = cmd else {
                    return Ok(());
                };
                writer.write_all(&encode_line(&cmd)?).await?;
            }
        }
    }
}

fn host_input(input: SurfaceInput) -> HostInput {
    match input {
        SurfaceInput::Widget { map_id, event } => HostInput::Widget { map_id, event },
        SurfaceInput::StepEntered(step) => HostInput::StepEntered(step),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use mapsync_port::WidgetEvent;
    use mapsync_proto::{EnterStep, MapId, StepId};
    use serde_json::json;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, BufReader};

    #[tokio::test]
    async fn controller_frames_become_inputs_and_events_flow_back() {
        let (host_side, mut peer) = UnixStream::pair().unwrap();
        let (reader, writer) = host_side.into_split();
        let (input_tx, mut input_rx) = mpsc::channel(8);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let server = tokio::spawn(async move {
            serve_controller(reader, writer, &input_tx, &mut event_rx).await
        });

        // Split one frame across two writes; unknown tags are skipped.
        let init = encode_line(&Envelope::new("initialize", json!({"mapId": 3}))).unwrap();
        let (a, b) = init.split_at(7);
        peer.write_all(a).await.unwrap();
        peer.write_all(b).await.unwrap();
        peer.write_all(b"{\"message\":\"map/rotate\",\"data\":{}}\n")
            .await
            .unwrap();
        peer.write_all(b"{\"message\":\"enterStep\"}\n").await.unwrap();

        let first = input_rx.recv().await.unwrap();
        assert!(matches!(
            first,
            HostInput::Controller(Inbound::Initialize(ref p)) if p.map_id == MapId::from(3)
        ));
        assert_eq!(input_rx.recv().await.unwrap(), HostInput::Controller(Inbound::EnterStep));

        event_tx
            .send(Outbound::DidEnterStep(EnterStep {
                step_id: StepId::from(7),
            }))
            .unwrap();
        let mut line = String::new();
        BufReader::new(&mut peer).read_line(&mut line).await.unwrap();
        let env: Envelope = decode_line(line.as_bytes()).unwrap();
        assert_eq!(env, Envelope::new("onDidEnterStep", json!({"stepId": 7})));

        drop(peer);
        assert!(server.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn malformed_controller_payload_drops_the_connection() {
        let (host_side, mut peer) = UnixStream::pair().unwrap();
        let (reader, writer) = host_side.into_split();
        let (input_tx, mut input_rx) = mpsc::channel(8);
        let (_event_tx, mut event_rx) = mpsc::unbounded_channel();

        peer.write_all(b"{\"message\":\"map/zoom\",\"data\":{\"mapId\":1,\"zoom\":\"far\"}}\n")
            .await
            .unwrap();
        let res = serve_controller(reader, writer, &input_tx, &mut event_rx).await;
        assert!(res.is_err());
        assert!(input_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn surface_events_route_and_commands_are_written() {
        let (host_side, mut peer) = UnixStream::pair().unwrap();
        let (reader, writer) = host_side.into_split();
        let (input_tx, mut input_rx) = mpsc::channel(8);
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();

        command_tx
            .send(SurfaceCommand::Dispose {
                map_id: MapId::from(1),
            })
            .unwrap();
        let server = tokio::spawn(async move {
            serve_surface(reader, writer, &input_tx, &mut command_rx).await
        });

        let mut line = String::new();
        let mut peer_reader = BufReader::new(&mut peer);
        peer_reader.read_line(&mut line).await.unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&line).unwrap(),
            json!({"type": "dispose", "mapId": 1})
        );

        peer.write_all(b"{\"type\":\"ready\",\"mapId\":1}\n")
            .await
            .unwrap();
        peer.write_all(b"{\"type\":\"stepEntered\",\"stepId\":\"intro\"}\n")
            .await
            .unwrap();
        assert_eq!(
            input_rx.recv().await.unwrap(),
            HostInput::Widget {
                map_id: MapId::from(1),
                event: WidgetEvent::Ready,
            }
        );
        assert_eq!(
            input_rx.recv().await.unwrap(),
            HostInput::StepEntered(StepId::from("intro"))
        );

        drop(peer);
        assert!(server.await.unwrap().is_ok());
    }

    fn step_event(step: i64) -> Outbound {
        Outbound::DidEnterStep(EnterStep {
            step_id: StepId::from(step),
        })
    }

    #[tokio::test]
    async fn events_without_a_controller_are_dropped_as_they_arrive() {
        let dir = tempfile::tempdir().unwrap();
        let listener = UnixListener::bind(dir.path().join("controller.sock")).unwrap();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        for step in 0..100 {
            event_tx.send(step_event(step)).unwrap();
        }

        let waiting = tokio::time::timeout(
            Duration::from_millis(50),
            accept_discarding(&listener, &mut event_rx),
        )
        .await;
        assert!(waiting.is_err());
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn a_new_controller_only_sees_fresh_events() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("controller.sock");
        let listener = UnixListener::bind(&path).unwrap();
        let (input_tx, mut input_rx) = mpsc::channel(8);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let server = tokio::spawn(controller_loop(listener, input_tx, event_rx));

        for step in 0..100 {
            event_tx.send(step_event(step)).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        let mut peer = UnixStream::connect(&path).await.unwrap();
        peer.write_all(b"{\"message\":\"enterStep\"}\n").await.unwrap();
        assert_eq!(input_rx.recv().await.unwrap(), HostInput::Controller(Inbound::EnterStep));

        event_tx.send(step_event(500)).unwrap();
        let mut line = String::new();
        BufReader::new(&mut peer).read_line(&mut line).await.unwrap();
        let env: Envelope = decode_line(line.as_bytes()).unwrap();
        assert_eq!(env, Envelope::new("onDidEnterStep", json!({"stepId": 500})));

        server.abort();
    }
}
