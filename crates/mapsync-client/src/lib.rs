// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Client helper for driving the map host over its controller socket
//! (newline-delimited JSON envelopes).

use anyhow::Result;
use mapsync_proto::wire::{decode_line, encode_line, LineBuffer};
use mapsync_proto::{Envelope, Inbound, Outbound};
use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream as AsyncUnixStream;

/// Minimal async controller over a Unix socket.
pub struct ControllerClient {
    stream: AsyncUnixStream,
    lines: LineBuffer,
}

impl ControllerClient {
    /// Connect to the host's controller socket.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let stream = AsyncUnixStream::connect(path).await?;
        Ok(Self::from_stream(stream))
    }

    fn from_stream(stream: AsyncUnixStream) -> Self {
        Self {
            stream,
            lines: LineBuffer::default(),
        }
    }

    /// Send one command.
    pub async fn send(&mut self, msg: &Inbound) -> Result<()> {
        self.send_envelope(&msg.to_envelope()?).await
    }

    /// Send a raw envelope (e.g. a tag this crate does not model).
    pub async fn send_envelope(&mut self, env: &Envelope) -> Result<()> {
        self.stream.write_all(&encode_line(env)?).await?;
        Ok(())
    }

    /// Wait for the next event. Returns `Ok(None)` when the host closes the
    /// connection on a frame boundary. Events with unknown tags are skipped.
    pub async fn poll_event(&mut self) -> Result<Option<Outbound>> {
        let mut chunk = [0u8; 4096];
        loop {
            while let Some(frame) = self.lines.next_frame()? {
                let env: Envelope = decode_line(&frame)?;
                if let Some(event) = Outbound::from_envelope(env)? {
                    return Ok(Some(event));
                }
            }
            let n = self.stream.read(&mut chunk).await?;
            if n == 0 {
                if self.lines.buffered() == 0 {
                    return Ok(None);
                }
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("truncated frame: {} bytes buffered", self.lines.buffered()),
                )
                .into());
            }
            self.lines.push(&chunk[..n]);
        }
    }

    /// Expose the underlying stream (e.g., for select!).
    pub fn stream(&mut self) -> &mut AsyncUnixStream {
        &mut self.stream
    }
}

/// Blocking helper: connect, send `commands`, then stream events on a
/// background thread.
///
/// The connect happens synchronously so callers can surface errors. The
/// receiver disconnects when the host closes the socket or sends a frame
/// that does not decode.
pub fn connect_events(
    path: impl AsRef<Path>,
    commands: &[Inbound],
) -> io::Result<Receiver<Outbound>> {
    let mut stream = UnixStream::connect(path)?;
    for cmd in commands {
        let env = cmd
            .to_envelope()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        let line =
            encode_line(&env).map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
        stream.write_all(&line)?;
    }

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            let Ok(env) = decode_line::<Envelope>(line.as_bytes()) else {
                break;
            };
            match Outbound::from_envelope(env) {
                Ok(Some(event)) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => continue,
                Err(_) => break,
            }
        }
    });
    Ok(rx)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use mapsync_proto::{ClickMap, Load, MapId, MapRef};
    use serde_json::json;
    use tokio::io::AsyncBufReadExt;
    use tokio::task;

    #[tokio::test]
    async fn poll_event_handles_partial_frames_without_losing_bytes() {
        let (client_stream, mut host_stream) = AsyncUnixStream::pair().unwrap();
        let click = Outbound::DidClickMap(ClickMap {
            id: MapId::from(2),
            lat: 1.25,
            lng: -3.5,
        });
        let mut bytes = encode_line(&click.to_envelope().unwrap()).unwrap();
        bytes.extend(encode_line(&Envelope::new("onDidSomethingNew", json!({}))).unwrap());
        let load = Outbound::DidLoad(Load { id: MapId::from(2) });
        bytes.extend(encode_line(&load.to_envelope().unwrap()).unwrap());

        let client_task = task::spawn(async move {
            let mut client = ControllerClient::from_stream(client_stream);
            let first = client.poll_event().await.unwrap();
            let second = client.poll_event().await.unwrap();
            let end = client.poll_event().await.unwrap();
            (first, second, end)
        });

        host_stream.write_all(&bytes[..5]).await.unwrap();
        task::yield_now().await;
        host_stream.write_all(&bytes[5..]).await.unwrap();
        drop(host_stream);

        let (first, second, end) = client_task.await.unwrap();
        assert_eq!(first, Some(click));
        assert_eq!(second, Some(Outbound::DidLoad(Load { id: MapId::from(2) })));
        assert_eq!(end, None);
    }

    #[tokio::test]
    async fn truncated_frame_is_an_error() {
        let (client_stream, mut host_stream) = AsyncUnixStream::pair().unwrap();
        host_stream.write_all(b"{\"message\":\"onDidLoad\"").await.unwrap();
        drop(host_stream);
        let mut client = ControllerClient::from_stream(client_stream);
        assert!(client.poll_event().await.is_err());
    }

    #[tokio::test]
    async fn send_writes_one_envelope_per_line() {
        let (client_stream, host_stream) = AsyncUnixStream::pair().unwrap();
        let mut client = ControllerClient::from_stream(client_stream);
        client
            .send(&Inbound::FlushZones(MapRef {
                map_id: MapId::from("m"),
            }))
            .await
            .unwrap();
        client.send(&Inbound::EnterStep).await.unwrap();

        let mut lines = tokio::io::BufReader::new(host_stream).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let first: Envelope = decode_line(line.as_bytes()).unwrap();
        assert_eq!(first, Envelope::new("geojson/flush", json!({"mapId": "m"})));
        let line = lines.next_line().await.unwrap().unwrap();
        let second: Envelope = decode_line(line.as_bytes()).unwrap();
        assert_eq!(second.message, "enterStep");
    }
}
