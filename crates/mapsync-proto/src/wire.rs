// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Newline-delimited JSON framing.
//!
//! One frame is one compact JSON document followed by `\n`. Compact JSON never
//! contains a raw newline, so the delimiter is unambiguous. Blank lines are
//! skipped.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::ProtoError;

/// Default maximum frame length in bytes (excluding the delimiter).
pub const MAX_FRAME: usize = 8 * 1024 * 1024;

/// Encode one value as a delimited frame.
pub fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtoError> {
    let mut out = serde_json::to_vec(value)?;
    out.push(b'\n');
    Ok(out)
}

/// Decode one frame (with or without its trailing delimiter).
pub fn decode_line<T: DeserializeOwned>(line: &[u8]) -> Result<T, ProtoError> {
    Ok(serde_json::from_slice(line.trim_ascii())?)
}

/// Accumulates raw reads and yields complete frames.
///
/// Short reads cannot desynchronize framing: bytes stay buffered until a
/// delimiter arrives.
#[derive(Debug)]
pub struct LineBuffer {
    acc: Vec<u8>,
    // Prefix of `acc` already known to hold no delimiter.
    scanned: usize,
    limit: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(MAX_FRAME)
    }
}

impl LineBuffer {
    /// Create a buffer that rejects frames longer than `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            acc: Vec::with_capacity(16 * 1024),
            scanned: 0,
            limit,
        }
    }

    /// Append freshly read bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.acc.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.acc.len()
    }

    /// Pop the next complete, non-blank frame (delimiter stripped).
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtoError> {
        loop {
            let Some(pos) = self.acc[self.scanned..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|off| self.scanned + off)
            else {
                self.scanned = self.acc.len();
                if self.acc.len() > self.limit {
                    return Err(ProtoError::FrameTooLarge { limit: self.limit });
                }
                return Ok(None);
            };
            if pos > self.limit {
                return Err(ProtoError::FrameTooLarge { limit: self.limit });
            }
            self.scanned = 0;
            let mut frame: Vec<u8> = self.acc.drain(..=pos).collect();
            frame.pop();
            if frame.trim_ascii().is_empty() {
                continue;
            }
            return Ok(Some(frame));
        }
    }
}
