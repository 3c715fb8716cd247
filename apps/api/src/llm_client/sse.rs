//! Server-sent event decoding for streamed chat completions.
//!
//! Network chunks carry no alignment guarantees: an event, or a multi-byte
//! character inside one, may be split across any number of chunks. Bytes are
//! buffered until a blank line closes the event and only then decoded.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use crate::llm_client::{LlmError, TextStream};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Text(String),
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feeds raw bytes and returns every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        // CR only ever appears as part of a line ending; JSON escapes it.
        self.buffer
            .extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..end + 2).collect();
            parse_event(&raw[..end], &mut events);
        }
        events
    }

    /// Flushes a trailing event the upstream closed without a blank line.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let raw = std::mem::take(&mut self.buffer);
        let mut events = Vec::new();
        parse_event(&raw, &mut events);
        events
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

fn parse_event(raw: &[u8], events: &mut Vec<SseEvent>) {
    let text = String::from_utf8_lossy(raw);
    for line in text.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            events.push(SseEvent::Done);
            return;
        }
        if data.is_empty() {
            continue;
        }
        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => {
                let piece = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .filter(|p| !p.is_empty());
                if let Some(piece) = piece {
                    events.push(SseEvent::Text(piece));
                }
            }
            Err(e) => debug!(error = %e, "Skipping undecodable stream event"),
        }
    }
}

struct DecodeState<S> {
    upstream: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turns a raw SSE byte stream into text chunks, in arrival order.
///
/// The returned stream ends at `[DONE]`, at upstream EOF, or right after
/// yielding the first transport error. Dropping it drops the upstream body.
pub fn decode_text_stream<S, E>(upstream: S) -> TextStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Send + 'static,
    LlmError: From<E>,
{
    let state = DecodeState {
        upstream: Box::pin(upstream),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Some((Ok(chunk), state));
            }
            if state.finished {
                return None;
            }

            let events = match state.upstream.next().await {
                Some(Ok(bytes)) => state.decoder.push(&bytes),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(LlmError::from(e)), state));
                }
                None => {
                    state.finished = true;
                    state.decoder.finish()
                }
            };

            for event in events {
                match event {
                    SseEvent::Text(text) => state.pending.push_back(text),
                    SseEvent::Done => {
                        state.finished = true;
                        break;
                    }
                }
            }
        }
    }))
}
