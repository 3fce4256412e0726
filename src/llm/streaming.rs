//! Streaming response handling

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

use futures::Stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;
use tracing::error;

use crate::errors::DsaCoachError;
use crate::errors::Result;

/// One piece of a streamed generation; the text may be absent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationChunk {
    text: Option<String>,
}

impl GenerationChunk {
    pub fn new(text: Option<String>) -> Self {
        Self { text }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn into_text(self) -> Option<String> {
        self.text
    }
}

impl From<&str> for GenerationChunk {
    fn from(text: &str) -> Self {
        Self::new(Some(text.to_string()))
    }
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<GenerationChunk>> + Send>>;

/// Lazy, finite, non-restartable stream of chunks from the LLM
pub struct StreamingResponse {
    stream: ChunkStream,
}

impl StreamingResponse {
    pub fn new(stream: ChunkStream) -> Self {
        Self { stream }
    }

    /// Stream that yields the given chunks and then ends
    pub fn from_chunks(chunks: Vec<GenerationChunk>) -> Self {
        Self::new(Box::pin(futures::stream::iter(chunks.into_iter().map(Ok))))
    }

    /// Stream that ends without producing anything
    pub fn empty() -> Self {
        Self::from_chunks(Vec::new())
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            if let Some(text) = chunk?.text() {
                result.push_str(text);
            }
        }
        Ok(result)
    }

    /// Only the non-empty text fragments, in arrival order
    pub fn fragments(self) -> impl Stream<Item = Result<String>> + Send {
        self.stream.filter_map(|chunk| async move {
            match chunk {
                Ok(chunk) => chunk.into_text().filter(|t| !t.is_empty()).map(Ok),
                Err(e) => Some(Err(e)),
            }
        })
    }

    /// Hand fragments to a consumer through a bounded channel.
    ///
    /// A spawned producer pulls from upstream and sends each fragment as it
    /// arrives. Dropping the consumer side stops the producer and releases the
    /// upstream stream, even while it is waiting for the next fragment. An
    /// upstream error ends the channel after whatever was already delivered.
    pub fn into_channel(self, capacity: usize) -> ReceiverStream<String> {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        tokio::spawn(async move {
            let fragments = self.fragments();
            futures::pin_mut!(fragments);
            let mut forwarded = 0usize;

            loop {
                let fragment = tokio::select! {
                    () = tx.closed() => {
                        debug!("Consumer went away after {forwarded} fragments, dropping upstream stream");
                        return;
                    }
                    next = fragments.next() => next,
                };
                let Some(fragment) = fragment else {
                    break;
                };

                match fragment {
                    Ok(text) => {
                        if tx.send(text).await.is_err() {
                            debug!("Consumer went away after {forwarded} fragments, dropping upstream stream");
                            return;
                        }
                        forwarded += 1;
                    }
                    Err(e) => {
                        error!("Upstream stream failed after {forwarded} fragments: {e}");
                        return;
                    }
                }
            }

            debug!("Upstream stream completed, {forwarded} fragments forwarded");
        });

        ReceiverStream::new(rx)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> ChunkStream {
        self.stream
    }
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Bytes are buffered until a full line is available so multi-byte
/// characters split across network reads decode correctly.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning the payload of every completed `data:` line
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(payload) = Self::data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line that was not newline-terminated
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        Self::data_payload(&rest)
    }

    fn data_payload(line: &[u8]) -> Option<String> {
        let line = String::from_utf8_lossy(line);
        let line = line.trim();
        line.strip_prefix("data:")
            .map(str::trim_start)
            .filter(|payload| !payload.is_empty())
            .map(ToString::to_string)
    }
}

/// Turn an SSE byte stream into a chunk stream, parsing each `data:` payload
/// with `parse`. Nothing is read from `body` until the result is polled.
pub fn decode_event_stream<S, B, E, P>(body: S, parse: P) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    P: Fn(&str) -> Result<GenerationChunk> + Send + Sync + 'static,
{
    struct State<S, P> {
        body: Pin<Box<S>>,
        decoder: SseDecoder,
        pending: VecDeque<Result<GenerationChunk>>,
        finished: bool,
        parse: P,
    }

    let state = State {
        body: Box::pin(body),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
        parse,
    };

    let stream = futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                if item.is_err() {
                    // Nothing after an error is trustworthy
                    st.pending.clear();
                    st.finished = true;
                }
                return Some((item, st));
            }
            if st.finished {
                return None;
            }

            match st.body.next().await {
                Some(Ok(bytes)) => {
                    for payload in st.decoder.push(bytes.as_ref()) {
                        st.pending.push_back((st.parse)(&payload));
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((
                        Err(DsaCoachError::HttpError(format!(
                            "Failed to read streaming chunk: {e}"
                        ))),
                        st,
                    ));
                }
                None => {
                    st.finished = true;
                    if let Some(payload) = st.decoder.finish() {
                        st.pending.push_back((st.parse)(&payload));
                    }
                }
            }
        }
    });

    Box::pin(stream)
}
