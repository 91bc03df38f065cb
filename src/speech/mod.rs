//! Speech output.
//!
//! A single speech task consumes sentence chunks from an mpsc channel
//! and hands them to the [`Synthesizer`] collaborator one at a time.
//! Cancellation is per-response: every chunk carries the response's
//! `CancellationToken`, checked before synthesis starts — best-effort,
//! a sentence already being synthesized completes.
//!
//! Streaming responses push LLM tokens into a [`SpeechStream`], which
//! accumulates them and forwards complete sentences as they form.

use crate::error::Result;
use crate::llm::find_sentence_boundary;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Buffered sentences awaiting synthesis.
const SPEECH_CHANNEL_SIZE: usize = 16;

/// How long shutdown waits for the speech task to finish.
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocking one-utterance synthesis collaborator.
pub trait Synthesizer: Send + Sync {
    /// Synthesize and play one piece of text, returning when playback ends.
    fn synthesize(&self, text: &str) -> Result<()>;
}

/// A sentence queued for the speech task.
struct SpeechChunk {
    text: String,
    cancel: CancellationToken,
    /// Fired once the chunk has been processed (spoken or skipped).
    done: Option<oneshot::Sender<()>>,
}

/// Handle to the speech task.
///
/// One response is "current" at a time; [`cancel`](Self::cancel) stops
/// the current response and leaves the task ready for the next one.
pub struct SpeechService {
    /// Taken on shutdown so the task's channel actually closes.
    tx: Mutex<Option<mpsc::Sender<SpeechChunk>>>,
    current: Mutex<CancellationToken>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechService {
    /// Spawn the speech task over the given synthesizer.
    pub fn spawn(synthesizer: Arc<dyn Synthesizer>) -> Self {
        let (tx, rx) = mpsc::channel(SPEECH_CHANNEL_SIZE);
        let task = tokio::spawn(run_speech_task(rx, synthesizer));
        Self {
            tx: Mutex::new(Some(tx)),
            current: Mutex::new(CancellationToken::new()),
            task: Mutex::new(Some(task)),
        }
    }

    /// Speak a complete response, sentence by sentence, and wait until it
    /// has been fully spoken or cancelled.
    pub async fn speak(&self, text: &str) {
        let cancel = self.begin_response();
        let sentences = split_sentences(text);
        for sentence in sentences {
            self.send(SpeechChunk {
                text: sentence,
                cancel: cancel.clone(),
                done: None,
            })
            .await;
        }
        self.wait_processed(&cancel).await;
    }

    /// Start a streaming response. Tokens pushed into the returned stream
    /// are spoken as complete sentences form.
    pub fn begin_stream(&self) -> SpeechStream<'_> {
        let cancel = self.begin_response();
        SpeechStream {
            service: self,
            cancel,
            buffer: String::new(),
        }
    }

    /// Cancel the current response. Queued sentences are skipped; a
    /// sentence already being synthesized completes.
    pub fn cancel(&self) {
        if let Ok(current) = self.current.lock() {
            current.cancel();
        }
    }

    /// Cancel any current response and stop the speech task, waiting a
    /// bounded time for it to finish.
    pub async fn shutdown(&self) {
        self.cancel();
        // Dropping the sender closes the channel and ends the task loop.
        if let Ok(mut slot) = self.tx.lock() {
            slot.take();
        }
        let task = self.task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task
            && tokio::time::timeout(SHUTDOWN_JOIN_TIMEOUT, task).await.is_err()
        {
            warn!("speech task did not stop within shutdown timeout");
        }
    }

    /// Replace the current response token with a fresh one.
    fn begin_response(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            *current = fresh.clone();
        }
        fresh
    }

    async fn send(&self, chunk: SpeechChunk) {
        let tx = self.tx.lock().ok().and_then(|slot| slot.clone());
        let Some(tx) = tx else {
            warn!("speech task stopped, dropping sentence");
            return;
        };
        if tx.send(chunk).await.is_err() {
            warn!("speech task gone, dropping sentence");
        }
    }

    /// Send a marker chunk and wait for the task to reach it, so the
    /// session loop never polls the next input mid-response.
    async fn wait_processed(&self, cancel: &CancellationToken) {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(SpeechChunk {
            text: String::new(),
            cancel: cancel.clone(),
            done: Some(done_tx),
        })
        .await;
        let _ = done_rx.await;
    }
}

/// Accumulates streamed LLM tokens and forwards complete sentences to
/// the speech task.
pub struct SpeechStream<'a> {
    service: &'a SpeechService,
    cancel: CancellationToken,
    buffer: String,
}

impl SpeechStream<'_> {
    /// Push one token; any complete sentence in the buffer is queued.
    pub async fn push(&mut self, token: &str) {
        self.buffer.push_str(token);
        while let Some(pos) = find_sentence_boundary(&self.buffer) {
            let sentence = self.buffer[..=pos].trim().to_owned();
            if !sentence.is_empty() {
                self.service
                    .send(SpeechChunk {
                        text: sentence,
                        cancel: self.cancel.clone(),
                        done: None,
                    })
                    .await;
            }
            self.buffer = self.buffer[pos + 1..].to_owned();
        }
    }

    /// Flush the remaining buffer and wait until the response has been
    /// fully spoken or cancelled.
    pub async fn finish(self) {
        let remaining = self.buffer.trim().to_owned();
        if !remaining.is_empty() {
            self.service
                .send(SpeechChunk {
                    text: remaining,
                    cancel: self.cancel.clone(),
                    done: None,
                })
                .await;
        }
        self.service.wait_processed(&self.cancel).await;
    }
}

async fn run_speech_task(mut rx: mpsc::Receiver<SpeechChunk>, synthesizer: Arc<dyn Synthesizer>) {
    while let Some(chunk) = rx.recv().await {
        if !chunk.cancel.is_cancelled() && !chunk.text.trim().is_empty() {
            let synth = Arc::clone(&synthesizer);
            let text = chunk.text.clone();
            match tokio::task::spawn_blocking(move || synth.synthesize(&text)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("speech synthesis failed: {e}"),
                Err(e) => warn!("speech synthesis task panicked: {e}"),
            }
        }
        if let Some(done) = chunk.done {
            let _ = done.send(());
        }
    }
}

/// Split text into sentences at the same boundaries streaming uses.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut rest = text;
    while let Some(pos) = find_sentence_boundary(rest) {
        let sentence = rest[..=pos].trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_owned());
        }
        rest = &rest[pos + 1..];
    }
    let tail = rest.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_owned());
    }
    sentences
}
