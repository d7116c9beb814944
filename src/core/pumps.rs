//! # The three loops attached to every worker instance.
//!
//! ```text
//!                 ┌──────────────┐  lines   ┌───────────┐   Event::status
//!  stdout ─┐      │  OutputPump  │ ───────► │ classify  │ ───► stats + Bus
//!          ├────► │ (merged, \n) │          └───────────┘
//!  stderr ─┘      └──────────────┘
//!
//!  send_input ──► mpsc ──► InputPump ──► stdin (write + flush)
//!
//!  ExitMonitor: Starting → Running, then wait()
//!                ├─ process exits  → ProcessExited, Running → Stopped
//!                └─ token canceled → kill(), ProcessExited("killed")
//! ```
//!
//! All three receive the instance's [`CancellationToken`] and check it
//! between blocking reads/writes. Only the child process is terminated by
//! force; the loops exit cooperatively.

use std::sync::Arc;

use futures::StreamExt;
use tokio::{
    io::AsyncWriteExt,
    process::{Child, ChildStderr, ChildStdin, ChildStdout},
    sync::mpsc,
};
use tokio_util::{
    bytes::{Bytes, BytesMut},
    codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder, FramedRead},
    sync::CancellationToken,
};

use crate::{
    core::shared::Shared,
    events::{Event, EventKind},
    parser::{Grammar, classify},
};

/// Newline framing that cuts overlong lines instead of ending the stream.
///
/// A line longer than `max` bytes yields its first `max` bytes; the rest of
/// it, up to the next newline, is discarded.
struct BoundedLines {
    inner: AnyDelimiterCodec,
    max: usize,
}

impl BoundedLines {
    fn new(max: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), Vec::new(), max),
            max,
        }
    }

    /// The inner codec leaves `buf` untouched when it reports an overflow and
    /// skips the remainder of the line on the next call.
    fn truncate_overflow(
        &self,
        res: Result<Option<Bytes>, AnyDelimiterCodecError>,
        buf: &BytesMut,
    ) -> Result<Option<Bytes>, AnyDelimiterCodecError> {
        match res {
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                let head = &buf[..self.max.min(buf.len())];
                Ok(Some(Bytes::copy_from_slice(head)))
            }
            other => other,
        }
    }
}

impl Decoder for BoundedLines {
    type Item = Bytes;
    type Error = AnyDelimiterCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Self::Error> {
        let res = self.inner.decode(buf);
        self.truncate_overflow(res, buf)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Self::Error> {
        let res = self.inner.decode_eof(buf);
        self.truncate_overflow(res, buf)
    }
}

/// Lossy UTF-8 decode without the trailing `\r`.
fn decode_line(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.strip_suffix('\r').unwrap_or(&text).to_string()
}

/// Reads the merged output of one worker instance line by line.
pub(crate) struct OutputPump {
    instance: u64,
    grammar: Grammar,
    line_limit: usize,
    shared: Arc<Shared>,
}

impl OutputPump {
    pub fn new(instance: u64, grammar: Grammar, line_limit: usize, shared: Arc<Shared>) -> Self {
        Self {
            instance,
            grammar,
            line_limit,
            shared,
        }
    }

    /// Runs until both streams reach EOF, a read fails, or `token` is canceled.
    pub async fn run(self, stdout: ChildStdout, stderr: ChildStderr, token: CancellationToken) {
        let out = FramedRead::new(stdout, BoundedLines::new(self.line_limit));
        let err = FramedRead::new(stderr, BoundedLines::new(self.line_limit));
        let mut lines = futures::stream::select(out, err);

        loop {
            let next = tokio::select! {
                _ = token.cancelled() => break,
                next = lines.next() => next,
            };
            match next {
                Some(Ok(raw)) => self.process_line(&decode_line(&raw)),
                Some(Err(e)) => {
                    tracing::warn!(instance = self.instance, err = %e, "worker output unreadable");
                    break;
                }
                None => break,
            }
        }
        tracing::debug!(instance = self.instance, "output pump finished");
    }

    fn process_line(&self, line: &str) {
        tracing::trace!(target: "rigvisor::worker", instance = self.instance, "{line}");

        let update = classify(self.grammar, line);
        let Some((speed, accepted)) = self.shared.record_line(self.instance, line, update) else {
            return;
        };
        self.shared
            .bus
            .publish(Event::status(line, speed, accepted).with_instance(self.instance));
    }
}

/// Forwards queued `send_input` text to the worker's stdin.
pub(crate) struct InputPump {
    instance: u64,
    shared: Arc<Shared>,
}

impl InputPump {
    pub fn new(instance: u64, shared: Arc<Shared>) -> Self {
        Self { instance, shared }
    }

    /// Runs until `token` is canceled, the queue closes, or a write fails.
    pub async fn run(
        self,
        mut stdin: ChildStdin,
        mut queue: mpsc::Receiver<String>,
        token: CancellationToken,
    ) {
        loop {
            let text = tokio::select! {
                _ = token.cancelled() => break,
                text = queue.recv() => match text {
                    Some(text) => text,
                    None => break,
                },
            };

            let written = tokio::select! {
                _ = token.cancelled() => break,
                res = async {
                    stdin.write_all(text.as_bytes()).await?;
                    stdin.flush().await
                } => res,
            };
            if let Err(e) = written {
                tracing::warn!(instance = self.instance, err = %e, "write to worker stdin failed");
                self.shared.bus.publish(
                    Event::new(EventKind::InputDropped)
                        .with_instance(self.instance)
                        .with_reason(e.to_string()),
                );
                break;
            }
        }
        tracing::debug!(instance = self.instance, "input pump finished");
    }
}

/// Owns the child process: reports it running, waits for its exit, kills it on cancel.
pub(crate) struct ExitMonitor {
    instance: u64,
    shared: Arc<Shared>,
}

impl ExitMonitor {
    pub fn new(instance: u64, shared: Arc<Shared>) -> Self {
        Self { instance, shared }
    }

    pub async fn run(self, mut child: Child, token: CancellationToken) {
        self.shared.enter_running(self.instance);

        let exited = tokio::select! {
            res = child.wait() => Some(res),
            _ = token.cancelled() => None,
        };

        match exited {
            Some(Ok(status)) => {
                tracing::info!(instance = self.instance, %status, "worker exited");
                self.shared.detach(self.instance);
                self.publish_exit(status.code(), "exited");
                self.shared.enter_stopped(self.instance);
            }
            Some(Err(e)) => {
                tracing::warn!(instance = self.instance, err = %e, "waiting for worker failed");
                self.shared.detach(self.instance);
                self.publish_exit(None, "lost");
                self.shared.enter_stopped(self.instance);
            }
            None => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(instance = self.instance, err = %e, "failed to kill worker");
                }
                tracing::info!(instance = self.instance, "worker killed");
                self.publish_exit(None, "killed");
            }
        }
    }

    fn publish_exit(&self, code: Option<i32>, how: &'static str) {
        self.shared.bus.publish(
            Event::new(EventKind::ProcessExited)
                .with_instance(self.instance)
                .with_exit_code(code)
                .with_reason(how),
        );
    }
}
