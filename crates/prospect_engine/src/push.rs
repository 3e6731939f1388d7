use std::sync::Arc;

use bytes::BytesMut;
use engine_logging::engine_debug;
use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::api::{map_reqwest_error, ApiClient};
use crate::types::{ApiError, JobId, StatusUpdate};

/// Receives status reports from a source. Implementations must be cheap:
/// callbacks run on the source's task.
pub trait StatusSink: Send + Sync {
    fn update(&self, update: StatusUpdate);
    fn error(&self, error: ApiError);
}

/// Handle to an open push subscription. `close` is idempotent and stops all
/// future callbacks.
#[derive(Debug, Clone)]
pub struct PushHandle {
    cancel: CancellationToken,
}

impl PushHandle {
    pub fn close(&self) {
        self.cancel.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Server-push status source: one long-lived event-stream request per job.
///
/// Emits zero or more updates followed by at most one error; any failure
/// (connect, transport, malformed frame, premature end of stream)
/// self-closes the source.
pub struct PushSource;

impl PushSource {
    pub fn open(api: ApiClient, job_id: JobId, sink: Arc<dyn StatusSink>) -> PushHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => Ok(()),
                result = stream_updates(&api, &job_id, sink.as_ref()) => result,
            };
            if let Err(err) = outcome {
                if !token.is_cancelled() {
                    engine_debug!("job {job_id}: event stream error: {err}");
                    sink.error(err);
                }
            }
        });
        PushHandle { cancel }
    }
}

async fn stream_updates(
    api: &ApiClient,
    job_id: &JobId,
    sink: &dyn StatusSink,
) -> Result<(), ApiError> {
    let response = api.open_events(job_id).await?;
    let mut stream = response.bytes_stream();
    let mut buf = BytesMut::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        buf.extend_from_slice(&chunk);
        while let Some(frame) = next_frame(&mut buf) {
            let Some(payload) = data_payload(&frame) else {
                // Keep-alive comments and id/retry-only frames carry no data.
                continue;
            };
            let update = StatusUpdate::from_json(payload.as_bytes())?;
            sink.update(update);
        }
    }

    // The stream must outlive the job; the watcher latches a terminal state
    // and closes this source before a well-behaved server hangs up.
    Err(ApiError::Network(
        "event stream ended before a terminal update".into(),
    ))
}

/// Splits one blank-line-terminated event frame off the front of `buf`.
fn next_frame(buf: &mut BytesMut) -> Option<Vec<u8>> {
    let lf = buf.windows(2).position(|sep| sep == b"\n\n").map(|at| (at, 2));
    let crlf = buf
        .windows(4)
        .position(|sep| sep == b"\r\n\r\n")
        .map(|at| (at, 4));
    let (at, len) = match (lf, crlf) {
        (Some(lf), Some(crlf)) => {
            if lf.0 < crlf.0 {
                lf
            } else {
                crlf
            }
        }
        (Some(lf), None) => lf,
        (None, Some(crlf)) => crlf,
        (None, None) => return None,
    };
    let frame = buf.split_to(at + len);
    Some(frame[..at].to_vec())
}

/// Joins the `data:` lines of a frame; `None` for frames without data.
fn data_payload(frame: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(frame);
    let mut data_lines = Vec::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
    }
    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}
