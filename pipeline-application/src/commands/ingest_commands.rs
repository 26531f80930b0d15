use std::io::Read;

use flate2::read::GzDecoder;
use tracing::{debug, error};

use pipeline_domain::{IncomingEvent, InboundMessage};

use crate::commands::transform_commands;
use crate::{AppError, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Stored in the sink and acknowledged.
    Acknowledged,
    /// The sink rejected the record; the message was acknowledged anyway.
    SubmissionFailed,
}

/// Runs one feed message through parse, transform, sink and acknowledgment.
///
/// A message that cannot be parsed is returned as an error without being
/// acknowledged, so the feed redelivers it. The sink is tried exactly once
/// and its failure never blocks the acknowledgment.
pub async fn handle_message(
    state: &AppState,
    message: InboundMessage,
) -> Result<MessageOutcome, AppError> {
    let InboundMessage {
        id,
        content_encoding,
        data,
        ack,
        ..
    } = message;
    state.metrics.record_received();

    let event = decode_event(
        content_encoding.as_deref(),
        &data,
        state.config.max_decoded_bytes,
    )
    .inspect_err(|_| {
        state.metrics.record_parse_failure();
    })?;
    let processed = transform_commands::transform_event(state, event).await;

    let outcome = match state
        .event_sink
        .insert_events(std::slice::from_ref(&processed))
        .await
    {
        Ok(()) => MessageOutcome::Acknowledged,
        Err(err) => {
            state.metrics.record_sink_failure();
            error!(
                message_id = %id,
                event_type = %processed.event_type,
                error = %err,
                "sink submission failed, acknowledging without storage"
            );
            MessageOutcome::SubmissionFailed
        }
    };

    ack.ack().await.map_err(|err| {
        state.metrics.record_ack_failure();
        AppError::Acknowledge(err)
    })?;
    state.metrics.record_acknowledged();
    debug!(message_id = %id, outcome = ?outcome, "message acknowledged");
    Ok(outcome)
}

/// Bodies larger than `max_bytes` once inflated are malformed.
pub fn decode_event(
    content_encoding: Option<&str>,
    data: &[u8],
    max_bytes: usize,
) -> Result<IncomingEvent, AppError> {
    let content = maybe_gunzip(content_encoding, data, max_bytes)?;
    serde_json::from_str(&content).map_err(|err| AppError::MalformedMessage(err.to_string()))
}

fn maybe_gunzip(
    content_encoding: Option<&str>,
    data: &[u8],
    max_bytes: usize,
) -> Result<String, AppError> {
    let too_large = || AppError::MalformedMessage(format!("payload exceeds {} bytes", max_bytes));
    match content_encoding.map(str::trim) {
        None | Some("") | Some("identity") => {
            if data.len() > max_bytes {
                return Err(too_large());
            }
            String::from_utf8(data.to_vec())
                .map_err(|err| AppError::MalformedMessage(err.to_string()))
        }
        Some(encoding) if encoding.eq_ignore_ascii_case("gzip") => {
            let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
            let mut decoder = GzDecoder::new(data).take(limit);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|err| AppError::MalformedMessage(format!("gzip: {}", err)))?;
            if out.len() > max_bytes {
                return Err(too_large());
            }
            String::from_utf8(out).map_err(|err| AppError::MalformedMessage(err.to_string()))
        }
        Some(other) => Err(AppError::MalformedMessage(format!(
            "unsupported content encoding '{}'",
            other
        ))),
    }
}
