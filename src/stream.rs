use rust_socketio::client::Client;
use rust_socketio::{ClientBuilder, Event, Payload, TransportType};
use serde::Deserialize;
use serde_json::json;
use std::sync::mpsc::Sender;

use crate::event::{AppEvent, LinkState};
use crate::session::ExecutionStep;

pub const STREAM_NAMESPACE: &str = "/api/stream";

#[derive(Debug, Deserialize)]
struct StepUpdatePayload {
    session_id: String,
    step: ExecutionStep,
}

/// Push subscription for one session, held as a scoped resource: the app
/// keeps exactly one alive and drops it whenever the session id changes,
/// which disconnects the socket.
pub struct StepStream {
    session_id: String,
    client: Option<Client>,
}

impl StepStream {
    pub fn connect(
        base_url: &str,
        session_id: String,
        tx: Sender<AppEvent>,
    ) -> Result<Self, rust_socketio::Error> {
        let subscribe_id = session_id.clone();
        let connect_tx = tx.clone();
        let step_tx = tx.clone();
        let error_tx = tx.clone();
        let close_tx = tx;

        let client = ClientBuilder::new(base_url)
            .namespace(STREAM_NAMESPACE)
            .transport_type(TransportType::Websocket)
            .on(Event::Connect, move |_payload, socket| {
                let _ = connect_tx.send(AppEvent::LinkChanged(LinkState::Connected));
                let payload = json!({ "session_id": subscribe_id });
                if let Err(err) = socket.emit("subscribe", payload) {
                    log::warn!("failed to emit subscribe: {err}");
                }
            })
            .on("step_update", move |payload, _socket| {
                if let Some(update) = decode_step_update(payload) {
                    let _ = step_tx.send(AppEvent::StepUpdate {
                        session_id: update.session_id,
                        step: update.step,
                    });
                }
            })
            .on(Event::Error, move |payload, _socket| {
                log::warn!("step stream error: {payload:?}");
                let _ = error_tx.send(AppEvent::LinkChanged(LinkState::Error));
            })
            .on(Event::Close, move |_payload, _socket| {
                let _ = close_tx.send(AppEvent::LinkChanged(LinkState::Disconnected));
            })
            .connect()?;

        Ok(Self {
            session_id,
            client: Some(client),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn disconnect(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(err) = client.disconnect() {
                log::warn!("step stream disconnect failed: {err}");
            }
        }
    }
}

impl Drop for StepStream {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// A `step_update` without a session id or step record never decodes, so
/// malformed events fall out here as a no-op.
fn decode_step_update(payload: Payload) -> Option<StepUpdatePayload> {
    match payload {
        Payload::Text(values) => values
            .into_iter()
            .next()
            .and_then(|value| serde_json::from_value(value).ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_update_payload_decodes() {
        let payload = Payload::Text(vec![json!({
            "session_id": "abc",
            "step": {"step_num": 3, "thought": "t", "action": "a", "observation": ""}
        })]);

        let update = decode_step_update(payload).expect("payload should decode");
        assert_eq!(update.session_id, "abc");
        assert_eq!(update.step.step_num, 3);
    }

    #[test]
    fn payload_without_step_record_is_dropped() {
        let payload = Payload::Text(vec![json!({ "session_id": "abc" })]);
        assert!(decode_step_update(payload).is_none());
    }

    #[test]
    fn payload_without_session_id_is_dropped() {
        let payload = Payload::Text(vec![json!({ "step": {"step_num": 1} })]);
        assert!(decode_step_update(payload).is_none());
    }

    #[test]
    fn binary_payload_is_dropped() {
        let payload = Payload::Binary(vec![1, 2, 3].into());
        assert!(decode_step_update(payload).is_none());
    }
}
