use std::sync::mpsc::Sender;
use std::sync::Arc;
use tokio::runtime::Handle;

use crate::api::{AgentConfig, ApiClient};
use crate::event::{AppEvent, LinkState};
use crate::stream::StepStream;

/// Bridge between the UI thread and the backend: REST calls are spawned on
/// the tokio runtime and report back as [`AppEvent`]s, the push subscription
/// is recreated whenever the session id changes.
pub struct Backend {
    api: Arc<ApiClient>,
    tx: Sender<AppEvent>,
    runtime: Handle,
    stream: Option<StepStream>,
}

impl Backend {
    pub fn new(api: ApiClient, tx: Sender<AppEvent>, runtime: Handle) -> Self {
        Self {
            api: Arc::new(api),
            tx,
            runtime,
            stream: None,
        }
    }

    /// Tear down the previous subscription (disconnecting its socket) and
    /// open one for the given session.
    pub fn subscribe_steps(&mut self, session_id: &str) {
        if self
            .stream
            .as_ref()
            .is_some_and(|stream| stream.session_id() == session_id)
        {
            return;
        }

        self.stream = None;
        let _ = self.tx.send(AppEvent::LinkChanged(LinkState::Connecting));
        match StepStream::connect(self.api.base_url(), session_id.to_string(), self.tx.clone()) {
            Ok(stream) => self.stream = Some(stream),
            Err(err) => {
                log::warn!("failed to open step stream: {err}");
                let _ = self.tx.send(AppEvent::LinkChanged(LinkState::Error));
            }
        }
    }

    pub fn send_chat(&self, session_id: String, message: String) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = api
                .send_chat(&session_id, &message)
                .await
                .map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::ChatFinished { session_id, result });
        });
    }

    pub fn load_history(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = api.fetch_history().await.map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::HistoryLoaded(result));
        });
    }

    pub fn load_tools(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = api.fetch_tools().await.map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::ToolsLoaded(result));
        });
    }

    pub fn load_config(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = api.fetch_config().await.map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::ConfigLoaded(result));
        });
    }

    pub fn save_config(&self, config: AgentConfig) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.runtime.spawn(async move {
            let result = api.save_config(&config).await.map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::ConfigSaved(result));
        });
    }
}
