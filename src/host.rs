//! Plugin host: the side of the panel that owns the canvas.
//!
//! The panel UI sends `{type:"generate", text}`; the host answers with
//! `status`, then either `success` (the generated HTML and how many shapes
//! were drawn) or `error`. Requests are handled strictly one at a time, in
//! arrival order. Nothing is retried: a failure is reported once and the host
//! goes back to waiting for the next request.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::canvas::{Canvas, FontName};
use crate::generation::GenerationClient;
use crate::mapper::{CanvasNode, map_html_to_nodes};

const NO_PROMPT: &str = "No prompt received";
const CONNECTING: &str = "Connecting to AI service...";

/// UI → host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PanelMessage {
    Generate {
        #[serde(default)]
        text: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusType {
    Loading,
    Success,
    Error,
}

/// Host → UI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessage {
    Status {
        message: String,
        #[serde(rename = "statusType", skip_serializing_if = "Option::is_none")]
        status_type: Option<StatusType>,
    },
    Success {
        html: String,
        count: usize,
    },
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        debug: Option<String>,
    },
}

impl HostMessage {
    fn error(message: impl Into<String>, debug: Option<String>) -> Self {
        HostMessage::Error {
            message: message.into(),
            debug,
        }
    }
}

/// Result of one `generate` request, for callers that want more than the
/// messages (the CLI exports the nodes and writes the preview).
#[derive(Clone, Debug)]
pub struct Generation {
    pub html: String,
    pub nodes: Vec<CanvasNode>,
}

/// Owns the canvas and answers panel requests.
pub struct PluginHost<C> {
    client: GenerationClient,
    canvas: C,
    font: FontName,
    outbox: mpsc::UnboundedSender<HostMessage>,
}

impl<C: Canvas> PluginHost<C> {
    pub fn new(
        client: GenerationClient,
        canvas: C,
        font: FontName,
        outbox: mpsc::UnboundedSender<HostMessage>,
    ) -> Self {
        Self {
            client,
            canvas,
            font,
            outbox,
        }
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn into_canvas(self) -> C {
        self.canvas
    }

    fn post(&self, message: HostMessage) {
        if self.outbox.send(message).is_err() {
            tracing::debug!("panel is gone; dropping host message");
        }
    }

    /// Handle a raw JSON message from the panel. Anything that is not a
    /// `generate` request with a non-blank prompt is answered with an error.
    pub async fn handle_raw(&mut self, raw: serde_json::Value) -> Option<Generation> {
        match serde_json::from_value::<PanelMessage>(raw) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                tracing::warn!("ignoring malformed panel message: {e}");
                self.post(HostMessage::error(NO_PROMPT, None));
                None
            }
        }
    }

    pub async fn handle(&mut self, message: PanelMessage) -> Option<Generation> {
        let PanelMessage::Generate { text } = message;
        let prompt = text.trim();
        if prompt.is_empty() {
            self.post(HostMessage::error(NO_PROMPT, None));
            return None;
        }

        self.post(HostMessage::Status {
            message: CONNECTING.to_string(),
            status_type: Some(StatusType::Loading),
        });

        let html = match self.client.generate(prompt).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("generation failed: {e}");
                self.post(HostMessage::error(e.to_string(), e.debug_detail()));
                return None;
            }
        };

        // No shape is drawn unless the font is ready.
        if let Err(e) = self.canvas.ensure_font_ready(&self.font).await {
            tracing::error!("font not ready: {e}");
            self.post(HostMessage::error(e.to_string(), Some(format!("{e:?}"))));
            return None;
        }

        let nodes = match map_html_to_nodes(&mut self.canvas, &html, &self.font).await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::error!("mapping failed: {e}");
                self.post(HostMessage::error(e.to_string(), Some(format!("{e:?}"))));
                return None;
            }
        };

        tracing::info!(count = nodes.len(), "created UI from HTML");
        self.post(HostMessage::Success {
            html: html.clone(),
            count: nodes.len(),
        });
        Some(Generation { html, nodes })
    }

    /// Serve panel messages until the sending side closes.
    pub async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<serde_json::Value>) -> C {
        while let Some(raw) = inbox.recv().await {
            self.handle_raw(raw).await;
        }
        self.canvas
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use std::time::Duration;

    fn host_for(
        server: &mockito::ServerGuard,
        scene: Scene,
    ) -> (PluginHost<Scene>, mpsc::UnboundedReceiver<HostMessage>) {
        let client =
            GenerationClient::new(&format!("{}/preview", server.url()), Duration::from_secs(5))
                .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (PluginHost::new(client, scene, FontName::default(), tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<HostMessage>) -> Vec<HostMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn panel_message_wire_format() {
        let msg: PanelMessage =
            serde_json::from_str(r#"{"type":"generate","text":"a signup form"}"#).unwrap();
        assert_eq!(msg, PanelMessage::Generate { text: "a signup form".to_string() });
    }

    #[test]
    fn host_message_wire_format() {
        let status = serde_json::to_value(HostMessage::Status {
            message: "Connecting to AI service...".to_string(),
            status_type: Some(StatusType::Loading),
        })
        .unwrap();
        assert_eq!(
            status,
            serde_json::json!({
                "type": "status",
                "message": "Connecting to AI service...",
                "statusType": "loading"
            })
        );

        let success = serde_json::to_value(HostMessage::Success {
            html: "<h1>x</h1>".to_string(),
            count: 1,
        })
        .unwrap();
        assert_eq!(
            success,
            serde_json::json!({ "type": "success", "html": "<h1>x</h1>", "count": 1 })
        );

        let error = serde_json::to_value(HostMessage::error("boom", None)).unwrap();
        assert_eq!(error, serde_json::json!({ "type": "error", "message": "boom" }));
    }

    #[tokio::test]
    async fn generate_draws_and_reports_success() {
        let mut server = mockito::Server::new_async().await;
        let html = r#"<h1>Hello</h1><input><button class="red">Go</button>"#;
        server
            .mock("POST", "/preview")
            .with_status(200)
            .with_body(html)
            .create_async()
            .await;

        let (mut host, mut rx) = host_for(&server, Scene::new());
        let result = host
            .handle(PanelMessage::Generate { text: "hello page".to_string() })
            .await
            .unwrap();

        assert_eq!(result.nodes.len(), 3);
        assert_eq!(host.canvas().page().len(), 3);
        assert_eq!(
            drain(&mut rx),
            vec![
                HostMessage::Status {
                    message: CONNECTING.to_string(),
                    status_type: Some(StatusType::Loading),
                },
                HostMessage::Success { html: html.to_string(), count: 3 },
            ]
        );
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_without_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/preview")
            .expect(0)
            .create_async()
            .await;

        let (mut host, mut rx) = host_for(&server, Scene::new());
        assert!(host.handle(PanelMessage::Generate { text: "   ".to_string() }).await.is_none());
        assert_eq!(drain(&mut rx), vec![HostMessage::error(NO_PROMPT, None)]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_message_is_rejected() {
        let server = mockito::Server::new_async().await;
        let (mut host, mut rx) = host_for(&server, Scene::new());

        host.handle_raw(serde_json::json!({ "type": "resize", "width": 400 })).await;
        host.handle_raw(serde_json::json!(null)).await;
        host.handle_raw(serde_json::json!({ "type": "generate" })).await;

        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| *m == HostMessage::error(NO_PROMPT, None)));
    }

    #[tokio::test]
    async fn failed_response_skips_mapping() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/preview")
            .with_status(500)
            .with_body("<h1>Backend Error</h1>")
            .create_async()
            .await;

        let (mut host, mut rx) = host_for(&server, Scene::new());
        assert!(host.handle(PanelMessage::Generate { text: "x".to_string() }).await.is_none());
        assert!(host.canvas().page().is_empty());

        let messages = drain(&mut rx);
        match messages.last() {
            Some(HostMessage::Error { message, debug }) => {
                assert_eq!(message, "Generation service returned HTTP 500");
                assert_eq!(debug.as_deref(), Some("<h1>Backend Error</h1>"));
            }
            other => panic!("Expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn font_failure_is_reported_before_anything_is_drawn() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/preview")
            .with_status(200)
            .with_body("<input><label>Name</label>")
            .create_async()
            .await;

        let (mut host, mut rx) = host_for(&server, Scene::with_fonts([]));
        assert!(host.handle(PanelMessage::Generate { text: "x".to_string() }).await.is_none());
        assert!(host.canvas().page().is_empty());
        assert_eq!(host.canvas().node_count(), 0);

        match drain(&mut rx).last() {
            Some(HostMessage::Error { message, .. }) => assert!(message.contains("Inter Regular")),
            other => panic!("Expected error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn run_serves_requests_in_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/preview")
            .with_status(200)
            .with_body("<h2>Section</h2>")
            .expect(2)
            .create_async()
            .await;

        let (host, mut rx) = host_for(&server, Scene::new());
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        in_tx.send(serde_json::json!({ "type": "generate", "text": "one" })).unwrap();
        in_tx.send(serde_json::json!({ "type": "generate", "text": "two" })).unwrap();
        drop(in_tx);

        let scene = host.run(in_rx).await;
        assert_eq!(scene.page().len(), 2);

        let successes = drain(&mut rx)
            .into_iter()
            .filter(|m| matches!(m, HostMessage::Success { count: 1, .. }))
            .count();
        assert_eq!(successes, 2);
    }
}
