//! Inbound HTTP surface — the webhook endpoint and a health probe.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use portico_channels::telegram::envelope::{normalize, Normalized};
use portico_channels::telegram::types::TgUpdate;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::gateway::{Gateway, GatewayError, WebhookStatus};

/// Header the platform echoes the shared secret in.
const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .with_state(gateway)
}

/// Bind and serve until the process is stopped.
pub async fn serve(gateway: Arc<Gateway>, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("portico gateway listening on {addr}");
    axum::serve(listener, router(gateway)).await?;
    Ok(())
}

/// POST /webhook — authenticate, validate, and run the pipeline.
async fn webhook(State(gateway): State<Arc<Gateway>>, headers: HeaderMap, body: Bytes) -> Response {
    match handle_webhook(&gateway, &headers, &body).await {
        Ok(status) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": status })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn handle_webhook(
    gateway: &Gateway,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<WebhookStatus, GatewayError> {
    // Authenticate first; an unset secret refuses everything.
    let secret = gateway
        .webhook_secret
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(GatewayError::SecretUnconfigured)?;
    let provided = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != secret {
        return Err(GatewayError::Forbidden);
    }

    let update: TgUpdate = serde_json::from_slice(body)
        .map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;

    let event = match normalize(update).map_err(|e| GatewayError::MalformedPayload(e.to_string()))?
    {
        Normalized::Ignored(reason) => {
            debug!("update not processed: {reason}");
            return Ok(WebhookStatus::ReceivedNotProcessed);
        }
        Normalized::Event(event) => event,
    };

    // Acknowledge callbacks on receipt, before provisioning; best-effort.
    if let Some(callback_id) = event.callback_id() {
        if let Err(e) = gateway.messenger.answer_callback(callback_id).await {
            warn!("callback acknowledgement failed: {e}");
        }
    }

    gateway.handle(event).await
}

/// GET /health — simple probe body.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "portico",
        "status": "ok",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mocks::*;
    use axum::body::to_bytes;

    fn headers(secret: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(s) = secret {
            headers.insert(SECRET_HEADER, s.parse().unwrap());
        }
        headers
    }

    fn message_body(text: &str, sender_id: i64, chat_id: i64) -> Vec<u8> {
        serde_json::json!({
            "update_id": 1,
            "message": {
                "message_id": 10,
                "from": {"id": sender_id, "first_name": "Alice", "username": "alice"},
                "chat": {"id": chat_id, "type": "private"},
                "text": text,
            }
        })
        .to_string()
        .into_bytes()
    }

    async fn status_of(resp: Response) -> (StatusCode, serde_json::Value) {
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_unconfigured_secret_refuses_everything() {
        let h = harness(
            MockStore::default(),
            MockProvider::default(),
            MockDownstream::default(),
            vec![],
            None,
        );

        for body in [b"{}".to_vec(), message_body("hi", 42, 100)] {
            let resp = webhook(
                State(h.gateway.clone()),
                headers(Some("anything")),
                Bytes::from(body),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn test_missing_or_wrong_secret_is_forbidden() {
        let h = harness(
            MockStore::default(),
            MockProvider::default(),
            MockDownstream::default(),
            vec![],
            Some("s3cret"),
        );

        for hdrs in [headers(None), headers(Some("wrong"))] {
            let resp = webhook(
                State(h.gateway.clone()),
                hdrs,
                Bytes::from(message_body("hi", 42, 100)),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        }
        // Rejected before any side effect.
        assert_eq!(*h.store.minted.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_garbage_body_is_bad_request() {
        let h = harness(
            MockStore::default(),
            MockProvider::default(),
            MockDownstream::default(),
            vec![],
            Some("s3cret"),
        );

        let resp = webhook(
            State(h.gateway.clone()),
            headers(Some("s3cret")),
            Bytes::from_static(b"not json"),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_neither_shape_is_bad_request() {
        let h = harness(
            MockStore::default(),
            MockProvider::default(),
            MockDownstream::default(),
            vec![],
            Some("s3cret"),
        );

        let resp = webhook(
            State(h.gateway.clone()),
            headers(Some("s3cret")),
            Bytes::from_static(br#"{"update_id": 9, "edited_message": {}}"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_textless_message_is_soft_no_op() {
        let h = harness(
            MockStore::default(),
            MockProvider::default(),
            MockDownstream::default(),
            vec![],
            Some("s3cret"),
        );

        let body = serde_json::json!({
            "update_id": 2,
            "message": {
                "message_id": 11,
                "from": {"id": 42, "first_name": "Alice"},
                "chat": {"id": 100, "type": "private"},
            }
        })
        .to_string();
        let resp = webhook(
            State(h.gateway.clone()),
            headers(Some("s3cret")),
            Bytes::from(body),
        )
        .await;
        let (status, json) = status_of(resp).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "received_not_processed");
        assert_eq!(*h.store.minted.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_denied_sender_gets_200_unauthorized_user() {
        let h = harness(
            MockStore::default(),
            MockProvider::default(),
            MockDownstream::default(),
            vec!["someone_else".into()],
            Some("s3cret"),
        );

        let resp = webhook(
            State(h.gateway.clone()),
            headers(Some("s3cret")),
            Bytes::from(message_body("hi", 42, 100)),
        )
        .await;
        let (status, json) = status_of(resp).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "unauthorized_user");
    }

    #[tokio::test]
    async fn test_first_contact_scenario_over_http() {
        // First-ever sender posts "UTC-5" with the correct secret.
        let h = harness(
            MockStore::default(),
            MockProvider {
                reply: "Saved! You're on UTC-5.".into(),
                commit: Some("UTC-5".into()),
                ..Default::default()
            },
            MockDownstream::default(),
            vec![],
            Some("s3cret"),
        );

        let resp = webhook(
            State(h.gateway.clone()),
            headers(Some("s3cret")),
            Bytes::from(message_body("UTC-5", 42, 100)),
        )
        .await;
        let (status, json) = status_of(resp).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "timezone_setup_handled");
        assert_eq!(h.store.timezone_of(42).as_deref(), Some("UTC-5"));
    }

    #[tokio::test]
    async fn test_callback_is_acknowledged_before_processing() {
        // Deny-listed sender: the pipeline soft-ignores the event, but the
        // callback still gets answered on receipt.
        let h = harness(
            MockStore::default(),
            MockProvider::default(),
            MockDownstream::default(),
            vec!["someone_else".into()],
            Some("s3cret"),
        );

        let body = serde_json::json!({
            "update_id": 3,
            "callback_query": {
                "id": "cb-77",
                "from": {"id": 42, "first_name": "Alice", "username": "alice"},
                "message": {
                    "message_id": 12,
                    "chat": {"id": 100, "type": "private"},
                    "text": "Pick one:",
                },
                "data": "confirm",
            }
        })
        .to_string();
        let resp = webhook(
            State(h.gateway.clone()),
            headers(Some("s3cret")),
            Bytes::from(body),
        )
        .await;
        let (status, json) = status_of(resp).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "unauthorized_user");
        assert_eq!(*h.messenger.acks.lock().unwrap(), vec!["cb-77".to_string()]);
    }
}
