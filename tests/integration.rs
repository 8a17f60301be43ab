//! Integration tests for chatapps-bridge
//!
//! These tests drive the public API end to end: an 8x8 webhook enters the
//! gateway, the AI platform endpoint is called, and the classified outputs
//! are delivered to a mocked 8x8 Chat Apps API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatapps_bridge::config::{Config, SessionBackend, TransformerMode};
use chatapps_bridge::executor::CognigyEndpoint;
use chatapps_bridge::gateway::{build_router, GatewayState};
use chatapps_bridge::session::{store_from_config, SessionKey, SessionStore};
use chatapps_bridge::{HashAlgorithm, InboundOutcome, Transformer};

const MSISDN: &str = "+6512345678";
const CHANNEL: &str = "f3e1c5a0-channel";

fn config(eightbyeight: &MockServer, cognigy: &MockServer, mode: TransformerMode) -> Config {
    let mut config = Config::default();
    config.eightbyeight.api_key = "test-key".into();
    config.eightbyeight.sub_account_id = "acme".into();
    config.eightbyeight.base_url = format!("{}/api/v1/subaccounts", eightbyeight.uri());
    config.cognigy.endpoint_url = format!("{}/endpoint/token", cognigy.uri());
    config.server.mode = mode;
    config
}

fn inbound(text: &str) -> String {
    json!({
        "namespace": "ChatApps",
        "eventType": "inbound_message_received",
        "payload": {
            "umid": "msg-1",
            "user": {"msisdn": MSISDN, "channelUserId": "6512345678"},
            "recipient": {"channel": "whatsapp", "channelId": CHANNEL},
            "content": {"type": "text", "text": text}
        }
    })
    .to_string()
}

fn webhook(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/8x8")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn router(config: &Config) -> axum::Router {
    let store = store_from_config(config).unwrap();
    let transformer = Transformer::new(config, store).unwrap();
    let state = GatewayState::new(
        Arc::new(transformer),
        Arc::new(CognigyEndpoint::new(&config.cognigy)),
        None,
    );
    build_router(state, &config.server.path)
}

// ============================================================================
// Full flow
// ============================================================================

#[tokio::test]
async fn test_rest_flow_hashes_ids_and_batches_outputs() {
    let eightbyeight = MockServer::start().await;
    let cognigy = MockServer::start().await;

    let hashed_user = HashAlgorithm::Sha256.digest_hex(MSISDN);
    let hashed_session = HashAlgorithm::Sha256.digest_hex(CHANNEL);

    Mock::given(method("POST"))
        .and(path("/endpoint/token"))
        .and(body_partial_json(json!({
            "userId": hashed_user,
            "sessionId": hashed_session,
            "text": "menu please"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outputStack": [
                {"text": "Here is our menu"},
                {"data": {"_cognigy": {"_default": {"_quickReplies": {
                    "text": "What would you like?",
                    "quickReplies": [
                        {"title": "Tea"}, {"title": "Coffee"}, {"title": "Juice"}, {"title": "Water"}
                    ]
                }}}}}
            ]
        })))
        .expect(1)
        .mount(&cognigy)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/subaccounts/acme/messages/batch"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({"messages": [
            {
                "user": {"msisdn": MSISDN},
                "type": "text",
                "content": {"text": "Here is our menu"}
            },
            {
                "user": {"msisdn": MSISDN},
                "type": "interactive",
                "content": {
                    "type": "button",
                    "body": {"text": "What would you like?"},
                    "action": {"buttons": [
                        {"type": "reply", "reply": {"id": "option-1", "title": "Tea"}},
                        {"type": "reply", "reply": {"id": "option-2", "title": "Coffee"}},
                        {"type": "reply", "reply": {"id": "option-3", "title": "Juice"}}
                    ]}
                }
            }
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"batchId": "b-1"})))
        .expect(1)
        .mount(&eightbyeight)
        .await;

    let config = config(&eightbyeight, &cognigy, TransformerMode::Rest);
    let resp = router(&config)
        .oneshot(webhook(inbound("menu please")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_flow_sends_media_individually() {
    let eightbyeight = MockServer::start().await;
    let cognigy = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/endpoint/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "outputStack": [
                {"data": {"_cognigy": {"_default": {"_image": {"imageUrl": "https://cdn/x.png"}}}}},
                {"data": {"_cognigy": {"_default": {"_audio": {"audioUrl": "https://cdn/x.ogg"}}}}}
            ]
        })))
        .mount(&cognigy)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/subaccounts/acme/messages"))
        .and(body_json(json!({
            "user": {"msisdn": MSISDN},
            "type": "image",
            "content": {"url": "https://cdn/x.png"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&eightbyeight)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/subaccounts/acme/messages"))
        .and(body_json(json!({
            "user": {"msisdn": MSISDN},
            "type": "audio",
            "content": {"url": "https://cdn/x.ogg"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&eightbyeight)
        .await;

    let config = config(&eightbyeight, &cognigy, TransformerMode::Webhook);
    let resp = router(&config)
        .oneshot(webhook(inbound("pictures")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_status_events_are_acknowledged_without_calls() {
    let eightbyeight = MockServer::start().await;
    let cognigy = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&cognigy)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&eightbyeight)
        .await;

    let body = json!({
        "eventType": "outbound_message_status_changed",
        "payload": {"umid": "msg-1", "status": {"state": "delivered"}}
    })
    .to_string();
    let config = config(&eightbyeight, &cognigy, TransformerMode::Rest);
    let resp = router(&config).oneshot(webhook(body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Session persistence
// ============================================================================

#[tokio::test]
async fn test_file_sessions_survive_restart() {
    let eightbyeight = MockServer::start().await;
    let cognigy = MockServer::start().await;
    let dir = tempdir().unwrap();

    let mut config = config(&eightbyeight, &cognigy, TransformerMode::Webhook);
    config.session.backend = SessionBackend::File;
    config.session.path = Some(dir.path().display().to_string());

    let (user_id, session_id) = {
        let store = store_from_config(&config).unwrap();
        let transformer = Transformer::new(&config, store).unwrap();
        match transformer.handle_input(inbound("hi").as_bytes()).await.unwrap() {
            InboundOutcome::Accepted(input) => (input.user_id, input.session_id),
            other => panic!("unexpected outcome: {:?}", other),
        }
    };

    // A fresh store over the same directory sees the clear ids
    let store = store_from_config(&config).unwrap();
    let record = store
        .get(&SessionKey::new(&user_id, &session_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.clear_user_id.as_deref(), Some(MSISDN));
    assert_eq!(record.clear_session_id.as_deref(), Some(CHANNEL));

    Mock::given(method("POST"))
        .and(path("/api/v1/subaccounts/acme/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&eightbyeight)
        .await;

    let transformer = Transformer::new(&config, store).unwrap();
    let resp = transformer
        .handle_output(&json!({"text": "welcome back"}), &user_id, &session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resp.status, 200);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_drives_transformer() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");
    let raw: Value = json!({
        "eightbyeight": {"api_key": "k", "sub_account_id": "s"},
        "redaction": {"hash_algorithm": "sha512"},
        "cognigy": {"endpoint_url": "https://endpoint.example/abc"},
        "server": {"mode": "webhook"}
    });
    std::fs::write(&path, raw.to_string()).unwrap();

    let config = Config::load_from_path(&path).unwrap();
    config.check().unwrap();
    assert_eq!(config.server.mode, TransformerMode::Webhook);

    let store = store_from_config(&config).unwrap();
    let transformer = Transformer::new(&config, store).unwrap();
    assert_eq!(transformer.mode(), TransformerMode::Webhook);
}
