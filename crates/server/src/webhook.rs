//! Telegram webhook intake. Updates are acknowledged immediately and each
//! turn runs detached, so a slow extraction or send never blocks the hook.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use tracing::{debug, warn};
use uuid::Uuid;

use tally_core::dialogue::Dialogue;
use tally_core::extraction::EntityExtraction;
use tally_nlp::NlpClient;
use tally_telegram::{TelegramClient, Update};

#[derive(Clone)]
pub struct WebhookState {
    dialogue: Arc<Dialogue>,
    telegram: TelegramClient,
    nlp: NlpClient,
    bot_token: String,
}

impl WebhookState {
    pub fn new(
        dialogue: Arc<Dialogue>,
        telegram: TelegramClient,
        nlp: NlpClient,
        bot_token: String,
    ) -> Self {
        Self { dialogue, telegram, nlp, bot_token }
    }
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/telegram/{token}", post(receive_update)).with_state(state)
}

/// The path token is the shared secret: only Telegram knows the registered
/// webhook URL, so a mismatch is treated as an unknown route.
async fn receive_update(
    Path(token): Path<String>,
    State(state): State<WebhookState>,
    Json(update): Json<Update>,
) -> StatusCode {
    if token != state.bot_token {
        return StatusCode::NOT_FOUND;
    }

    tokio::spawn(process_update(state, update));
    StatusCode::OK
}

async fn process_update(state: WebhookState, update: Update) {
    let Some((chat_id, text)) = update.user_text() else {
        return;
    };
    let correlation_id = Uuid::new_v4();

    if let Err(error) = state.telegram.send_chat_action(chat_id).await {
        debug!(%correlation_id, chat_id = %chat_id, error = %error, "typing indicator failed");
    }

    // A failed extraction degrades to an empty one; the engine still gets
    // the raw text and can run password or confirmation steps with it.
    let extraction = match state.nlp.parse_message(text).await {
        Ok(extraction) => extraction,
        Err(error) => {
            warn!(%correlation_id, chat_id = %chat_id, error = %error, "nlp extraction failed");
            EntityExtraction::default()
        }
    };

    let reply = state.dialogue.converse(chat_id, text, extraction).await;
    if reply.is_empty() {
        debug!(%correlation_id, chat_id = %chat_id, "turn produced no reply");
        return;
    }

    if let Err(error) = state.telegram.send_message(chat_id, &reply.0).await {
        warn!(%correlation_id, chat_id = %chat_id, error = %error, "reply delivery failed");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use tally_core::collab::SessionCache;
    use tally_core::config::{NlpConfig, TelegramConfig};
    use tally_core::dialogue::{
        conversation_key, Collaborators, Dialogue, ResponseCatalog,
    };
    use tally_db::{InMemoryAccountDirectory, InMemoryExpenseLedger, InMemorySessionCache};
    use tally_nlp::NlpClient;
    use tally_telegram::TelegramClient;

    use super::{router, WebhookState};

    const BOT_TOKEN: &str = "42:test";

    // Clients pointed at a closed local port: every outbound call fails
    // fast, which is exactly the degraded path the worker must survive.
    fn state() -> (WebhookState, Arc<InMemorySessionCache>) {
        let cache = Arc::new(InMemorySessionCache::new());
        let deps = Collaborators {
            cache: Arc::clone(&cache) as Arc<dyn SessionCache>,
            users: Arc::new(InMemoryAccountDirectory::new()),
            ledger: Arc::new(InMemoryExpenseLedger::new()),
            catalog: ResponseCatalog::default(),
        };

        let telegram_config = TelegramConfig {
            bot_token: BOT_TOKEN.to_string().into(),
            webhook_domain: None,
        };
        let nlp_config = NlpConfig {
            api_token: "wit-test".to_string().into(),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        };

        let state = WebhookState::new(
            Arc::new(Dialogue::new(deps)),
            TelegramClient::with_base_url(&telegram_config, "http://127.0.0.1:9"),
            NlpClient::new(&nlp_config).expect("client"),
            BOT_TOKEN.to_string(),
        );
        (state, cache)
    }

    fn update_request(token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!("/telegram/{token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    const TEXT_UPDATE: &str = r#"{
        "update_id": 7,
        "message": {
            "message_id": 11,
            "from": { "id": 123, "is_bot": false, "first_name": "Ada" },
            "chat": { "id": 123, "type": "private" },
            "text": "hello"
        }
    }"#;

    #[tokio::test]
    async fn wrong_token_is_not_found() {
        let (state, _cache) = state();
        let response = router(state)
            .oneshot(update_request("99:wrong", TEXT_UPDATE))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn valid_update_is_acknowledged_and_runs_a_turn() {
        let (state, cache) = state();
        let response =
            router(state).oneshot(update_request(BOT_TOKEN, TEXT_UPDATE)).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        // The turn runs detached: a stranger's "hello" starts onboarding,
        // which persists the conversation even though delivery fails.
        let key = conversation_key(tally_core::domain::account::ChatId(123));
        for _ in 0..100 {
            if cache.fetch(&key).await.expect("fetch").is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("conversation was not persisted by the detached turn");
    }

    #[tokio::test]
    async fn non_text_update_is_acknowledged_and_ignored() {
        let (state, cache) = state();
        let response = router(state)
            .oneshot(update_request(BOT_TOKEN, r#"{ "update_id": 8 }"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let key = conversation_key(tally_core::domain::account::ChatId(123));
        assert!(cache.fetch(&key).await.expect("fetch").is_none());
    }
}
