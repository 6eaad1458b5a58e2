use std::{collections::HashMap, sync::Arc};

use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode, routing::post, Router};
use btcpay_client::{
    config::Credentials,
    error::BtcPayError,
    store::{server::ServerStore, Store},
};
use btcpay_core::event::InvoiceEvent;
use rust_decimal::Decimal;
use tokio::{
    net::TcpListener,
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::btcpaymock::{BtcPayMock, API_KEY, STORE_ID};

pub const WEBHOOK_SECRET: &str = "mock-webhook-secret";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

pub fn credentials(uri: &str, api_key: &str) -> Credentials {
    Credentials {
        uri: uri.to_owned(),
        user_api_key: api_key.to_owned(),
        store_id: STORE_ID.to_owned(),
        webhook_secret: WEBHOOK_SECRET.to_owned(),
        ..Default::default()
    }
}

/// Starts a mock server quoting `btc_rate` and returns it with a store using the valid api key.
pub async fn start_btcpay_mock(btc_rate: Decimal) -> anyhow::Result<(BtcPayMock, ServerStore)> {
    init_tracing();
    let mock = BtcPayMock::new(btc_rate);
    let uri = mock.run_server().await?;
    let store = ServerStore::new(credentials(&uri, API_KEY))?;
    Ok((mock, store))
}

/// Same as [`start_btcpay_mock`] but with rate ceilings per asset code.
pub async fn start_btcpay_mock_with_max_rates(
    btc_rate: Decimal,
    max_rates: HashMap<String, Decimal>,
) -> anyhow::Result<(BtcPayMock, ServerStore)> {
    init_tracing();
    let mock = BtcPayMock::new(btc_rate);
    let uri = mock.run_server().await?;
    let store = ServerStore::new(Credentials {
        max_rates,
        ..credentials(&uri, API_KEY)
    })?;
    Ok((mock, store))
}

#[derive(Clone)]
struct WebhookReceiver {
    store: Arc<dyn Store>,
    events: UnboundedSender<Result<InvoiceEvent, BtcPayError>>,
}

async fn receive_webhook(
    State(receiver): State<WebhookReceiver>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let result = receiver.store.process_webhook(&headers, &body).await;
    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(err) if err.is_webhook_rejection() => StatusCode::UNAUTHORIZED,
        Err(_) => StatusCode::BAD_REQUEST,
    };
    let _ = receiver.events.send(result);
    status
}

/// Runs a merchant endpoint that hands every webhook to `store` and forwards the outcome.
///
/// Returns the url to deliver webhooks to.
pub async fn start_webhook_receiver(
    store: Arc<dyn Store>,
) -> anyhow::Result<(String, UnboundedReceiver<Result<InvoiceEvent, BtcPayError>>)> {
    let (events, received) = mpsc::unbounded_channel();
    let app = Router::new()
        .route("/webhook", post(receive_webhook))
        .with_state(WebhookReceiver { store, events });

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let url = format!("http://{}/webhook", listener.local_addr()?);
    info!("webhook receiver listening on {}", url);
    tokio::spawn(async move { axum::serve(listener, app).await });
    Ok((url, received))
}
