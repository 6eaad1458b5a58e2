//! A minimal BTCPay server that speaks enough of the Greenfield api for the client.
//!
//! Requests are authenticated like on a real server: a wrong token is rejected with 401,
//! [`READ_ONLY_API_KEY`] authenticates but has no store permissions (403), and payloads are
//! validated only after that (400).

use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::Mutex};
use tracing::info;
use uuid::Uuid;

pub const API_KEY: &str = "mock-api-key";
pub const READ_ONLY_API_KEY: &str = "mock-read-only-key";
pub const STORE_ID: &str = "store-1";

type MockResult = Result<Json<Value>, (StatusCode, String)>;

#[derive(Debug, Default)]
struct MockData {
    base_url: String,
    btc_rate: Decimal,
    forced_status: Option<StatusCode>,
    invoice_lookup_status: Option<StatusCode>,
    invoices: HashMap<String, Value>,
    payment_methods: HashMap<String, Value>,
    payment_requests: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct BtcPayMock {
    data: Arc<Mutex<MockData>>,
}

impl BtcPayMock {
    /// `btc_rate` is quoted in the payment methods of every invoice created afterwards.
    pub fn new(btc_rate: Decimal) -> Self {
        Self {
            data: Arc::new(Mutex::new(MockData {
                btc_rate,
                ..Default::default()
            })),
        }
    }

    /// Answers every api request with `status`, before authentication.
    pub async fn force_status(&self, status: Option<u16>) -> anyhow::Result<()> {
        self.data.lock().await.forced_status = status.map(StatusCode::from_u16).transpose()?;
        Ok(())
    }

    /// Answers only invoice lookups (`GET invoices/:invoice_id`) with `status`.
    pub async fn force_invoice_lookup_status(&self, status: Option<u16>) -> anyhow::Result<()> {
        self.data.lock().await.invoice_lookup_status =
            status.map(StatusCode::from_u16).transpose()?;
        Ok(())
    }

    pub async fn set_btc_rate(&self, btc_rate: Decimal) {
        self.data.lock().await.btc_rate = btc_rate;
    }

    /// Binds to a free local port, serves the api in the background and returns the base url.
    pub async fn run_server(&self) -> anyhow::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        self.data.lock().await.base_url = base_url.clone();

        let app = Router::new()
            .route("/api/v1/server/info", get(get_server_info))
            .route("/api/v1/stores/:store_id/invoices", post(post_invoice))
            .route(
                "/api/v1/stores/:store_id/invoices/:invoice_id",
                get(get_invoice),
            )
            .route(
                "/api/v1/stores/:store_id/invoices/:invoice_id/payment-methods",
                get(get_payment_methods),
            )
            .route(
                "/api/v1/stores/:store_id/payment-requests",
                post(post_payment_request),
            )
            .route(
                "/api/v1/stores/:store_id/payment-requests/:payment_request_id",
                get(get_payment_request),
            )
            .with_state(self.clone());

        info!("btcpay mock listening on {}", base_url);
        tokio::spawn(async move { axum::serve(listener, app).await });
        Ok(base_url)
    }

    /// Posts `event` to `url` the way the server delivers webhooks.
    pub async fn deliver_webhook(
        &self,
        url: &str,
        secret: &str,
        event: &Value,
    ) -> anyhow::Result<reqwest::StatusCode> {
        let body = serde_json::to_vec(event)?;
        let response = reqwest::Client::new()
            .post(url)
            .header("BTCPay-Sig", btcpay_client::webhook::sign(secret, &body))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        Ok(response.status())
    }
}

fn authorize(
    data: &MockData,
    headers: &HeaderMap,
    store_id: Option<&str>,
) -> Result<(), (StatusCode, String)> {
    if let Some(status) = data.forced_status {
        return Err((status, format!("forced status {}", status.as_u16())));
    }

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("token "));

    match (token, store_id) {
        (Some(API_KEY), None | Some(STORE_ID)) | (Some(READ_ONLY_API_KEY), None) => Ok(()),
        (Some(API_KEY | READ_ONLY_API_KEY), Some(_)) => {
            Err((StatusCode::FORBIDDEN, "missing store permission".to_owned()))
        }
        _ => Err((StatusCode::UNAUTHORIZED, "invalid api key".to_owned())),
    }
}

fn bad_request(message: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.to_owned())
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "not found".to_owned())
}

fn parse_object(body: &[u8], required: &[&str]) -> Result<Map<String, Value>, (StatusCode, String)> {
    let Ok(Value::Object(object)) = serde_json::from_slice::<Value>(body) else {
        return Err(bad_request("expected a json object"));
    };
    if let Some(missing) = required.iter().find(|key| !object.contains_key(**key)) {
        return Err(bad_request(&format!("{missing} is required")));
    }
    Ok(object)
}

async fn post_invoice(
    State(mock): State<BtcPayMock>,
    Path(store_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> MockResult {
    let mut data = mock.data.lock().await;
    authorize(&data, &headers, Some(&store_id))?;
    let mut invoice = parse_object(&body, &["amount", "currency"])?;

    let id = Uuid::new_v4().simple().to_string();
    let now = Utc::now().timestamp();
    let checkout_minutes = |key: &str, default: i64| {
        invoice
            .get("checkout")
            .and_then(|checkout| checkout.get(key))
            .and_then(Value::as_i64)
            .unwrap_or(default)
    };
    let expiration_time = now + 60 * checkout_minutes("expirationMinutes", 15);
    let monitoring_expiration = now + 60 * checkout_minutes("monitoringMinutes", 1440);

    invoice.insert("id".to_owned(), json!(id));
    invoice.insert("storeId".to_owned(), json!(store_id));
    invoice.insert(
        "checkoutLink".to_owned(),
        json!(format!("{}/i/{}", data.base_url, id)),
    );
    invoice.insert("createdTime".to_owned(), json!(now));
    invoice.insert("expirationTime".to_owned(), json!(expiration_time));
    invoice.insert("monitoringExpiration".to_owned(), json!(monitoring_expiration));
    invoice.insert("status".to_owned(), json!("New"));
    invoice.insert("additionalStatus".to_owned(), json!("None"));
    let invoice = Value::Object(invoice);

    let payment_methods = json!([
        {
            "paymentMethod": "BTC",
            "cryptoCode": "BTC",
            "destination": "bcrt1qv6k0u6uqrn3flm0zwrrx3evytfw7u3q4gpfqyd",
            "rate": data.btc_rate.to_string(),
            "amount": "0.0001",
            "due": "0.0001",
            "payments": []
        },
        {
            "paymentMethod": "BTC-LightningNetwork",
            "cryptoCode": "BTC",
            "destination": "lnbcrt10u1pjmockinvoice",
            "rate": data.btc_rate.to_string(),
            "amount": "0.0001",
            "due": "0.0001",
            "payments": []
        }
    ]);

    data.payment_methods.insert(id.clone(), payment_methods);
    data.invoices.insert(id, invoice.clone());
    Ok(Json(invoice))
}

async fn get_invoice(
    State(mock): State<BtcPayMock>,
    Path((store_id, invoice_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> MockResult {
    let data = mock.data.lock().await;
    if let Some(status) = data.invoice_lookup_status {
        return Err((status, format!("forced status {}", status.as_u16())));
    }
    authorize(&data, &headers, Some(&store_id))?;
    data.invoices
        .get(&invoice_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn get_payment_methods(
    State(mock): State<BtcPayMock>,
    Path((store_id, invoice_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> MockResult {
    let data = mock.data.lock().await;
    authorize(&data, &headers, Some(&store_id))?;
    data.payment_methods
        .get(&invoice_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn post_payment_request(
    State(mock): State<BtcPayMock>,
    Path(store_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> MockResult {
    let mut data = mock.data.lock().await;
    authorize(&data, &headers, Some(&store_id))?;
    let mut payment_request = parse_object(&body, &["amount", "currency", "title"])?;

    let id = Uuid::new_v4().simple().to_string();
    payment_request.insert("id".to_owned(), json!(id));
    payment_request.insert("storeId".to_owned(), json!(store_id));
    payment_request.insert("status".to_owned(), json!("Pending"));
    payment_request.insert("created".to_owned(), json!(Utc::now().to_rfc3339()));
    payment_request.insert("archived".to_owned(), json!(false));
    let payment_request = Value::Object(payment_request);

    data.payment_requests.insert(id, payment_request.clone());
    Ok(Json(payment_request))
}

async fn get_payment_request(
    State(mock): State<BtcPayMock>,
    Path((store_id, payment_request_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> MockResult {
    let data = mock.data.lock().await;
    authorize(&data, &headers, Some(&store_id))?;
    data.payment_requests
        .get(&payment_request_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn get_server_info(State(mock): State<BtcPayMock>, headers: HeaderMap) -> MockResult {
    let data = mock.data.lock().await;
    authorize(&data, &headers, None)?;
    Ok(Json(json!({
        "version": "1.12.5",
        "onion": null,
        "supportedPaymentMethods": ["BTC", "BTC-LightningNetwork"],
        "fullySynched": true,
        "syncStatus": [
            {
                "cryptoCode": "BTC",
                "chainHeight": 820000,
                "syncHeight": 820000,
                "nodeInformation": {
                    "headers": 820000,
                    "blocks": 820000,
                    "verificationProgress": 1.0
                }
            }
        ]
    })))
}
