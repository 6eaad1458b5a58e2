use std::{collections::HashMap, sync::Arc};

use btcpay_client::{error::BtcPayError, store::Store};
use btcpay_core::{event::EventType, invoice::InvoiceRequest};
use itests::{
    btcpaymock::STORE_ID,
    setup::{start_btcpay_mock, start_btcpay_mock_with_max_rates, start_webhook_receiver, WEBHOOK_SECRET},
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

fn invoice_event(event_type: &str, store_id: &str, invoice_id: &str) -> Value {
    json!({
        "deliveryId": "delivery-abcdefghijkl",
        "webhookId": "webhook-abcdefghijklmn",
        "originalDeliveryId": "delivery-abcdefghijkl",
        "isRedelivery": false,
        "type": event_type,
        "timestamp": 1700000000,
        "storeId": store_id,
        "invoiceId": invoice_id,
        "metadata": { "orderId": "order-42" }
    })
}

#[tokio::test]
async fn test_webhook_is_accepted() -> anyhow::Result<()> {
    let (mock, store) = start_btcpay_mock(dec!(40000)).await?;
    let (url, mut events) = start_webhook_receiver(Arc::new(store)).await?;

    let status = mock
        .deliver_webhook(&url, WEBHOOK_SECRET, &invoice_event("InvoiceCreated", STORE_ID, "inv-1"))
        .await?;
    assert_eq!(status, reqwest::StatusCode::OK);

    let event = events.recv().await.expect("event received")?;
    assert_eq!(event.event_type, EventType::Created);
    assert_eq!(event.invoice_id, "inv-1");
    assert_eq!(event.order_id(), Some("order-42"));
    Ok(())
}

#[tokio::test]
async fn test_webhook_with_wrong_secret_is_rejected() -> anyhow::Result<()> {
    let (mock, store) = start_btcpay_mock(dec!(40000)).await?;
    let (url, mut events) = start_webhook_receiver(Arc::new(store)).await?;

    let status = mock
        .deliver_webhook(&url, "other-secret", &invoice_event("InvoiceSettled", STORE_ID, "inv-1"))
        .await?;
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
    assert!(matches!(
        events.recv().await,
        Some(Err(BtcPayError::SignatureMismatch))
    ));
    Ok(())
}

#[tokio::test]
async fn test_webhook_without_signature_is_rejected() -> anyhow::Result<()> {
    let (_mock, store) = start_btcpay_mock(dec!(40000)).await?;
    let (url, mut events) = start_webhook_receiver(Arc::new(store)).await?;

    let status = reqwest::Client::new()
        .post(&url)
        .json(&invoice_event("InvoiceCreated", STORE_ID, "inv-1"))
        .send()
        .await?
        .status();
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
    assert!(matches!(
        events.recv().await,
        Some(Err(BtcPayError::SignatureMissing))
    ));
    Ok(())
}

#[tokio::test]
async fn test_webhook_for_other_store_is_rejected() -> anyhow::Result<()> {
    let (mock, store) = start_btcpay_mock(dec!(40000)).await?;
    let (url, mut events) = start_webhook_receiver(Arc::new(store)).await?;

    let status = mock
        .deliver_webhook(&url, WEBHOOK_SECRET, &invoice_event("InvoiceCreated", "store-2", "inv-1"))
        .await?;
    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
    match events.recv().await {
        Some(Err(BtcPayError::StoreMismatch { expected, actual })) => {
            assert_eq!(expected, STORE_ID);
            assert_eq!(actual, "store-2");
        }
        other => panic!("unexpected result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_webhook_with_unknown_event_type_is_rejected() -> anyhow::Result<()> {
    let (mock, store) = start_btcpay_mock(dec!(40000)).await?;
    let (url, mut events) = start_webhook_receiver(Arc::new(store)).await?;

    let status = mock
        .deliver_webhook(&url, WEBHOOK_SECRET, &invoice_event("PayoutCreated", STORE_ID, "inv-1"))
        .await?;
    assert_eq!(status, reqwest::StatusCode::BAD_REQUEST);
    assert!(matches!(
        events.recv().await,
        Some(Err(BtcPayError::Decoding(_)))
    ));
    Ok(())
}

async fn deliver_with_ceiling(btc_rate: Decimal, ceiling: Decimal) -> anyhow::Result<Result<(), BtcPayError>> {
    let max_rates = HashMap::from([("BTC".to_owned(), ceiling)]);
    let (mock, store) = start_btcpay_mock_with_max_rates(btc_rate, max_rates).await?;
    let invoice = store
        .create_invoice(&InvoiceRequest::new(dec!(10), "EUR"))
        .await?;

    let (url, mut events) = start_webhook_receiver(Arc::new(store)).await?;
    mock.deliver_webhook(
        &url,
        WEBHOOK_SECRET,
        &invoice_event("InvoiceReceivedPayment", STORE_ID, &invoice.id),
    )
    .await?;

    let result = events.recv().await.expect("event received");
    Ok(result.map(|event| assert_eq!(event.invoice_id, invoice.id)))
}

#[tokio::test]
async fn test_webhook_rate_below_ceiling_is_accepted() -> anyhow::Result<()> {
    deliver_with_ceiling(dec!(39000), dec!(40000)).await??;
    Ok(())
}

#[tokio::test]
async fn test_webhook_rate_at_ceiling_is_accepted() -> anyhow::Result<()> {
    deliver_with_ceiling(dec!(40000), dec!(40000)).await??;
    Ok(())
}

#[tokio::test]
async fn test_webhook_rate_above_ceiling_is_rejected() -> anyhow::Result<()> {
    match deliver_with_ceiling(dec!(40000.01), dec!(40000)).await? {
        Err(BtcPayError::RateExceedsCeiling { asset, rate, ceiling }) => {
            assert_eq!(asset, "BTC");
            assert_eq!(rate, dec!(40000.01));
            assert_eq!(ceiling, dec!(40000));
        }
        other => panic!("unexpected result {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_rate_change_after_invoice_creation_is_not_seen() -> anyhow::Result<()> {
    let max_rates = HashMap::from([("BTC".to_owned(), dec!(40000))]);
    let (mock, store) = start_btcpay_mock_with_max_rates(dec!(50000), max_rates).await?;
    let invoice = store
        .create_invoice(&InvoiceRequest::new(dec!(10), "EUR"))
        .await?;
    // quotes are fixed when the invoice is created
    mock.set_btc_rate(dec!(30000)).await;

    let (url, mut events) = start_webhook_receiver(Arc::new(store)).await?;
    mock.deliver_webhook(
        &url,
        WEBHOOK_SECRET,
        &invoice_event("InvoiceSettled", STORE_ID, &invoice.id),
    )
    .await?;
    assert!(matches!(
        events.recv().await,
        Some(Err(BtcPayError::RateExceedsCeiling { .. }))
    ));
    Ok(())
}
