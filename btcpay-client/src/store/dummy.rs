use std::collections::HashMap;

use async_trait::async_trait;
use btcpay_core::{
    invoice::{Invoice, InvoiceAdditionalStatus, InvoicePaymentMethod, InvoiceRequest, InvoiceStatus},
    payment_request::{PaymentRequest, PaymentRequestRequest, PaymentRequestStatus},
    server::ServerStatus,
};
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Store;
use crate::{config::Credentials, error::BtcPayError};

/// In-memory store for tests and local development. Nothing is sent over the network.
///
/// Created invoices are immediately `Settled`. Webhooks are verified exactly like on a real
/// store, the rate check uses the payment methods added with [`DummyStore::add_payment_methods`].
#[derive(Debug, Default)]
pub struct DummyStore {
    credentials: Credentials,
    invoices: Mutex<HashMap<String, Invoice>>,
    payment_requests: Mutex<HashMap<String, PaymentRequest>>,
    payment_methods: Mutex<HashMap<String, Vec<InvoicePaymentMethod>>>,
}

impl DummyStore {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    pub async fn add_payment_methods(&self, invoice_id: &str, methods: Vec<InvoicePaymentMethod>) {
        self.payment_methods
            .lock()
            .await
            .insert(invoice_id.to_owned(), methods);
    }
}

#[async_trait]
impl Store for DummyStore {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    async fn check_auth(&self) -> Result<(), BtcPayError> {
        Ok(())
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, BtcPayError> {
        let id = format!("dummy-invoice-{}", Uuid::new_v4());
        let now = Utc::now().timestamp();
        let checkout = request.checkout.clone().unwrap_or_default();

        let invoice = Invoice {
            checkout_link: self.invoice_checkout_link(&id, false),
            created_time: now,
            expiration_time: now + 60 * i64::from(checkout.expiration_minutes.unwrap_or(0)),
            monitoring_expiration: now + 60 * i64::from(checkout.monitoring_minutes.unwrap_or(0)),
            status: InvoiceStatus::Settled,
            additional_status: InvoiceAdditionalStatus::None,
            request: request.clone(),
            id: id.clone(),
        };
        self.invoices.lock().await.insert(id, invoice.clone());
        Ok(invoice)
    }

    async fn get_invoice(&self, id: &str) -> Result<Invoice, BtcPayError> {
        self.invoices
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or(BtcPayError::NotFound)
    }

    async fn get_invoice_payment_methods(
        &self,
        invoice_id: &str,
    ) -> Result<Vec<InvoicePaymentMethod>, BtcPayError> {
        if let Some(methods) = self.payment_methods.lock().await.get(invoice_id) {
            return Ok(methods.clone());
        }
        if self.invoices.lock().await.contains_key(invoice_id) {
            return Ok(vec![]);
        }
        Err(BtcPayError::NotFound)
    }

    async fn create_payment_request(
        &self,
        request: &PaymentRequestRequest,
    ) -> Result<PaymentRequest, BtcPayError> {
        let id = format!("dummy-payment-request-{}", Uuid::new_v4());
        let payment_request = PaymentRequest {
            id: id.clone(),
            status: PaymentRequestStatus::Pending,
            created: Utc::now().to_rfc3339(),
            archived: false,
            request: request.clone(),
        };
        self.payment_requests
            .lock()
            .await
            .insert(id, payment_request.clone());
        Ok(payment_request)
    }

    async fn get_payment_request(&self, id: &str) -> Result<PaymentRequest, BtcPayError> {
        self.payment_requests
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or(BtcPayError::NotFound)
    }

    async fn get_server_status(&self) -> Result<ServerStatus, BtcPayError> {
        Ok(ServerStatus {
            version: "dummy".to_owned(),
            fully_synched: true,
            ..Default::default()
        })
    }
}
