use std::path::Path;

use async_trait::async_trait;
use btcpay_core::{
    invoice::{Invoice, InvoicePaymentMethod, InvoiceRequest},
    payment_request::{PaymentRequest, PaymentRequestRequest},
    server::ServerStatus,
};
use tracing::info;
use url::form_urlencoded;

use super::Store;
use crate::{config::Credentials, error::BtcPayError, http::BtcPayHttpClient};

/// Invoice id that never exists on a server, used by the auth check.
const NOT_EXISTING_INVOICE: &str = "not-existing";

/// A store on a real BTCPay server, accessed through the Greenfield api.
#[derive(Debug, Clone)]
pub struct ServerStore {
    credentials: Credentials,
    client: BtcPayHttpClient,
}

impl ServerStore {
    pub fn new(credentials: Credentials) -> Result<Self, BtcPayError> {
        let client = BtcPayHttpClient::new(&credentials.uri, &credentials.user_api_key)?;
        Ok(Self {
            credentials,
            client,
        })
    }

    /// Loads the credentials file at `path` and runs [`Store::check_auth`].
    ///
    /// If the file doesn't exist, an empty template is created and an error is returned.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BtcPayError> {
        let store = Self::new(Credentials::load(path)?)?;
        store.check_auth().await?;
        Ok(store)
    }

    fn store_path(&self, path: &str) -> String {
        format!("stores/{}/{}", self.credentials.store_id, path)
    }
}

/// Escapes `id` so it stays a single path segment below its collection.
fn path_segment(id: &str) -> Result<String, BtcPayError> {
    // empty, "." and ".." would resolve to a different endpoint, even when escaped
    if id.chars().all(|c| c == '.') {
        return Err(BtcPayError::InvalidId(id.to_owned()));
    }
    Ok(form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20"))
}

#[async_trait]
impl Store for ServerStore {
    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // The server authenticates and authorizes before it validates the payload, so an empty
    // invoice must be rejected as a bad request and an unknown invoice must be not found.
    async fn check_auth(&self) -> Result<(), BtcPayError> {
        match self
            .client
            .do_post::<Invoice, _>(&self.store_path("invoices"), &serde_json::Value::Null)
            .await
        {
            Err(BtcPayError::BadRequest) => {}
            Err(err) => return Err(err),
            Ok(_) => {
                return Err(BtcPayError::AuthCheck(
                    "server accepted an empty invoice request".to_owned(),
                ))
            }
        }

        match self.get_invoice(NOT_EXISTING_INVOICE).await {
            Err(BtcPayError::NotFound) => {}
            Err(err) => return Err(err),
            Ok(_) => {
                return Err(BtcPayError::AuthCheck(format!(
                    "server returned an invoice for id {NOT_EXISTING_INVOICE}"
                )))
            }
        }

        info!("auth check passed for store {}", self.credentials.store_id);
        Ok(())
    }

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, BtcPayError> {
        self.client
            .do_post(&self.store_path("invoices"), request)
            .await
    }

    async fn get_invoice(&self, id: &str) -> Result<Invoice, BtcPayError> {
        self.client
            .do_get(&self.store_path(&format!("invoices/{}", path_segment(id)?)))
            .await
    }

    async fn get_invoice_payment_methods(
        &self,
        invoice_id: &str,
    ) -> Result<Vec<InvoicePaymentMethod>, BtcPayError> {
        self.client
            .do_get(&self.store_path(&format!(
                "invoices/{}/payment-methods",
                path_segment(invoice_id)?
            )))
            .await
    }

    async fn create_payment_request(
        &self,
        request: &PaymentRequestRequest,
    ) -> Result<PaymentRequest, BtcPayError> {
        self.client
            .do_post(&self.store_path("payment-requests"), request)
            .await
    }

    async fn get_payment_request(&self, id: &str) -> Result<PaymentRequest, BtcPayError> {
        self.client
            .do_get(&self.store_path(&format!("payment-requests/{}", path_segment(id)?)))
            .await
    }

    async fn get_server_status(&self) -> Result<ServerStatus, BtcPayError> {
        self.client.do_get("server/info").await
    }
}
