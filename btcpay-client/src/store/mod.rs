use async_trait::async_trait;
use btcpay_core::{
    event::InvoiceEvent,
    invoice::{Invoice, InvoicePaymentMethod, InvoiceRequest},
    payment_request::{PaymentRequest, PaymentRequestRequest},
    server::ServerStatus,
};
use reqwest::header::HeaderMap;

use crate::{config::Credentials, error::BtcPayError, webhook};

pub mod dummy;
pub mod server;

#[cfg(test)]
use mockall::automock;

/// Everything a merchant application does with one store of a payment server.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Store: Send + Sync {
    fn credentials(&self) -> &Credentials;

    /// Verifies once at startup that the credentials authenticate and carry the permissions
    /// needed for invoices. Returns `Unauthenticated`, `Unauthorized` or `Ok(())`.
    async fn check_auth(&self) -> Result<(), BtcPayError>;

    async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, BtcPayError>;

    async fn get_invoice(&self, id: &str) -> Result<Invoice, BtcPayError>;

    async fn get_invoice_payment_methods(
        &self,
        invoice_id: &str,
    ) -> Result<Vec<InvoicePaymentMethod>, BtcPayError>;

    async fn create_payment_request(
        &self,
        request: &PaymentRequestRequest,
    ) -> Result<PaymentRequest, BtcPayError>;

    async fn get_payment_request(&self, id: &str) -> Result<PaymentRequest, BtcPayError>;

    /// Requires no specific permissions.
    async fn get_server_status(&self) -> Result<ServerStatus, BtcPayError>;

    /// Authenticates a webhook request and returns the event it carries, see [`webhook::process_webhook`].
    async fn process_webhook(
        &self,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<InvoiceEvent, BtcPayError> {
        webhook::process_webhook(self, headers, body).await
    }

    fn invoice_checkout_link(&self, id: &str, prefer_onion: bool) -> String {
        self.credentials().invoice_checkout_link(id, prefer_onion)
    }

    fn payment_request_link(&self, id: &str, prefer_onion: bool) -> String {
        self.credentials().payment_request_link(id, prefer_onion)
    }
}
