//! Webhook notifications sent by the server for invoice lifecycle changes.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::invoice::{InvoiceMetadata, Payment};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    #[serde(rename = "InvoiceCreated")]
    Created,
    #[serde(rename = "InvoiceProcessing")]
    Processing,
    #[serde(rename = "InvoiceReceivedPayment")]
    ReceivedPayment,
    #[serde(rename = "InvoiceExpired")]
    Expired,
    #[serde(rename = "InvoiceInvalid")]
    Invalid,
    /// The invoice has been paid in time, the full amount has been paid and the
    /// transaction got the confirmations required by its speed policy.
    #[serde(rename = "InvoiceSettled")]
    Settled,
    #[serde(rename = "InvoicePaymentSettled")]
    PaymentSettled,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceEvent {
    #[serde(default)]
    pub delivery_id: String,
    #[serde(default)]
    pub webhook_id: String,
    #[serde(default)]
    pub original_delivery_id: String,
    #[serde(default)]
    pub is_redelivery: bool,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(default)]
    pub timestamp: i64,
    pub store_id: String,
    pub invoice_id: String,
    pub metadata: Option<InvoiceMetadata>,

    // InvoiceInvalid and InvoiceSettled
    #[serde(default)]
    pub manually_marked: bool,

    // InvoiceReceivedPayment, whether the payment arrived after the invoice expired
    #[serde(default)]
    pub after_expiration: bool,

    // InvoiceExpired
    #[serde(default)]
    pub partially_paid: bool,

    // InvoiceProcessing
    #[serde(default)]
    pub over_paid: bool,

    // InvoiceReceivedPayment and InvoicePaymentSettled
    pub payment: Option<Payment>,
}

impl InvoiceEvent {
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.order_id.as_deref()
    }
}
