//! Invoices and the per-asset payment details the server attaches to them.
//!
//! Amounts and rates are [`Decimal`]s. They are written as JSON strings and accepted
//! as strings or numbers, so an amount of `1.23` never passes through a float.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    New,
    Processing,
    Expired,
    Invalid,
    Settled,
}

impl InvoiceStatus {
    pub const fn is_final(&self) -> bool {
        matches!(self, Self::Expired | Self::Invalid | Self::Settled)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InvoiceAdditionalStatus {
    #[default]
    None,
    PaidLate,
    PaidPartial,
    Marked,
    Invalid,
    PaidOver,
}

/// Defines when an invoice is considered confirmed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SpeedPolicy {
    HighSpeed,
    MediumSpeed,
    LowMediumSpeed,
    LowSpeed,
}

impl SpeedPolicy {
    /// Number of confirmations the payment transaction needs before the invoice settles.
    pub const fn confirmations(&self) -> u32 {
        match self {
            Self::HighSpeed => 0,
            Self::MediumSpeed => 1,
            Self::LowMediumSpeed => 2,
            Self::LowSpeed => 6,
        }
    }
}

/// Additional information that is stored with the invoice and echoed in webhooks.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceMetadata {
    /// If the invoice has been created through a payment request, this is usually the id of the payment request.
    pub order_id: Option<String>,

    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceCheckout {
    /// Falls back to the store setting if unset.
    pub speed_policy: Option<SpeedPolicy>,
    pub payment_methods: Option<Vec<String>>,
    /// Refers to the "paid" state, when the transaction becomes visible on the blockchain.
    pub expiration_minutes: Option<u32>,
    pub monitoring_minutes: Option<u32>,
    /// Percentage below the invoice amount that is still accepted as full payment.
    pub payment_tolerance: Option<f64>,
    #[serde(rename = "redirectURL")]
    pub redirect_url: Option<String>,
    pub default_language: Option<String>,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct InvoiceRequest {
    pub amount: Decimal,
    /// ISO 4217 currency code (BTC, EUR, USD, ...)
    pub currency: String,
    pub metadata: Option<InvoiceMetadata>,
    pub checkout: Option<InvoiceCheckout>,
}

impl InvoiceRequest {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            metadata: None,
            checkout: None,
        }
    }

    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.metadata.get_or_insert_with(Default::default).order_id = Some(order_id.into());
        self
    }

    pub fn with_checkout(mut self, checkout: InvoiceCheckout) -> Self {
        self.checkout = Some(checkout);
        self
    }

    pub fn order_id(&self) -> Option<&str> {
        self.metadata.as_ref()?.order_id.as_deref()
    }
}

/// An invoice as created and returned by the server. Timestamps are unix seconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub checkout_link: String,
    pub created_time: i64,
    pub expiration_time: i64,
    pub monitoring_expiration: i64,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub additional_status: InvoiceAdditionalStatus,
    #[serde(flatten)]
    pub request: InvoiceRequest,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    Invalid,
    Processing,
    Settled,
}

/// A single on-chain or lightning payment towards an invoice.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub received_date: i64,
    pub value: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    pub status: PaymentStatus,
    pub destination: String,
}

/// Payment details of one asset offered by an invoice.
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePaymentMethod {
    #[serde(alias = "paymentMethodId")]
    pub payment_method: String,
    #[serde(alias = "currency")]
    pub crypto_code: Option<String>,
    pub destination: String,
    pub payment_link: Option<String>,
    /// Exchange rate quoted by the server, in invoice currency per unit of the asset.
    pub rate: Decimal,
    #[serde(default)]
    pub payment_method_paid: Decimal,
    #[serde(default)]
    pub total_paid: Decimal,
    #[serde(default)]
    pub due: Decimal,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub network_fee: Decimal,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

impl InvoicePaymentMethod {
    /// The asset this method pays in, e.g. `BTC` for both `BTC` and `BTC-LightningNetwork`.
    pub fn asset_code(&self) -> &str {
        self.crypto_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .unwrap_or(&self.payment_method)
    }
}
