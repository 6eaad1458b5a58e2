use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentRequestStatus {
    Pending,
    Completed,
    Expired,
}

/// A reusable request for payment. Mandatory fields are amount, currency and title.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestRequest {
    pub amount: Decimal,
    /// ISO 4217 currency code (BTC, EUR, USD, ...)
    pub currency: String,
    pub title: String,
    /// HTML
    pub description: Option<String>,
    pub email: Option<String>,
    /// RFC 3339 date
    pub expiry_date: Option<String>,
    #[serde(default)]
    pub allow_custom_payment_amounts: bool,
    #[serde(rename = "customCSSLink")]
    pub custom_css_link: Option<String>,
    /// CSS up to 500 bytes
    #[serde(rename = "embeddedCSS")]
    pub embedded_css: Option<String>,
}

impl PaymentRequestRequest {
    pub fn new(amount: Decimal, currency: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sets the expiry date `days` from now and returns it.
    ///
    /// Returns `None` and keeps the previous expiry date if the result is not a valid date.
    pub fn set_expiry_days(&mut self, days: i64) -> Option<&str> {
        let expiry = TimeDelta::try_days(days)
            .and_then(|delta| Utc::now().checked_add_signed(delta))?;
        self.expiry_date = Some(expiry.to_rfc3339());
        self.expiry_date.as_deref()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub id: String,
    pub status: PaymentRequestStatus,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(flatten)]
    pub request: PaymentRequestRequest,
}
