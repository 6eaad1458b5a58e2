//! Authentication of webhook notifications.
//!
//! The server signs the raw body of every webhook with the store's webhook secret and sends
//! the result as `BTCPay-Sig: sha256=<hex HMAC-SHA256>`. [`process_webhook`] only trusts an
//! event after, in this order:
//!
//! 1. the signature header is present,
//! 2. the HMAC of the exact bytes received matches it (compared in constant time),
//! 3. the body decodes as an [`InvoiceEvent`],
//! 4. the event belongs to the configured store,
//! 5. no payment method of the invoice quotes a rate above its configured ceiling.
//!
//! Every step fails with its own error and nothing after a failed step is executed.

use std::collections::HashMap;

use btcpay_core::{event::InvoiceEvent, invoice::InvoicePaymentMethod};
use hmac::{Hmac, Mac};
use reqwest::header::HeaderMap;
use rust_decimal::Decimal;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{error::BtcPayError, store::Store};

type HmacSha256 = Hmac<Sha256>;

/// Name of the signature header (`BTCPay-Sig`), header names are case-insensitive.
pub const SIGNATURE_HEADER: &str = "btcpay-sig";

pub const SIGNATURE_PREFIX: &str = "sha256=";

fn compute_mac(secret: &str, body: &[u8]) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC key can be of any size"),
    };
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Returns the header value the server would send for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    format!("{SIGNATURE_PREFIX}{}", hex::encode(compute_mac(secret, body)))
}

/// Checks the signature header against the HMAC of `body`. The body is not interpreted.
pub fn verify_signature(headers: &HeaderMap, body: &[u8], secret: &str) -> Result<(), BtcPayError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();
    if signature.is_empty() {
        return Err(BtcPayError::SignatureMissing);
    }

    let digest = signature
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(BtcPayError::SignatureMismatch)?;
    if digest.is_empty() {
        return Err(BtcPayError::SignatureMissing);
    }
    let provided = hex::decode(digest).map_err(|_| BtcPayError::SignatureMismatch)?;

    // an empty secret would let anyone sign
    if secret.is_empty() {
        return Err(BtcPayError::SignatureMismatch);
    }

    let expected = compute_mac(secret, body);
    if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        Ok(())
    } else {
        Err(BtcPayError::SignatureMismatch)
    }
}

/// Decodes an authenticated body and makes sure it belongs to `store_id`.
pub fn decode_event(body: &[u8], store_id: &str) -> Result<InvoiceEvent, BtcPayError> {
    let event: InvoiceEvent = serde_json::from_slice(body).map_err(BtcPayError::Decoding)?;

    // the webhook secret is not bound to a store on every deployment
    if event.store_id != store_id {
        return Err(BtcPayError::StoreMismatch {
            expected: store_id.to_owned(),
            actual: event.store_id,
        });
    }
    Ok(event)
}

/// Fails if a payment method quotes a rate above the ceiling configured for its asset.
/// Assets without a ceiling are not checked, a rate equal to the ceiling is accepted.
pub fn check_rates(
    methods: &[InvoicePaymentMethod],
    max_rates: &HashMap<String, Decimal>,
) -> Result<(), BtcPayError> {
    for method in methods {
        let ceiling = max_rates
            .get(method.asset_code())
            .or_else(|| max_rates.get(&method.payment_method));

        if let Some(ceiling) = ceiling {
            if method.rate > *ceiling {
                return Err(BtcPayError::RateExceedsCeiling {
                    asset: method.asset_code().to_owned(),
                    rate: method.rate,
                    ceiling: *ceiling,
                });
            }
        }
    }
    Ok(())
}

/// Turns a raw webhook request into a trusted [`InvoiceEvent`].
///
/// `body` must be the exact bytes received. If rate ceilings are configured, the payment
/// methods of the invoice are fetched from `store` and checked; on any failure the event
/// is withheld.
pub async fn process_webhook<S: Store + ?Sized>(
    store: &S,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<InvoiceEvent, BtcPayError> {
    let credentials = store.credentials();

    verify_signature(headers, body, &credentials.webhook_secret)
        .inspect_err(|err| warn!("rejecting webhook: {err}"))?;

    let event = decode_event(body, &credentials.store_id)
        .inspect_err(|err| warn!("rejecting webhook: {err}"))?;

    if !credentials.max_rates.is_empty() {
        let methods = store.get_invoice_payment_methods(&event.invoice_id).await?;
        check_rates(&methods, &credentials.max_rates).inspect_err(|err| {
            warn!("rejecting webhook for invoice {}: {err}", event.invoice_id)
        })?;
    }

    Ok(event)
}
