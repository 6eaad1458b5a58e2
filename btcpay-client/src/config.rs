use std::{
    collections::HashMap,
    fmt,
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::Path,
};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::BtcPayError;

/// Everything needed to talk to one store on a BTCPay server.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Base url of the server, without "/api".
    pub uri: String,

    /// Optional onion mirror of `uri`. Empty if not configured.
    #[serde(default)]
    pub onion_uri: String,

    /// Created in the user settings of the server, not in the store settings.
    #[serde(rename = "userAPIKey")]
    pub user_api_key: String,

    pub store_id: String,

    pub webhook_secret: String,

    /// Maximum accepted exchange rate per asset code, checked before a webhook is trusted.
    #[serde(default)]
    pub max_rates: HashMap<String, Decimal>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("uri", &self.uri)
            .field("onion_uri", &self.onion_uri)
            .field("user_api_key", &"***")
            .field("store_id", &self.store_id)
            .field("webhook_secret", &"***")
            .field("max_rates", &self.max_rates)
            .finish()
    }
}

impl Credentials {
    /// Reads credentials from a json file.
    ///
    /// If the file doesn't exist, a template with empty values is written to `path` and
    /// [`BtcPayError::ConfigCreated`] is returned, so the first run always fails and leaves a
    /// file for the operator to fill in.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BtcPayError> {
        let path = path.as_ref();
        match fs::read(path) {
            Ok(data) => serde_json::from_slice(&data).map_err(BtcPayError::Decoding),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Self::write_template(path)?;
                info!("created empty config file: {}", path.display());
                Err(BtcPayError::ConfigCreated(path.to_path_buf()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write_template(path: &Path) -> Result<(), BtcPayError> {
        let data = serde_json::to_vec_pretty(&Self::default()).map_err(BtcPayError::Encoding)?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        file.write_all(&data)?;
        Ok(())
    }

    /// Base url for links shown to customers, the onion mirror if requested and configured.
    pub fn link_base(&self, prefer_onion: bool) -> &str {
        let base = if prefer_onion && !self.onion_uri.is_empty() {
            &self.onion_uri
        } else {
            &self.uri
        };
        base.trim_end_matches('/')
    }

    pub fn invoice_checkout_link(&self, id: &str, prefer_onion: bool) -> String {
        format!("{}/i/{}", self.link_base(prefer_onion), id)
    }

    pub fn payment_request_link(&self, id: &str, prefer_onion: bool) -> String {
        format!("{}/payment-requests/{}", self.link_base(prefer_onion), id)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::Credentials;
    use crate::error::BtcPayError;

    fn credentials() -> Credentials {
        Credentials {
            uri: "https://btcpay.example.com/".to_owned(),
            onion_uri: "http://btcpayxyz.onion".to_owned(),
            user_api_key: "api-key".to_owned(),
            store_id: "store-1".to_owned(),
            webhook_secret: "s3cr3t".to_owned(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_existing_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");
        std::fs::write(
            &path,
            r#"{"uri":"https://btcpay.example.com","userAPIKey":"key","storeId":"store-1",
                "webhookSecret":"s3cr3t","maxRates":{"BTC":"50000.5"}}"#,
        )?;

        let loaded = Credentials::load(&path)?;
        assert_eq!(loaded.uri, "https://btcpay.example.com");
        assert_eq!(loaded.user_api_key, "key");
        assert_eq!(loaded.store_id, "store-1");
        assert_eq!(loaded.webhook_secret, "s3cr3t");
        assert_eq!(loaded.onion_uri, "");
        assert_eq!(loaded.max_rates.get("BTC"), Some(&dec!(50000.5)));
        Ok(())
    }

    #[test]
    fn test_load_missing_file_creates_template() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");

        let result = Credentials::load(&path);
        assert!(matches!(result, Err(BtcPayError::ConfigCreated(ref p)) if p == &path));
        assert!(path.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path)?.permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        // the template is a valid, empty config
        let template = Credentials::load(&path)?;
        assert_eq!(template, Credentials::default());
        Ok(())
    }

    #[test]
    fn test_load_invalid_json() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json")?;

        let result = Credentials::load(&path);
        assert!(matches!(result, Err(BtcPayError::Decoding(_))));
        Ok(())
    }

    #[test]
    fn test_load_propagates_other_io_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        // reading a directory fails, but not with NotFound
        let result = Credentials::load(dir.path());
        assert!(matches!(result, Err(BtcPayError::Io(_))));
        Ok(())
    }

    #[test]
    fn test_links() {
        let credentials = credentials();
        assert_eq!(
            credentials.invoice_checkout_link("inv-1", false),
            "https://btcpay.example.com/i/inv-1"
        );
        assert_eq!(
            credentials.payment_request_link("pr-1", false),
            "https://btcpay.example.com/payment-requests/pr-1"
        );
        assert_eq!(
            credentials.invoice_checkout_link("inv-1", true),
            "http://btcpayxyz.onion/i/inv-1"
        );
    }

    #[test]
    fn test_onion_link_falls_back_to_uri() {
        let credentials = Credentials {
            onion_uri: String::new(),
            ..credentials()
        };
        assert_eq!(
            credentials.payment_request_link("pr-1", true),
            "https://btcpay.example.com/payment-requests/pr-1"
        );
    }

    #[test]
    fn test_debug_hides_secrets() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("s3cr3t"));
        assert!(!debug.contains("api-key"));
        assert!(debug.contains("store-1"));
    }
}
