use dirs::home_dir;
use std::{fs::create_dir_all, path::PathBuf};

use crate::error::BtcPayError;

pub const ENV_CONFIG_PATH: &str = "BTCPAY_CONFIG_PATH";

/// Returns the path to the credentials file.
///
/// The path is taken from the `BTCPAY_CONFIG_PATH` environment variable. If the variable is
/// not set, a `.btcpay` directory is created in the user's home directory and the path to a
/// `credentials.json` file in that directory is returned.
///
/// # Examples
///
/// ```no_run
/// let path = btcpay_client::config_path::credentials_path().unwrap();
/// println!("credentials: {}", path.display());
/// ```
pub fn credentials_path() -> Result<PathBuf, BtcPayError> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join("credentials.json"))
}

pub fn config_dir() -> Result<PathBuf, BtcPayError> {
    let btcpay_dir = home_dir().ok_or(BtcPayError::HomeDirNotFound)?.join(".btcpay");
    if !btcpay_dir.exists() {
        create_dir_all(&btcpay_dir)?;
    }
    Ok(btcpay_dir)
}
