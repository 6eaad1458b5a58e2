use std::time::Duration;

use ::reqwest::header::HeaderValue;
use url::Url;

pub mod reqwest;

/// Versioned api path below the server's base url.
pub const API_PREFIX: &str = "api/v1/";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues authenticated json requests against the Greenfield api of one server.
#[derive(Debug, Clone)]
pub struct BtcPayHttpClient {
    client: ::reqwest::Client,
    api_url: Url,
    authorization: HeaderValue,
}
