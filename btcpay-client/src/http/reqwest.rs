use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Method, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use url::Url;

use super::{BtcPayHttpClient, API_PREFIX, REQUEST_TIMEOUT};
use crate::error::BtcPayError;

impl BtcPayHttpClient {
    /// `uri` is the base url of the server without "/api", `api_key` a user api key.
    pub fn new(uri: &str, api_key: &str) -> Result<Self, BtcPayError> {
        let api_url = Url::parse(&format!("{}/{}", uri.trim_end_matches('/'), API_PREFIX))?;

        let mut authorization = HeaderValue::from_str(&format!("token {api_key}"))?;
        authorization.set_sensitive(true);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_url,
            authorization,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Sends a single request to `path` below the api prefix. The body is encoded before
    /// anything goes over the wire. Errors are never retried.
    pub async fn do_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, BtcPayError> {
        let url = self.api_url.join(path)?;

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(AUTHORIZATION, self.authorization.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(body) = body {
            request = request.body(serde_json::to_vec(body).map_err(BtcPayError::Encoding)?);
        }

        debug!("{} {}", method, url);
        Ok(request.send().await?)
    }

    /// Maps the response status to a result and decodes the body of successful responses.
    pub async fn extract_response_data<T: DeserializeOwned>(
        response: Response,
    ) -> Result<T, BtcPayError> {
        let status = response.status();
        let body = response.bytes().await?;
        debug!("response status: {}", status);

        match status {
            StatusCode::OK => serde_json::from_slice(&body).map_err(BtcPayError::Decoding),
            StatusCode::UNAUTHORIZED => Err(BtcPayError::Unauthenticated),
            StatusCode::FORBIDDEN => Err(BtcPayError::Unauthorized),
            StatusCode::BAD_REQUEST => Err(BtcPayError::BadRequest),
            StatusCode::NOT_FOUND => Err(BtcPayError::NotFound),
            other => Err(BtcPayError::UnexpectedStatus {
                status: other.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }

    pub async fn do_get<T: DeserializeOwned>(&self, path: &str) -> Result<T, BtcPayError> {
        let response = self.do_request::<()>(Method::GET, path, None).await?;
        Self::extract_response_data(response).await
    }

    pub async fn do_post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, BtcPayError> {
        let response = self.do_request(Method::POST, path, Some(body)).await?;
        Self::extract_response_data(response).await
    }
}
