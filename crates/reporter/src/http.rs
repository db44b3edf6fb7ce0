//! HttpTransport - registry protocol over reqwest

use std::time::Duration;

use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, instrument};

use contracts::{
    BusNumber, ContractError, ErrorResponse, PositionRecord, PositionResponse, PositionSample,
    PositionTransport, PositionUpdateRequest, ReporterConfig, StopSharingRequest, POSITION_PATH,
    STOP_SHARING_PATH,
};

/// HTTP client for the registry
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base: Url,
}

impl HttpTransport {
    /// Client for `endpoint` (e.g. `http://localhost:10000`).
    ///
    /// # Errors
    /// `Validation` for an unparseable endpoint, `Transport` when the
    /// client cannot be built.
    pub fn new(
        endpoint: &str,
        request_timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, ContractError> {
        let base = Url::parse(endpoint)
            .map_err(|e| ContractError::validation("endpoint", format!("{endpoint}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ContractError::validation(
                "endpoint",
                format!("{endpoint}: not a base URL"),
            ));
        }

        let client = Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .user_agent(concat!("bus-tracker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ContractError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, base })
    }

    pub fn from_config(config: &ReporterConfig) -> Result<Self, ContractError> {
        Self::new(
            &config.endpoint,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `base` + `path` segments, each percent-encoded
    fn url(&self, path: &str, extra: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(extra) = extra {
                segments.push(extra);
            }
        }
        url
    }
}

fn request_error(e: reqwest::Error) -> ContractError {
    if e.is_timeout() {
        ContractError::transport(format!("request timed out: {e}"))
    } else if e.is_connect() {
        ContractError::transport(format!("connection failed: {e}"))
    } else {
        ContractError::transport(e.to_string())
    }
}

/// Map a non-2xx response to an error; 404 becomes `NotFound`
async fn check_status(response: Response, bus_number: &BusNumber) -> Result<Response, ContractError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ContractError::not_found(bus_number.as_str()));
    }

    let detail = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown").to_string(),
    };
    Err(ContractError::transport(format!(
        "registry answered {status}: {detail}"
    )))
}

impl PositionTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(name = "http_send_position", skip(self, sample), fields(bus_number = %sample.bus_number()))]
    async fn send_position(&self, sample: &PositionSample) -> Result<(), ContractError> {
        let response = self
            .client
            .post(self.url(POSITION_PATH, None))
            .json(&PositionUpdateRequest::from(sample))
            .send()
            .await
            .map_err(request_error)?;
        check_status(response, sample.bus_number()).await?;
        debug!("Position uploaded");
        Ok(())
    }

    #[instrument(name = "http_stop_sharing", skip(self), fields(bus_number = %bus_number))]
    async fn stop_sharing(&self, bus_number: &BusNumber) -> Result<(), ContractError> {
        let response = self
            .client
            .post(self.url(STOP_SHARING_PATH, None))
            .json(&StopSharingRequest::new(bus_number.clone()))
            .send()
            .await
            .map_err(request_error)?;
        check_status(response, bus_number).await?;
        debug!("Sharing stopped");
        Ok(())
    }

    #[instrument(name = "http_fetch_position", skip(self), fields(bus_number = %bus_number))]
    async fn fetch_position(&self, bus_number: &BusNumber) -> Result<PositionRecord, ContractError> {
        let response = self
            .client
            .get(self.url(POSITION_PATH, Some(bus_number.as_str())))
            .send()
            .await
            .map_err(request_error)?;
        let body: PositionResponse = check_status(response, bus_number)
            .await?
            .json()
            .await
            .map_err(|e| ContractError::transport(format!("malformed position body: {e}")))?;
        PositionRecord::try_from(body)
    }
}
