use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::{StatusCode, Url};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    FetchResponse, RecommendOutcome, RecommendationQuery, RecommendationResponse,
};

use super::RecommendationApi;

/// Image shown when a record has no image or its image fails to load.
pub const FALLBACK_IMAGE_PATH: &str = "/static/images/no-image.jpg";

const RECOMMEND_PATH: &str = "/api/v1/recommend/";
const FETCH_PATH: &str = "/api/v1/recommend/fetch";

/// Characters left alone by `encodeURIComponent`: alphanumerics plus
/// `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a query component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Recommendation endpoint for `query`, relative to the service base URL.
pub fn recommend_url(base: &str, query: &RecommendationQuery) -> String {
    format!(
        "{}{RECOMMEND_PATH}?title={}&count={}",
        base.trim_end_matches('/'),
        encode_component(&query.title),
        query.count
    )
}

/// Data-refresh endpoint asking the service to pull `pages` pages of new data.
pub fn fetch_url(base: &str, pages: u32) -> String {
    format!("{}{FETCH_PATH}?pages={pages}", base.trim_end_matches('/'))
}

/// Map a recommendation response onto its outcome. 404 is "nothing matched";
/// any other non-2xx is a failure carrying the status code.
pub fn classify_recommend(status: StatusCode, body: &str) -> ApiResult<RecommendOutcome> {
    if status == StatusCode::NOT_FOUND {
        return Ok(RecommendOutcome::NotFound);
    }
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }
    let parsed: RecommendationResponse = serde_json::from_str(body)?;
    Ok(RecommendOutcome::Found(parsed.recommendations))
}

/// Map a data-refresh response. Every non-2xx status is a failure here.
pub fn classify_fetch(status: StatusCode, body: &str) -> ApiResult<FetchResponse> {
    if !status.is_success() {
        return Err(ApiError::Status(status.as_u16()));
    }
    Ok(serde_json::from_str(body)?)
}

/// Whether an image request answered in a way a browser would render.
pub fn image_status(status: StatusCode) -> ApiResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status(status.as_u16()))
    }
}

/// [`RecommendationApi`] backed by a blocking `reqwest` client.
#[derive(Clone)]
pub struct HttpApi {
    http_client: HttpClient,
    api_url: String,
}

impl HttpApi {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            http_client,
            api_url: config.api_url.clone(),
        })
    }

    fn get(&self, url: &str) -> ApiResult<(StatusCode, String)> {
        debug!(%url, "sending request");
        let response = self.http_client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;
        Ok((status, body))
    }
}

impl RecommendationApi for HttpApi {
    fn recommend(&self, query: &RecommendationQuery) -> ApiResult<RecommendOutcome> {
        let (status, body) = self.get(&recommend_url(&self.api_url, query))?;
        let outcome = classify_recommend(status, &body)?;
        if let RecommendOutcome::Found(records) = &outcome {
            info!(title = %query.title, results = records.len(), "recommendations received");
        }
        Ok(outcome)
    }

    fn refresh_data(&self, pages: u32) -> ApiResult<FetchResponse> {
        let (status, body) = self.get(&fetch_url(&self.api_url, pages))?;
        let fetched = classify_fetch(status, &body)?;
        info!(pages, "data refresh completed");
        Ok(fetched)
    }

    fn probe_image(&self, url: &str) -> ApiResult<()> {
        let parsed = Url::parse(url).map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        let mut status = self.http_client.head(parsed.clone()).send()?.status();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            debug!(%url, "HEAD refused, retrying image check with GET");
            status = self.http_client.get(parsed).send()?.status();
        }
        image_status(status)
    }
}
