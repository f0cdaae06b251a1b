//! Boundary to the recommendation service. The UI only ever talks to the
//! [`RecommendationApi`] trait so tests can swap the network out.

mod client;

pub use client::{
    classify_fetch, classify_recommend, encode_component, fetch_url, image_status, recommend_url,
    HttpApi, FALLBACK_IMAGE_PATH,
};

use crate::error::ApiResult;
use crate::models::{FetchResponse, RecommendOutcome, RecommendationQuery};

/// Blocking calls against the recommendation service. Implementations are
/// shared with worker threads, hence the `Send + Sync` bound.
#[cfg_attr(test, mockall::automock)]
pub trait RecommendationApi: Send + Sync {
    /// `GET /api/v1/recommend/?title=..&count=..`
    fn recommend(&self, query: &RecommendationQuery) -> ApiResult<RecommendOutcome>;

    /// `GET /api/v1/recommend/fetch?pages=..`
    fn refresh_data(&self, pages: u32) -> ApiResult<FetchResponse>;

    /// Check that an image URL answers with a success status.
    fn probe_image(&self, url: &str) -> ApiResult<()>;
}
