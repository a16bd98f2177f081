//! Request builder and response parser for the giphy search API.

use url::Url;

use crate::client::decode;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::GifPage;

pub const GIPHY_URL: &str = "https://api.giphy.com";

/// Number of gifs requested per page unless overridden.
pub const DEFAULT_LIMIT: u32 = 10;

/// Client for `v1/gifs/search` and `v1/gifs/trending`.
///
/// The api key and page limit travel as query parameters on every request.
#[derive(Debug, Clone)]
pub struct GiphyClient {
    base_url: String,
    api_key: String,
    limit: u32,
}

impl GiphyClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn build_search(&self, query: &str) -> Result<HttpRequest, ApiError> {
        let limit = self.limit.to_string();
        let url = self.url(
            "v1/gifs/search",
            &[("api_key", self.api_key.as_str()), ("q", query), ("limit", limit.as_str())],
        )?;
        Ok(HttpRequest::get(url))
    }

    pub fn build_trending(&self) -> Result<HttpRequest, ApiError> {
        let limit = self.limit.to_string();
        let url = self.url(
            "v1/gifs/trending",
            &[("api_key", self.api_key.as_str()), ("limit", limit.as_str())],
        )?;
        Ok(HttpRequest::get(url))
    }

    pub fn parse_gif_page(&self, response: HttpResponse) -> Result<GifPage, ApiError> {
        decode(&response)
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<String, ApiError> {
        Url::parse_with_params(&format!("{}/{path}", self.base_url), params)
            .map(String::from)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn client() -> GiphyClient {
        GiphyClient::new("https://api.giphy.com/", "KEY")
    }

    #[test]
    fn build_search_encodes_query() {
        let req = client().build_search("cat typing & more").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.url,
            "https://api.giphy.com/v1/gifs/search?api_key=KEY&q=cat+typing+%26+more&limit=10"
        );
    }

    #[test]
    fn build_trending_uses_limit() {
        let req = client().with_limit(3).build_trending().unwrap();
        assert_eq!(req.url, "https://api.giphy.com/v1/gifs/trending?api_key=KEY&limit=3");
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let err = GiphyClient::new("not a url", "KEY").build_trending().unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn parse_gif_page_success() {
        let body = r#"{"data":[{"id":"a1","url":"https://giphy.com/gifs/a1","images":{"original":{"url":"https://media.giphy.com/media/a1/giphy.gif"}}}],"pagination":{"count":1}}"#;
        let page = client().parse_gif_page(HttpResponse::new(200, body)).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].original_url(), "https://media.giphy.com/media/a1/giphy.gif");
    }

    #[test]
    fn parse_gif_page_unauthorized() {
        let err = client()
            .parse_gif_page(HttpResponse::new(401, r#"{"message":"No API key found in request."}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 401, .. }));
    }
}
