//! Stateless request builders and response parsers for the user APIs.
//!
//! # Design
//! `UserClient` (jsonplaceholder) and `ProfileClient` (dummyjson) hold only a
//! `base_url` and carry no mutable state between calls. Each operation is
//! split into a `build_*` method that produces an `HttpRequest` and a
//! `parse_*` method that consumes an `HttpResponse`. A `Transport` executes
//! the round trip in between, keeping these types deterministic and free of
//! I/O. Both clients implement `Endpoint` for their `GET /users/{id}` call so
//! the fan-out fetcher can drive them.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::fetch::Endpoint;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{CreatedUser, NewUser, Profile, RequestId, User};

pub const JSONPLACEHOLDER_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DUMMYJSON_URL: &str = "https://dummyjson.com";

/// Client for the jsonplaceholder `/users` resource.
#[derive(Debug, Clone)]
pub struct UserClient {
    base_url: String,
}

impl UserClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_get_user(&self, id: &RequestId) -> HttpRequest {
        HttpRequest::get(format!("{}/users/{id}", self.base_url))
    }

    pub fn build_create_user(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest::post_json(format!("{}/users", self.base_url), body))
    }

    pub fn build_delete_user(&self, id: &RequestId) -> HttpRequest {
        HttpRequest::delete(format!("{}/users/{id}", self.base_url))
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        decode(&response)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<CreatedUser, ApiError> {
        decode(&response)
    }

    /// Any 2xx counts as a successful delete; jsonplaceholder answers `200 {}`.
    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

impl Default for UserClient {
    fn default() -> Self {
        Self::new(JSONPLACEHOLDER_URL)
    }
}

impl Endpoint for UserClient {
    type Output = User;

    fn request(&self, id: &RequestId) -> Result<HttpRequest, ApiError> {
        Ok(self.build_get_user(id))
    }

    fn decode(&self, response: HttpResponse) -> Result<User, ApiError> {
        self.parse_get_user(response)
    }
}

/// Client for the dummyjson `/users` resource.
#[derive(Debug, Clone)]
pub struct ProfileClient {
    base_url: String,
}

impl ProfileClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_get_profile(&self, id: &RequestId) -> HttpRequest {
        HttpRequest::get(format!("{}/users/{id}", self.base_url))
    }

    pub fn build_delete_profile(&self, id: &RequestId) -> HttpRequest {
        HttpRequest::delete(format!("{}/users/{id}", self.base_url))
    }

    pub fn parse_get_profile(&self, response: HttpResponse) -> Result<Profile, ApiError> {
        decode(&response)
    }

    pub fn parse_delete_profile(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

impl Default for ProfileClient {
    fn default() -> Self {
        Self::new(DUMMYJSON_URL)
    }
}

impl Endpoint for ProfileClient {
    type Output = Profile;

    fn request(&self, id: &RequestId) -> Result<HttpRequest, ApiError> {
        Ok(self.build_get_profile(id))
    }

    fn decode(&self, response: HttpResponse) -> Result<Profile, ApiError> {
        self.parse_get_profile(response)
    }
}

/// Map non-success status codes to the appropriate `ApiError` variant.
pub(crate) fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

pub(crate) fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    check_status(response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}
