//! Domain DTOs for the user and gif APIs.
//!
//! # Design
//! These types mirror the subset of each remote schema the clients actually
//! read. serde ignores unknown fields by default, so a jsonplaceholder or
//! dummyjson user record (dozens of fields) decodes into `User` or `Profile`
//! without extra attributes. The mock-server defines its own schema
//! independently; integration tests catch drift between the two.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one remote resource, used verbatim as a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A user as returned by `GET /users/{id}` on jsonplaceholder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub name: String,
}

/// Request payload for `POST /users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
}

/// The server's echo of a created user, including the id it assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedUser {
    pub id: u64,
    pub name: String,
    pub username: String,
    pub email: String,
}

/// A user as returned by `GET /users/{id}` on dummyjson.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub image: String,
}

impl Profile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// One page of giphy search or trending results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GifPage {
    pub data: Vec<Gif>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Gif {
    pub id: String,
    pub url: String,
    pub images: GifImages,
}

impl Gif {
    /// URL of the full-size animated rendition.
    pub fn original_url(&self) -> &str {
        &self.images.original.url
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GifImages {
    pub original: GifImage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GifImage {
    pub url: String,
}
