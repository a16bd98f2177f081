//! Concurrent REST client core for the user and gif APIs.
//!
//! # Overview
//! Clients build `HttpRequest` values and parse `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Transport` performs the
//! round trip, and `Fetcher` fans a list of ids out into one task per id,
//! collecting the outcomes in input order.
//!
//! # Design
//! - `UserClient`, `ProfileClient` and `GiphyClient` are stateless; they hold
//!   only base URLs (and, for giphy, the api key and page size).
//! - `Transport` is the one I/O seam. `ReqwestTransport` and `UreqTransport`
//!   are constructed once and shared by reference across every unit of work.
//! - A failure in one unit of work is recorded in that unit's slot of the
//!   `ResultSet`; it never aborts siblings or the join.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod error;
pub mod fetch;
pub mod giphy;
pub mod http;
pub mod scan;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ProfileClient, UserClient};
pub use error::{ApiError, FetchError};
pub use fetch::{execute, Endpoint, FetchResult, Fetcher, ResultSet};
pub use giphy::GiphyClient;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use scan::{Scan, ScanStop};
pub use transport::{ReqwestTransport, Transport, UreqTransport};
pub use types::{CreatedUser, Gif, GifPage, NewUser, Profile, RequestId, User};
