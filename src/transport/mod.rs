// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Sync client transport: the seam between the cache and the server.
//!
//! [`ProfileTransport`] abstracts the four server calls so the cache can be
//! driven against real HTTP ([`http::HttpTransport`]) or an in-process
//! double in tests. Every call accepts a cancellation token; a token that
//! fires before the response arrives resolves to [`TransportError::Cancelled`]
//! and the late response is never delivered.

pub mod http;
pub mod retry;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::profile::{Profile, ProfileSection, ProgressSummary, SectionId, SectionStatus};

/// Typed transport outcome taxonomy.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The operation's token fired before a response arrived. Not an error
    /// condition: silently dropped, never surfaced to the user.
    #[error("Request cancelled")]
    Cancelled,
    /// Any non-2xx response, carrying the server-supplied message.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Transport-level failure (no connectivity, timeout).
    #[error("Network error: {0}")]
    Network(String),
    /// Malformed success body.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the retry policy may re-issue the request. Conflicts (409)
    /// and not-found (404) are terminal for the request; cancellation must
    /// never be retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Cancelled => false,
            Self::Http { status, .. } => *status >= 500,
            Self::Network(_) | Self::Decode(_) => true,
        }
    }

    /// Whether this is a 409 conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Http { status: 409, .. })
    }
}

/// Photo upload response body.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoUpload {
    pub photo_uri: String,
}

/// The four server calls, each cancellable.
#[async_trait]
pub trait ProfileTransport: Send + Sync {
    async fn fetch_profile(&self, cancel: &CancellationToken) -> Result<Profile, TransportError>;

    async fn fetch_progress(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ProgressSummary, TransportError>;

    async fn update_section(
        &self,
        id: SectionId,
        status: SectionStatus,
        data: Option<Map<String, Value>>,
        cancel: &CancellationToken,
    ) -> Result<ProfileSection, TransportError>;

    async fn upload_photo(
        &self,
        photo_uri: &str,
        cancel: &CancellationToken,
    ) -> Result<PhotoUpload, TransportError>;
}
