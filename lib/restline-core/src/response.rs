//! Typed responses.
//!
//! [`Response`] holds the status, headers and decoded entity of a
//! successful call. The entity sits behind an [`Arc`], so every clone of a
//! response, and every retrieval from the same [`crate::ResponseFuture`],
//! shares one entity instance.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::headers;

/// A successful, decoded response.
pub struct Response<T> {
    status: u16,
    headers: HashMap<String, String>,
    entity: Arc<T>,
}

impl<T> Response<T> {
    /// Creates a new response.
    #[must_use]
    pub fn new(status: u16, headers: HashMap<String, String>, entity: T) -> Self {
        Self::from_shared(status, headers, Arc::new(entity))
    }

    /// Creates a new response around an already shared entity.
    #[must_use]
    pub fn from_shared(status: u16, headers: HashMap<String, String>, entity: Arc<T>) -> Self {
        Self {
            status,
            headers,
            entity,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        headers::find(&self.headers, name)
    }

    /// Decoded entity.
    #[must_use]
    pub fn entity(&self) -> &T {
        &self.entity
    }

    /// Shared handle on the decoded entity.
    #[must_use]
    pub fn shared_entity(&self) -> Arc<T> {
        Arc::clone(&self.entity)
    }

    /// Consume into (status, headers, entity).
    #[must_use]
    pub fn into_parts(self) -> (u16, HashMap<String, String>, Arc<T>) {
        (self.status, self.headers, self.entity)
    }
}

impl<T> Clone for Response<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            headers: self.headers.clone(),
            entity: Arc::clone(&self.entity),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Response<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("entity", &self.entity)
            .finish()
    }
}

impl<T: PartialEq> PartialEq for Response<T> {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status && self.headers == other.headers && self.entity == other.entity
    }
}
