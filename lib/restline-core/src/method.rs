//! Resource method types.

use std::str::FromStr;

use derive_more::Display;

/// The operation a request performs on a resource.
///
/// Each resource method maps onto an HTTP method; the resource method
/// itself travels in the `X-RestLi-Method` header so the server can tell
/// apart operations that share an HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ResourceMethod {
    /// Fetch a single entity by key.
    #[display("get")]
    Get,
    /// Fetch several entities by key.
    #[display("batch_get")]
    BatchGet,
    /// Fetch every entity of a collection.
    #[display("get_all")]
    GetAll,
    /// Search a collection with a named finder.
    #[display("finder")]
    Finder,
    /// Create an entity.
    #[display("create")]
    Create,
    /// Create several entities.
    #[display("batch_create")]
    BatchCreate,
    /// Replace an entity.
    #[display("update")]
    Update,
    /// Replace several entities.
    #[display("batch_update")]
    BatchUpdate,
    /// Patch an entity.
    #[display("partial_update")]
    PartialUpdate,
    /// Patch several entities.
    #[display("batch_partial_update")]
    BatchPartialUpdate,
    /// Remove an entity.
    #[display("delete")]
    Delete,
    /// Remove several entities.
    #[display("batch_delete")]
    BatchDelete,
    /// Invoke a named action.
    #[display("action")]
    Action,
}

impl ResourceMethod {
    const ALL: [Self; 13] = [
        Self::Get,
        Self::BatchGet,
        Self::GetAll,
        Self::Finder,
        Self::Create,
        Self::BatchCreate,
        Self::Update,
        Self::BatchUpdate,
        Self::PartialUpdate,
        Self::BatchPartialUpdate,
        Self::Delete,
        Self::BatchDelete,
        Self::Action,
    ];

    /// The HTTP method this resource method is sent with.
    #[must_use]
    pub fn http_method(&self) -> http::Method {
        match self {
            Self::Get | Self::BatchGet | Self::GetAll | Self::Finder => http::Method::GET,
            Self::Create
            | Self::BatchCreate
            | Self::PartialUpdate
            | Self::BatchPartialUpdate
            | Self::Action => http::Method::POST,
            Self::Update | Self::BatchUpdate => http::Method::PUT,
            Self::Delete | Self::BatchDelete => http::Method::DELETE,
        }
    }

    /// Returns `true` if the method only reads.
    #[must_use]
    pub const fn is_safe(&self) -> bool {
        matches!(
            self,
            Self::Get | Self::BatchGet | Self::GetAll | Self::Finder
        )
    }

    /// Returns `true` if the method carries an input record.
    #[must_use]
    pub const fn accepts_input(&self) -> bool {
        !self.is_safe() && !matches!(self, Self::Delete | Self::BatchDelete)
    }
}

impl FromStr for ResourceMethod {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::Error::invalid_request(format!("unknown resource method: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_display() {
        assert_eq!(ResourceMethod::Get.to_string(), "get");
        assert_eq!(ResourceMethod::BatchGet.to_string(), "batch_get");
        assert_eq!(
            ResourceMethod::BatchPartialUpdate.to_string(),
            "batch_partial_update"
        );
        assert_eq!(ResourceMethod::Action.to_string(), "action");
    }

    #[test]
    fn method_http_mapping() {
        assert_eq!(ResourceMethod::Get.http_method(), http::Method::GET);
        assert_eq!(ResourceMethod::Finder.http_method(), http::Method::GET);
        assert_eq!(ResourceMethod::Create.http_method(), http::Method::POST);
        assert_eq!(ResourceMethod::Action.http_method(), http::Method::POST);
        assert_eq!(ResourceMethod::Update.http_method(), http::Method::PUT);
        assert_eq!(ResourceMethod::BatchDelete.http_method(), http::Method::DELETE);
    }

    #[test]
    fn method_input() {
        assert!(ResourceMethod::Create.accepts_input());
        assert!(ResourceMethod::Action.accepts_input());
        assert!(!ResourceMethod::Get.accepts_input());
        assert!(!ResourceMethod::Delete.accepts_input());
    }

    #[test]
    fn method_round_trips_through_header_value() {
        for method in ResourceMethod::ALL {
            assert_eq!(
                method.to_string().parse::<ResourceMethod>().expect("parse"),
                method
            );
        }
        assert!("frobnicate".parse::<ResourceMethod>().is_err());
    }
}
