//! Per-call request context and its projection onto wire headers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::Value;

use crate::{Error, Result, headers};

/// Local, per-call attributes supplied by the caller.
///
/// Attributes are not transmitted as such; a [`ContextPropagator`] decides
/// which of them become outgoing headers. Build a fresh context for each
/// call (or share one deliberately); the dispatcher only reads it.
///
/// # Example
///
/// ```
/// use restline_core::RequestContext;
///
/// let context = RequestContext::new()
///     .with_local_attr("X-Tenant", "acme")
///     .with_local_attr("X-Attempt", 2);
///
/// assert_eq!(context.local_attr("X-Attempt"), Some(&2.into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContext {
    local_attrs: BTreeMap<String, Value>,
}

impl RequestContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an attribute, returning the previous value.
    pub fn put_local_attr(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.local_attrs.insert(key.into(), value.into())
    }

    /// Sets an attribute.
    #[must_use]
    pub fn with_local_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.put_local_attr(key, value);
        self
    }

    /// Removes an attribute.
    pub fn remove_local_attr(&mut self, key: &str) -> Option<Value> {
        self.local_attrs.remove(key)
    }

    /// Single attribute by key.
    #[must_use]
    pub fn local_attr(&self, key: &str) -> Option<&Value> {
        self.local_attrs.get(key)
    }

    /// All attributes, ordered by key.
    #[must_use]
    pub fn local_attrs(&self) -> &BTreeMap<String, Value> {
        &self.local_attrs
    }

    /// Returns `true` if no attribute is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local_attrs.is_empty()
    }
}

/// Computes the headers a [`RequestContext`] contributes to a request.
///
/// By default every attribute is propagated except the reserved
/// [`headers::OPERATION`] key. A header prefix narrows propagation to keys
/// starting with it.
#[derive(Debug, Clone)]
pub struct ContextPropagator {
    reserved: BTreeSet<String>,
    header_prefix: Option<String>,
}

impl Default for ContextPropagator {
    fn default() -> Self {
        Self {
            reserved: BTreeSet::from([headers::OPERATION.to_string()]),
            header_prefix: None,
        }
    }
}

impl ContextPropagator {
    /// Creates a propagator with the default reserved keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Never propagate `key`.
    #[must_use]
    pub fn reserve(mut self, key: impl Into<String>) -> Self {
        self.reserved.insert(key.into());
        self
    }

    /// Only propagate keys starting with `prefix`.
    #[must_use]
    pub fn with_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = Some(prefix.into());
        self
    }

    /// Returns `true` if an attribute named `key` becomes a header.
    #[must_use]
    pub fn propagates(&self, key: &str) -> bool {
        !self.reserved.contains(key)
            && self
                .header_prefix
                .as_deref()
                .is_none_or(|prefix| key.starts_with(prefix))
    }

    /// Headers derived from `context`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if a propagated attribute key is not a
    /// valid header name, or its text is not a valid header value.
    pub fn compute_headers(&self, context: &RequestContext) -> Result<HashMap<String, String>> {
        context
            .local_attrs()
            .iter()
            .filter(|(key, _)| self.propagates(key))
            .map(|(key, value)| {
                let text = header_value(value);
                http::HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    Error::invalid_request(format!(
                        "context attribute '{key}' is not a valid header name"
                    ))
                })?;
                http::HeaderValue::from_str(&text).map_err(|_| {
                    Error::invalid_request(format!(
                        "context attribute '{key}' is not a valid header value"
                    ))
                })?;
                Ok((key.clone(), text))
            })
            .collect()
    }
}

/// Text form of an attribute: strings verbatim, everything else as compact JSON.
fn header_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_context_yields_no_headers() {
        let headers = ContextPropagator::new()
            .compute_headers(&RequestContext::new())
            .expect("headers");
        check!(headers.is_empty());
    }

    #[test]
    fn propagates_every_non_reserved_attribute() {
        let context = RequestContext::new()
            .with_local_attr("__attr1", "1")
            .with_local_attr("X-Tenant", "acme")
            .with_local_attr(headers::OPERATION, "get");

        let headers = ContextPropagator::new()
            .compute_headers(&context)
            .expect("headers");

        check!(headers.len() == 2);
        check!(headers.get("__attr1").map(String::as_str) == Some("1"));
        check!(headers.get("X-Tenant").map(String::as_str) == Some("acme"));
        check!(!headers.contains_key(headers::OPERATION));
    }

    #[test]
    fn non_string_values_render_deterministically() {
        let context = RequestContext::new()
            .with_local_attr("X-Int", 42)
            .with_local_attr("X-Bool", true)
            .with_local_attr("X-Null", Value::Null)
            .with_local_attr("X-List", json!([1, "two"]))
            .with_local_attr("X-Map", json!({"b": 1, "a": 2}));

        let headers = ContextPropagator::new()
            .compute_headers(&context)
            .expect("headers");

        check!(headers["X-Int"] == "42");
        check!(headers["X-Bool"] == "true");
        check!(headers["X-Null"] == "null");
        check!(headers["X-List"] == r#"[1,"two"]"#);
        let map: Value = serde_json::from_str(&headers["X-Map"]).expect("json");
        check!(map == json!({"a": 2, "b": 1}));
    }

    #[test]
    fn prefix_narrows_propagation() {
        let context = RequestContext::new()
            .with_local_attr("X-App-Trace", "t1")
            .with_local_attr("internal", "secret");

        let headers = ContextPropagator::new()
            .with_header_prefix("X-App-")
            .compute_headers(&context)
            .expect("headers");

        check!(headers.len() == 1);
        check!(headers.contains_key("X-App-Trace"));
    }

    #[test]
    fn reserve_adds_keys() {
        let propagator = ContextPropagator::new().reserve("secret");

        check!(!propagator.propagates("secret"));
        check!(!propagator.propagates(headers::OPERATION));
        check!(propagator.propagates("X-Other"));
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let context = RequestContext::new().with_local_attr("bad key", "v");
        let result = ContextPropagator::new().compute_headers(&context);

        let_assert!(Err(Error::InvalidRequest(message)) = result);
        check!(message.contains("bad key"));
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let context = RequestContext::new().with_local_attr("X-Line", "a\nb");
        let result = ContextPropagator::new().compute_headers(&context);

        let_assert!(Err(Error::InvalidRequest(_)) = result);
    }

    #[test]
    fn context_attribute_accessors() {
        let mut context = RequestContext::new();
        check!(context.is_empty());

        check!(context.put_local_attr("k", "v1").is_none());
        check!(context.put_local_attr("k", "v2") == Some(json!("v1")));
        check!(context.local_attr("k") == Some(&json!("v2")));
        check!(context.remove_local_attr("k") == Some(json!("v2")));
        check!(context.is_empty());
    }
}
