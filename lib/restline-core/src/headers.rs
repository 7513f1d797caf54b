//! Wire-level header names and values shared by the client and its transports.

/// Marks a non-2xx response body as a structured error payload.
pub const HEADER_ERROR_RESPONSE: &str = "X-RestLi-Error-Response";

/// Value of [`HEADER_ERROR_RESPONSE`] for application errors.
pub const HEADER_VALUE_ERROR_APPLICATION: &str = "Application";

/// Names the record type carried in the body.
pub const HEADER_ENTITY_TYPE: &str = "X-RestLi-Type";

/// Carries the resource method of the request.
pub const HEADER_RESOURCE_METHOD: &str = "X-RestLi-Method";

/// Request context key used for internal operation bookkeeping; never sent.
pub const OPERATION: &str = "OPERATION";

/// Case-insensitive lookup in a plain header map.
///
/// ```
/// use std::collections::HashMap;
///
/// let headers = HashMap::from([("Content-Type".to_string(), "application/json".to_string())]);
/// assert_eq!(restline_core::headers::find(&headers, "content-type"), Some("application/json"));
/// ```
pub fn find<'a, I>(headers: I, name: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    headers
        .into_iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn find_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert(
            "x-restli-error-response".to_string(),
            "Application".to_string(),
        );

        assert_eq!(find(&headers, HEADER_ERROR_RESPONSE), Some("Application"));
        assert_eq!(find(&headers, HEADER_ENTITY_TYPE), None);
    }
}
