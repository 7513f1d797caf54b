//! Classification of raw responses into successes and failures.

use std::sync::Arc;

use tracing::debug;

use crate::{
    DataCodec, ErrorResponse, JsonDataCodec, ResponseException, RestResponse, from_data_map,
    headers,
};

/// How a raw response should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// 2xx: decode the entity.
    Success,
    /// Non-2xx with the application error marker: decode the error payload.
    ApplicationError,
    /// Non-2xx without the marker: the body is opaque.
    Failure,
}

/// Turns non-2xx raw responses into [`ResponseException`]s.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    codec: Arc<dyn DataCodec>,
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(Arc::new(JsonDataCodec))
    }
}

impl ErrorTranslator {
    /// Create a translator decoding error payloads with `codec`.
    #[must_use]
    pub fn new(codec: Arc<dyn DataCodec>) -> Self {
        Self { codec }
    }

    /// Classify a raw response.
    #[must_use]
    pub fn classify(response: &RestResponse) -> ResponseKind {
        if response.is_success() {
            ResponseKind::Success
        } else if has_error_marker(response) {
            ResponseKind::ApplicationError
        } else {
            ResponseKind::Failure
        }
    }

    /// Pass successes through and turn every other response into an exception.
    ///
    /// # Errors
    ///
    /// Returns the [`ResponseException`] for any non-2xx response. Building
    /// it never fails: payloads that cannot be decoded leave the structured
    /// fields unset.
    pub fn translate(&self, response: RestResponse) -> Result<RestResponse, ResponseException> {
        match Self::classify(&response) {
            ResponseKind::Success => Ok(response),
            ResponseKind::ApplicationError => {
                let error = self.decode_error(&response);
                Err(ResponseException::new(response, error))
            }
            ResponseKind::Failure => Err(ResponseException::opaque(response)),
        }
    }

    fn decode_error(&self, response: &RestResponse) -> ErrorResponse {
        if response.body().is_empty() {
            return ErrorResponse::default();
        }

        self.codec
            .bytes_to_map(response.body())
            .and_then(from_data_map)
            .unwrap_or_else(|err| {
                debug!(status = response.status(), error = %err, "undecodable error payload");
                ErrorResponse::default()
            })
    }
}

pub(crate) fn has_error_marker(response: &RestResponse) -> bool {
    response
        .header(headers::HEADER_ERROR_RESPONSE)
        .is_some_and(|value| value.eq_ignore_ascii_case(headers::HEADER_VALUE_ERROR_APPLICATION))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert2::{check, let_assert};
    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::{ServiceError, to_data_map};

    fn marked_headers() -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            headers::HEADER_ERROR_RESPONSE.to_string(),
            headers::HEADER_VALUE_ERROR_APPLICATION.to_string(),
        );
        headers.insert(
            headers::HEADER_ENTITY_TYPE.to_string(),
            "ErrorResponse".to_string(),
        );
        headers
    }

    fn error_body() -> Bytes {
        let mut details = crate::DataMap::new();
        details.insert("someErr".to_string(), json!("WHOOPS!"));
        let error = ErrorResponse {
            status: Some(400),
            message: Some("whoops2".to_string()),
            service_error_code: Some(666),
            error_details: Some(details),
            ..ErrorResponse::default()
        };
        JsonDataCodec
            .map_to_bytes(&to_data_map(&error).expect("encode"))
            .expect("bytes")
    }

    #[test]
    fn classify() {
        let ok = RestResponse::new(200, marked_headers(), Bytes::new());
        check!(ErrorTranslator::classify(&ok) == ResponseKind::Success);

        let app = RestResponse::new(400, marked_headers(), Bytes::new());
        check!(ErrorTranslator::classify(&app) == ResponseKind::ApplicationError);

        let opaque = RestResponse::new(500, HashMap::new(), Bytes::from("oops"));
        check!(ErrorTranslator::classify(&opaque) == ResponseKind::Failure);
    }

    #[test]
    fn marker_value_ignores_case() {
        let mut headers = HashMap::new();
        headers.insert("x-restli-error-response".to_string(), "application".to_string());
        let response = RestResponse::new(400, headers, Bytes::new());

        check!(ErrorTranslator::classify(&response) == ResponseKind::ApplicationError);
    }

    #[test]
    fn success_passes_through() {
        let response = RestResponse::new(200, marked_headers(), error_body());
        let translated = ErrorTranslator::default().translate(response.clone());

        check!(translated == Ok(response));
    }

    #[test]
    fn application_error_decodes_payload() {
        let response = RestResponse::new(400, marked_headers(), error_body());
        let translated = ErrorTranslator::default().translate(response.clone());

        let_assert!(Err(e) = translated);
        check!(e.status() == 400);
        check!(e.service_error_code() == Some(666));
        check!(e.service_error_message() == Some("whoops2"));
        check!(e.error_details().and_then(|d| d.get("someErr")) == Some(&json!("WHOOPS!")));
        check!(e.error_source() == Some("Application"));
        check!(crate::RestException::response(&e) == &response);
    }

    #[test]
    fn error_details_round_trip() {
        let response = RestResponse::new(400, marked_headers(), error_body());
        let_assert!(Err(e) = ErrorTranslator::default().translate(response));

        let mut expected = crate::DataMap::new();
        expected.insert("someErr".to_string(), json!("WHOOPS!"));
        check!(e.error_details() == Some(&expected));
    }

    #[test]
    fn unmarked_failure_leaves_fields_unset() {
        let response = RestResponse::new(400, HashMap::new(), error_body());
        let_assert!(Err(e) = ErrorTranslator::default().translate(response));

        check!(e.status() == 400);
        check!(!e.has_service_error_code());
        check!(e.service_error_message().is_none());
        check!(e.error_details().is_none());
        check!(!e.is_application_error());
    }

    #[test]
    fn empty_or_garbage_payload_leaves_fields_unset() {
        for body in [Bytes::new(), Bytes::from("<html>oops</html>"), Bytes::from("[1]")] {
            let response = RestResponse::new(500, marked_headers(), body);
            let_assert!(Err(e) = ErrorTranslator::default().translate(response));

            check!(e.status() == 500);
            check!(e.error_response() == &ErrorResponse::default());
            check!(e.is_application_error());
        }
    }

    #[test]
    fn mistyped_payload_field_leaves_fields_unset() {
        let body = Bytes::from(r#"{"serviceErrorCode":"not a number","message":"m"}"#);
        let response = RestResponse::new(400, marked_headers(), body);
        let_assert!(Err(e) = ErrorTranslator::default().translate(response));

        check!(!e.has_service_error_code());
        check!(e.service_error_message().is_none());
    }
}
