//! Entity decoding.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{DataCodec, DataMap, JsonDataCodec, Response, RestResponse, Result, from_data_map};

/// Decodes successful raw responses into typed entities.
///
/// The body goes through the codec into a [`DataMap`], which is then bound
/// to the declared entity type. An empty body binds as an empty map, so
/// record types whose fields are all optional (and
/// [`crate::EmptyRecord`]) decode from it.
#[derive(Debug, Clone)]
pub struct EntityDecoder {
    codec: Arc<dyn DataCodec>,
}

impl Default for EntityDecoder {
    fn default() -> Self {
        Self::new(Arc::new(JsonDataCodec))
    }
}

impl EntityDecoder {
    /// Create a decoder reading bodies with `codec`.
    #[must_use]
    pub fn new(codec: Arc<dyn DataCodec>) -> Self {
        Self { codec }
    }

    /// Decode the body of `response` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Decoding`] if the body is not valid for the
    /// codec or does not fit the shape of `T`.
    pub fn decode<T: DeserializeOwned>(&self, response: &RestResponse) -> Result<T> {
        let map = if response.body().is_empty() {
            DataMap::new()
        } else {
            self.codec.bytes_to_map(response.body())?
        };
        from_data_map(map)
    }

    /// Decode `response` into a typed [`Response`], keeping status and headers.
    ///
    /// # Errors
    ///
    /// Same as [`EntityDecoder::decode`].
    pub fn decode_response<T: DeserializeOwned>(&self, response: RestResponse) -> Result<Response<T>> {
        let entity = self.decode(&response)?;
        let (status, headers, _) = response.into_parts();
        Ok(Response::new(status, headers, entity))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert2::{check, let_assert};
    use bytes::Bytes;
    use serde::Deserialize;

    use super::*;
    use crate::{EmptyRecord, Error, ErrorResponse};

    #[derive(Debug, PartialEq, Deserialize)]
    struct Greeting {
        id: u64,
        message: String,
    }

    fn ok(body: &'static str) -> RestResponse {
        RestResponse::new(200, HashMap::new(), Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn decodes_entity() {
        let greeting: Greeting = EntityDecoder::default()
            .decode(&ok(r#"{"id":1,"message":"hi"}"#))
            .expect("decode");

        check!(greeting == Greeting { id: 1, message: "hi".to_string() });
    }

    #[test]
    fn decode_response_keeps_status_and_headers() {
        let mut headers = HashMap::new();
        headers.insert("X-RestLi-Type".to_string(), "Greeting".to_string());
        let raw = RestResponse::new(201, headers, Bytes::from(r#"{"id":2,"message":"yo"}"#));

        let response: Response<Greeting> =
            EntityDecoder::default().decode_response(raw).expect("decode");

        check!(response.status() == 201);
        check!(response.header("x-restli-type") == Some("Greeting"));
        check!(response.entity().id == 2);
    }

    #[test]
    fn empty_body_decodes_empty_record() {
        let record: EmptyRecord = EntityDecoder::default().decode(&ok("")).expect("decode");
        check!(record == EmptyRecord {});

        let error: ErrorResponse = EntityDecoder::default().decode(&ok("")).expect("decode");
        check!(error == ErrorResponse::default());
    }

    #[test]
    fn malformed_bytes_fail() {
        let result = EntityDecoder::default().decode::<Greeting>(&ok("{not json"));
        let_assert!(Err(Error::Decoding { .. }) = result);
    }

    #[test]
    fn wrong_shape_fails_with_path() {
        let result = EntityDecoder::default().decode::<Greeting>(&ok(r#"{"id":"one","message":"hi"}"#));

        let_assert!(Err(Error::Decoding { path, .. }) = result);
        check!(path == "id");
    }

    #[test]
    fn missing_required_field_fails() {
        let result = EntityDecoder::default().decode::<Greeting>(&ok(r#"{"id":1}"#));
        let_assert!(Err(err) = result);
        check!(err.is_decoding());
        check!(err.to_string().contains("message"));
    }
}
