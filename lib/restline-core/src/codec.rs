//! Wire codec: structured maps to and from bytes.
//!
//! Records travel as a [`DataMap`]. A [`DataCodec`] turns that map into
//! body bytes and back; [`to_data_map`] and [`from_data_map`] bind maps to
//! typed records through serde.

use bytes::Bytes;
use serde_json::Value;

use crate::{Error, Result};

/// Structured map representation of a record.
pub type DataMap = serde_json::Map<String, Value>;

/// Serializes [`DataMap`]s to and from body bytes.
pub trait DataCodec: std::fmt::Debug + Send + Sync + 'static {
    /// MIME type of the encoded bytes.
    fn content_type(&self) -> &'static str;

    /// Decode body bytes into a map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`] if the bytes are not a valid encoded map.
    fn bytes_to_map(&self, bytes: &[u8]) -> Result<DataMap>;

    /// Encode a map into body bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the map cannot be encoded.
    fn map_to_bytes(&self, map: &DataMap) -> Result<Bytes>;
}

/// JSON codec (`application/json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDataCodec;

impl DataCodec for JsonDataCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn bytes_to_map(&self, bytes: &[u8]) -> Result<DataMap> {
        serde_json::from_slice(bytes).map_err(|e| Error::decoding("", e.to_string()))
    }

    fn map_to_bytes(&self, map: &DataMap) -> Result<Bytes> {
        serde_json::to_vec(map)
            .map(Bytes::from)
            .map_err(|e| Error::encoding(e.to_string()))
    }
}

/// Serialize a record into a [`DataMap`].
///
/// # Errors
///
/// Returns [`Error::Encoding`] if serialization fails or the value is not a
/// record (a JSON object).
///
/// # Example
///
/// ```
/// use restline_core::to_data_map;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Greeting { message: String }
///
/// let map = to_data_map(&Greeting { message: "hi".to_string() }).expect("serialize");
/// assert_eq!(map["message"], "hi");
/// ```
pub fn to_data_map<T: serde::Serialize>(value: &T) -> Result<DataMap> {
    match serde_json::to_value(value).map_err(|e| Error::encoding(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(Error::encoding(format!(
            "expected a record, found {}",
            kind_of(&other)
        ))),
    }
}

/// Bind a [`DataMap`] into a typed record with path-aware error messages.
///
/// # Errors
///
/// Returns [`Error::Decoding`] naming the path of the field that failed
/// (e.g. `errorDetails.city`).
///
/// # Example
///
/// ```
/// use restline_core::{DataMap, from_data_map};
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Greeting { message: String }
///
/// let mut map = DataMap::new();
/// map.insert("message".to_string(), "hi".into());
/// let greeting: Greeting = from_data_map(map).expect("deserialize");
/// assert_eq!(greeting.message, "hi");
/// ```
pub fn from_data_map<T: serde::de::DeserializeOwned>(map: DataMap) -> Result<T> {
    serde_path_to_error::deserialize(Value::Object(map))
        .map_err(|e| Error::decoding(e.path().to_string(), e.inner().to_string()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_codec_content_type() {
        assert_eq!(JsonDataCodec.content_type(), "application/json");
    }

    #[test]
    fn json_codec_bytes_to_map() {
        let map = JsonDataCodec
            .bytes_to_map(br#"{"id":1,"tags":["a"]}"#)
            .expect("decode");

        assert_eq!(map["id"], 1);
        assert_eq!(map["tags"], serde_json::json!(["a"]));
    }

    #[test]
    fn json_codec_rejects_non_map() {
        let err = JsonDataCodec.bytes_to_map(b"[1,2]").expect_err("array");
        assert!(err.is_decoding());

        let err = JsonDataCodec.bytes_to_map(b"not json").expect_err("garbage");
        assert!(err.is_decoding());
    }

    #[test]
    fn json_codec_map_to_bytes() {
        let mut map = DataMap::new();
        map.insert("name".to_string(), "Alice".into());

        let bytes = JsonDataCodec.map_to_bytes(&map).expect("encode");
        assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
    }

    #[test]
    fn to_data_map_rejects_scalars() {
        let err = to_data_map(&42).expect_err("scalar");
        assert_eq!(err.to_string(), "encoding error: expected a record, found a number");
    }

    #[test]
    fn from_data_map_missing_field_reports_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let map = JsonDataCodec
            .bytes_to_map(br#"{"address":{}}"#)
            .expect("decode");
        let err = from_data_map::<User>(map).expect_err("should fail");
        let msg = err.to_string();

        assert!(msg.contains("address"), "Expected path 'address' in error: {msg}");
        assert!(msg.contains("city"), "Expected field 'city' in error: {msg}");
    }
}
