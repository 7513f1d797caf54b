//! Typed request building.
//!
//! A [`Request<T>`] describes one call on a resource and the entity type `T`
//! its response decodes into. Use [`Request::builder`] to assemble one, or
//! implement [`IntoRequest`] on your own builder type.
//!
//! # Example
//!
//! ```
//! use restline_core::{Request, ResourceMethod};
//!
//! #[derive(serde::Deserialize)]
//! struct Greeting { message: String }
//!
//! let request = Request::<Greeting>::builder(ResourceMethod::Get, "greetings")
//!     .key(42)
//!     .header("Accept-Language", "en")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.path(), "greetings/42");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{DataMap, Error, ResourceMethod, Result, headers, to_data_map};

/// Characters escaped when a key is placed in a path segment.
const PATH_KEY: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// An immutable description of a call whose response decodes into `T`.
pub struct Request<T> {
    method: ResourceMethod,
    path: String,
    query: Vec<(String, String)>,
    headers: HashMap<String, String>,
    input: Option<DataMap>,
    entity: PhantomData<fn() -> T>,
}

impl<T> Request<T> {
    /// Creates a new [`RequestBuilder`] for the resource at `path`.
    #[must_use]
    pub fn builder(method: ResourceMethod, path: impl Into<String>) -> RequestBuilder<T> {
        RequestBuilder::new(method, path)
    }

    /// Resource method.
    #[must_use]
    pub const fn method(&self) -> ResourceMethod {
        self.method
    }

    /// Resource path, relative to the client's URI prefix.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters, in insertion order.
    #[must_use]
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query
    }

    /// Request headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Single header value by name, ignoring case.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        headers::find(&self.headers, name)
    }

    /// Input record.
    #[must_use]
    pub const fn input(&self) -> Option<&DataMap> {
        self.input.as_ref()
    }
}

impl<T> Clone for Request<T> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            path: self.path.clone(),
            query: self.query.clone(),
            headers: self.headers.clone(),
            input: self.input.clone(),
            entity: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("headers", &self.headers)
            .field("input", &self.input)
            .field("entity", &std::any::type_name::<T>())
            .finish()
    }
}

/// Builder for constructing [`Request`] instances.
pub struct RequestBuilder<T> {
    method: ResourceMethod,
    path: String,
    query: Vec<(String, String)>,
    headers: HashMap<String, String>,
    input: Option<DataMap>,
    entity: PhantomData<fn() -> T>,
}

impl<T> RequestBuilder<T> {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: ResourceMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HashMap::new(),
            input: None,
            entity: PhantomData,
        }
    }

    /// Appends an entity key as a percent-encoded path segment.
    #[must_use]
    pub fn key(mut self, key: impl fmt::Display) -> Self {
        let key = key.to_string();
        let segment = utf8_percent_encode(&key, PATH_KEY);
        if !self.path.is_empty() && !self.path.ends_with('/') {
            self.path.push('/');
        }
        self.path.extend(segment);
        self
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Names the finder of a [`ResourceMethod::Finder`] request.
    #[must_use]
    pub fn finder(self, name: impl Into<String>) -> Self {
        self.query("q", name)
    }

    /// Names the action of a [`ResourceMethod::Action`] request.
    #[must_use]
    pub fn action(self, name: impl Into<String>) -> Self {
        self.query("action", name)
    }

    /// Sets the input record from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the value does not serialize to a record.
    pub fn input<S: serde::Serialize>(self, value: &S) -> Result<Self> {
        Ok(self.input_map(to_data_map(value)?))
    }

    /// Sets the input record.
    #[must_use]
    pub fn input_map(mut self, input: DataMap) -> Self {
        self.input = Some(input);
        self
    }

    /// Builds the [`Request`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if an input record is attached to a
    /// method that does not accept one.
    pub fn build(self) -> Result<Request<T>> {
        if self.input.is_some() && !self.method.accepts_input() {
            return Err(Error::invalid_request(format!(
                "resource method '{}' does not accept an input record",
                self.method
            )));
        }

        Ok(Request {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            input: self.input,
            entity: PhantomData,
        })
    }
}

impl<T> fmt::Debug for RequestBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Anything the dispatcher can turn into a [`Request<T>`] before sending.
///
/// Implemented for [`Request`] itself and for [`RequestBuilder`]; implement
/// it for custom builders to pass them straight to the client.
pub trait IntoRequest<T> {
    /// Run the build step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] if the request cannot be built.
    fn into_request(self) -> Result<Request<T>>;
}

impl<T> IntoRequest<T> for Request<T> {
    fn into_request(self) -> Result<Request<T>> {
        Ok(self)
    }
}

impl<T> IntoRequest<T> for RequestBuilder<T> {
    fn into_request(self) -> Result<Request<T>> {
        self.build()
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;
    use crate::EmptyRecord;

    #[test]
    fn request_builder_basic() {
        let request = Request::<EmptyRecord>::builder(ResourceMethod::Get, "greetings")
            .key(1)
            .header("Accept-Language", "en")
            .build()
            .expect("build");

        check!(request.method() == ResourceMethod::Get);
        check!(request.path() == "greetings/1");
        check!(request.header("accept-language") == Some("en"));
        check!(request.input().is_none());
    }

    #[test]
    fn key_is_percent_encoded() {
        let request = Request::<EmptyRecord>::builder(ResourceMethod::Get, "users/")
            .key("a b/c?d")
            .build()
            .expect("build");

        check!(request.path() == "users/a%20b%2Fc%3Fd");
    }

    #[test]
    fn finder_and_action_are_query_params() {
        let finder = Request::<EmptyRecord>::builder(ResourceMethod::Finder, "greetings")
            .finder("search")
            .query("tone", "FRIENDLY")
            .build()
            .expect("build");

        check!(
            finder.query_params()
                == [
                    ("q".to_string(), "search".to_string()),
                    ("tone".to_string(), "FRIENDLY".to_string())
                ]
        );

        let action = Request::<EmptyRecord>::builder(ResourceMethod::Action, "greetings")
            .action("purge")
            .build()
            .expect("build");
        check!(action.query_params() == [("action".to_string(), "purge".to_string())]);
    }

    #[test]
    fn input_record() {
        #[derive(serde::Serialize)]
        struct Greeting {
            message: String,
        }

        let request = Request::<EmptyRecord>::builder(ResourceMethod::Create, "greetings")
            .input(&Greeting {
                message: "hi".to_string(),
            })
            .expect("input")
            .build()
            .expect("build");

        let_assert!(Some(input) = request.input());
        check!(input["message"] == "hi");
    }

    #[test]
    fn input_on_get_is_rejected() {
        let result = Request::<EmptyRecord>::builder(ResourceMethod::Get, "greetings")
            .input_map(DataMap::new())
            .build();

        let_assert!(Err(Error::InvalidRequest(message)) = result);
        check!(message.contains("get"));
    }

    #[test]
    fn builder_and_request_both_convert() {
        let builder = Request::<EmptyRecord>::builder(ResourceMethod::Delete, "greetings").key(7);
        let request = builder.into_request().expect("builder");
        check!(request.path() == "greetings/7");

        let again = request.clone().into_request().expect("request");
        check!(again.path() == request.path());
    }
}
