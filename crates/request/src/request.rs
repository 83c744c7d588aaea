//! The request object every stage of the pipeline works on.
//!
//! [`Request`] couples the immutable [`RequestHeader`] with the state the stages build up
//! while the request travels through the pipeline:
//! - the merged request [`Params`]
//! - the parsed [`Query`], absent until the query stage has run
//! - the raw body bytes, the decoded body and any uploaded files

use crate::{Params, Query, ReqBody, RequestError, RequestHeader, UploadedFile};
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// An incoming request and the state accumulated by the stages that handled it.
///
/// A `Request` is owned by exactly one pipeline run; stages receive it as `&mut`.
#[derive(Debug)]
pub struct Request {
    header: RequestHeader,
    body: Option<ReqBody>,
    raw_body: Option<Bytes>,
    parsed_body: Option<Value>,
    files: Vec<UploadedFile>,
    params: Params,
    query: Option<Query>,
}

impl Request {
    /// Creates a new Request with the given header and the still unread body
    pub fn new(header: RequestHeader, body: ReqBody) -> Self {
        Self {
            header,
            body: Some(body),
            raw_body: None,
            parsed_body: None,
            files: Vec::new(),
            params: Params::new(),
            query: None,
        }
    }

    /// Seeds the request parameters, typically with the matched route parameters
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Returns a reference to the underlying RequestHeader
    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    /// Returns the HTTP method of the request
    pub fn method(&self) -> &Method {
        self.header.method()
    }

    /// Returns the URI of the request
    pub fn uri(&self) -> &Uri {
        self.header.uri()
    }

    /// Returns the HTTP headers of the request
    pub fn headers(&self) -> &HeaderMap {
        self.header.headers()
    }

    /// See [`RequestHeader::content_length`]
    pub fn content_length(&self) -> Option<u64> {
        self.header.content_length()
    }

    /// See [`RequestHeader::is_chunked`]
    pub fn is_chunked(&self) -> bool {
        self.header.is_chunked()
    }

    /// See [`RequestHeader::content_type`]
    pub fn content_type(&self) -> &str {
        self.header.content_type()
    }

    /// See [`RequestHeader::query_string`]
    pub fn query_string(&self) -> Option<&str> {
        self.header.query_string()
    }

    /// Whether the body stream has not been taken yet.
    pub fn has_unread_body(&self) -> bool {
        self.body.is_some()
    }

    /// Takes the body stream out of the request; the body can be taken only once.
    pub fn take_body(&mut self) -> Result<ReqBody, RequestError> {
        self.body.take().ok_or(RequestError::BodyConsumed)
    }

    /// The body bytes, once a body reader has consumed the stream.
    pub fn raw_body(&self) -> Option<&Bytes> {
        self.raw_body.as_ref()
    }

    pub fn set_raw_body(&mut self, bytes: Bytes) {
        self.raw_body = Some(bytes);
    }

    /// The body as decoded by a body decoder.
    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }

    pub fn set_parsed_body(&mut self, value: Value) {
        self.parsed_body = Some(value);
    }

    /// Deserializes the decoded body into `T`.
    ///
    /// Returns `Ok(None)` when no decoder produced a body.
    pub fn parsed_body_as<T: DeserializeOwned>(&self) -> Result<Option<T>, RequestError> {
        self.parsed_body
            .as_ref()
            .map(|value| serde_json::from_value(value.clone()).map_err(RequestError::invalid_content))
            .transpose()
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn push_file(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    /// The parsed query, `None` until a query stage has handled the request.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = Some(query);
    }

    /// Deserializes the raw query string into `T`.
    ///
    /// A missing query string deserializes like an empty one.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        serde_urlencoded::from_str(self.query_string().unwrap_or_default()).map_err(RequestError::invalid_query)
    }
}

impl<B: Into<ReqBody>> From<http::Request<B>> for Request {
    fn from(request: http::Request<B>) -> Self {
        let (parts, body) = request.into_parts();
        Request::new(parts.into(), body.into())
    }
}
