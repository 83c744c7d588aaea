//! Request body parsing stage.
//!
//! [`BodyParser`] picks one [`Decoder`] by the request content type and hands the
//! request to it. The choice is made from the headers alone; the body is read only
//! once a decoder has been selected, through the [`BodyReader`] shared by all decoders.
//!
//! Requests that carry no body for this stage pass through untouched:
//!
//! - `HEAD` requests
//! - `GET` requests, unless `requestBodyOnGet` is enabled
//! - requests with `Content-Length: 0` that are not chunked
//!
//! A content type without a registered decoder is left alone, or answered with
//! [`RequestError::UnsupportedMediaType`] when `rejectUnknown` is enabled.

mod body_reader;
mod registry;

pub use body_reader::BodyReader;
pub use registry::DecoderRegistry;

use crate::ConfigError;
use crate::decoder::{Decoder, FormDecoder, JsonDecoder, MultipartDecoder};
use async_trait::async_trait;
use http::Method;
use micro_request::{Request, RequestError, Stage};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default bound on the total size of multipart text fields.
pub const DEFAULT_MAX_FIELDS_SIZE: u64 = 2 * 1024 * 1024;

/// Every option the body parser and its decoders recognize.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct BodyParserOptions {
    /// Answer unknown content types with `415 Unsupported Media Type`.
    pub reject_unknown: bool,
    /// Parse bodies sent with `GET`.
    pub request_body_on_get: bool,
    /// Merge decoded body fields into the request parameters.
    pub map_params: bool,
    /// Let body fields replace existing parameters.
    pub override_params: bool,
    /// Upper bound on the body size in bytes, after inflating.
    pub max_body_size: Option<u64>,
    /// Upper bound on the total size of multipart text fields.
    pub max_fields_size: u64,
    /// Collect repeated multipart fields into arrays instead of keeping the last.
    pub multiples: bool,
    /// Register the `application/x-www-form-urlencoded` decoder.
    pub url_encoded: bool,
}

impl Default for BodyParserOptions {
    fn default() -> Self {
        Self {
            reject_unknown: false,
            request_body_on_get: false,
            map_params: false,
            override_params: false,
            max_body_size: None,
            max_fields_size: DEFAULT_MAX_FIELDS_SIZE,
            multiples: false,
            url_encoded: false,
        }
    }
}

impl BodyParserOptions {
    /// Reads options from a JSON object; `null` yields the defaults.
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// The body parsing stage.
#[derive(Debug, Clone)]
pub struct BodyParser {
    reader: Arc<BodyReader>,
    registry: DecoderRegistry,
    reject_unknown: bool,
    request_body_on_get: bool,
}

impl BodyParser {
    /// Builds the stage with the default decoders for `options`.
    pub fn build(options: BodyParserOptions) -> Result<Self, ConfigError> {
        BodyParserBuilder { options, decoders: vec![] }.build()
    }

    pub fn builder() -> BodyParserBuilder {
        BodyParserBuilder::default()
    }

    /// The reader shared by the decoders; also a [`Stage`] of its own.
    pub fn reader(&self) -> Arc<BodyReader> {
        Arc::clone(&self.reader)
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    fn skip_reason(&self, req: &Request) -> Option<&'static str> {
        let method = req.method();
        if method == Method::HEAD {
            return Some("head request");
        }
        if method == Method::GET && !self.request_body_on_get {
            return Some("get request");
        }
        if req.content_length() == Some(0) && !req.is_chunked() {
            return Some("empty body");
        }
        None
    }
}

#[async_trait]
impl Stage for BodyParser {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        if let Some(reason) = self.skip_reason(req) {
            debug!(reason, "body parsing skipped");
            return Ok(());
        }

        let content_type = req.content_type().to_ascii_lowercase();
        if let Some(decoder) = self.registry.get(&content_type) {
            debug!(content_type = %content_type, "body decoder selected");
            return decoder.decode(req).await;
        }

        if self.reject_unknown {
            warn!(content_type = %content_type, "request rejected, no decoder for content type");
            return Err(RequestError::unsupported_media_type(content_type));
        }

        debug!(content_type = %content_type, "no decoder for content type, body left unread");
        Ok(())
    }

    fn name(&self) -> &str {
        "body_parser"
    }
}

/// Fluent construction of [`BodyParser`].
///
/// Decoders added with [`BodyParserBuilder::decoder`] are registered after the
/// default ones and replace them for the same content type.
#[derive(Default)]
pub struct BodyParserBuilder {
    options: BodyParserOptions,
    decoders: Vec<(String, Arc<dyn Decoder>)>,
}

impl BodyParserBuilder {
    pub fn options(mut self, options: BodyParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn reject_unknown(mut self, reject_unknown: bool) -> Self {
        self.options.reject_unknown = reject_unknown;
        self
    }

    pub fn request_body_on_get(mut self, request_body_on_get: bool) -> Self {
        self.options.request_body_on_get = request_body_on_get;
        self
    }

    pub fn map_params(mut self, map_params: bool) -> Self {
        self.options.map_params = map_params;
        self
    }

    pub fn override_params(mut self, override_params: bool) -> Self {
        self.options.override_params = override_params;
        self
    }

    pub fn max_body_size(mut self, max_body_size: u64) -> Self {
        self.options.max_body_size = Some(max_body_size);
        self
    }

    pub fn max_fields_size(mut self, max_fields_size: u64) -> Self {
        self.options.max_fields_size = max_fields_size;
        self
    }

    pub fn multiples(mut self, multiples: bool) -> Self {
        self.options.multiples = multiples;
        self
    }

    pub fn url_encoded(mut self, url_encoded: bool) -> Self {
        self.options.url_encoded = url_encoded;
        self
    }

    /// Registers `decoder` for `content_type`, matched without parameters and
    /// case-insensitively.
    pub fn decoder<D>(mut self, content_type: impl Into<String>, decoder: D) -> Self
    where
        D: Decoder + 'static,
    {
        self.decoders.push((content_type.into(), Arc::new(decoder)));
        self
    }

    pub fn build(self) -> Result<BodyParser, ConfigError> {
        let options = self.options;
        let reader = Arc::new(BodyReader::new(&options)?);

        let mut registry = DecoderRegistry::new();
        registry.register(
            mime::APPLICATION_JSON.essence_str(),
            Arc::new(JsonDecoder::new(&options, Arc::clone(&reader))),
        );
        registry.register(
            mime::MULTIPART_FORM_DATA.essence_str(),
            Arc::new(MultipartDecoder::new(&options, Arc::clone(&reader))?),
        );
        if options.url_encoded {
            registry.register(
                mime::APPLICATION_WWW_FORM_URLENCODED.essence_str(),
                Arc::new(FormDecoder::new(&options, Arc::clone(&reader))),
            );
        }
        for (content_type, decoder) in self.decoders {
            registry.register(content_type, decoder);
        }

        Ok(BodyParser {
            reader,
            registry,
            reject_unknown: options.reject_unknown,
            request_body_on_get: options.request_body_on_get,
        })
    }
}

impl Debug for BodyParserBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyParserBuilder")
            .field("options", &self.options)
            .field("decoders", &self.decoders.iter().map(|(content_type, _)| content_type).collect::<Vec<_>>())
            .finish()
    }
}
