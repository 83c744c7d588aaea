use crate::utils::ensure;
use crate::{BodyParserOptions, ConfigError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use flate2::read::GzDecoder;
use http::Method;
use http_body_util::BodyExt;
use micro_request::{ReqBody, Request, RequestError, Stage};
use std::io::Read;
use tracing::trace;

/// Reads the whole request body into memory.
///
/// One reader is shared by every decoder of a [`BodyParser`](crate::BodyParser). The
/// bytes are cached on the request, so the stream is consumed at most once no matter
/// how many decoders ask for it.
#[derive(Debug, Clone)]
pub struct BodyReader {
    max_body_size: Option<u64>,
}

enum ContentCoding {
    Identity,
    Gzip,
}

impl BodyReader {
    pub fn new(options: &BodyParserOptions) -> Result<Self, ConfigError> {
        ensure!(options.max_body_size != Some(0), ConfigError::invalid_value("maxBodySize", "must be greater than 0"));
        Ok(Self { max_body_size: options.max_body_size })
    }

    pub fn max_body_size(&self) -> Option<u64> {
        self.max_body_size
    }

    /// Returns the body bytes, reading the stream on first use.
    ///
    /// Gzip encoded bodies are inflated; any other content coding is rejected before
    /// the stream is touched.
    pub async fn read(&self, req: &mut Request) -> Result<Bytes, RequestError> {
        if let Some(bytes) = req.raw_body() {
            return Ok(bytes.clone());
        }

        if let (Some(limit), Some(length)) = (self.max_body_size, req.content_length()) {
            ensure!(length <= limit, RequestError::payload_too_large(length, limit));
        }

        let coding = content_coding(req)?;
        let body = req.take_body()?;
        let bytes = self.collect(body).await?;
        let bytes = match coding {
            ContentCoding::Identity => bytes,
            ContentCoding::Gzip => self.gunzip(&bytes)?,
        };

        trace!(size = bytes.len(), "request body read");
        req.set_raw_body(bytes.clone());
        Ok(bytes)
    }

    async fn collect(&self, mut body: ReqBody) -> Result<Bytes, RequestError> {
        let mut buf = BytesMut::new();
        while let Some(frame) = body.frame().await {
            // trailers carry no body bytes
            if let Ok(data) = frame?.into_data() {
                buf.extend_from_slice(&data);
                self.check_size(buf.len())?;
            }
        }
        Ok(buf.freeze())
    }

    fn gunzip(&self, bytes: &[u8]) -> Result<Bytes, RequestError> {
        let mut decoder = GzDecoder::new(bytes);
        let mut inflated = Vec::new();
        let result = match self.max_body_size {
            Some(limit) => decoder.by_ref().take(limit.saturating_add(1)).read_to_end(&mut inflated),
            None => decoder.read_to_end(&mut inflated),
        };
        result.map_err(RequestError::io)?;

        self.check_size(inflated.len())?;
        Ok(Bytes::from(inflated))
    }

    fn check_size(&self, size: usize) -> Result<(), RequestError> {
        if let Some(limit) = self.max_body_size {
            let size = size as u64;
            ensure!(size <= limit, RequestError::payload_too_large(size, limit));
        }
        Ok(())
    }
}

fn content_coding(req: &Request) -> Result<ContentCoding, RequestError> {
    match req.header().content_encoding() {
        None => Ok(ContentCoding::Identity),
        Some(encoding) if encoding.is_empty() || encoding.eq_ignore_ascii_case("identity") => {
            Ok(ContentCoding::Identity)
        }
        Some(encoding) if encoding.eq_ignore_ascii_case("gzip") => Ok(ContentCoding::Gzip),
        Some(encoding) => Err(RequestError::unsupported_content_encoding(encoding)),
    }
}

/// Used on its own, the reader reads every body it is handed, whatever its type.
#[async_trait]
impl Stage for BodyReader {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        if req.method() == Method::HEAD || (req.content_length() == Some(0) && !req.is_chunked()) {
            return Ok(());
        }
        self.read(req).await.map(|_| ())
    }

    fn name(&self) -> &str {
        "body_reader"
    }
}
