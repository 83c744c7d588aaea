use crate::decoder::{Decoder, map_params};
use crate::urlencoded::{self, DEFAULT_MAX_KEYS};
use crate::{BodyParserOptions, BodyReader};
use async_trait::async_trait;
use micro_request::{Request, RequestError};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Decodes `application/x-www-form-urlencoded` bodies.
///
/// Not registered unless `urlEncoded` is enabled. Pairs follow the query string rules,
/// so repeated fields become arrays.
#[derive(Debug, Clone)]
pub struct FormDecoder {
    reader: Arc<BodyReader>,
    map_params: bool,
    override_params: bool,
}

impl FormDecoder {
    pub fn new(options: &BodyParserOptions, reader: Arc<BodyReader>) -> Self {
        Self { reader, map_params: options.map_params, override_params: options.override_params }
    }
}

#[async_trait]
impl Decoder for FormDecoder {
    async fn decode(&self, req: &mut Request) -> Result<(), RequestError> {
        let bytes = self.reader.read(req).await?;
        if bytes.is_empty() {
            return Ok(());
        }

        let form = urlencoded::parse_pairs(&bytes, DEFAULT_MAX_KEYS)
            .map_err(|e| RequestError::invalid_content(format!("invalid form body: {e}")))?;
        trace!(fields = form.len(), "form body decoded");

        let value = form.into_value();
        if self.map_params && let Value::Object(fields) = &value {
            map_params(req.params_mut(), fields, self.override_params);
        }

        req.set_parsed_body(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use serde_json::json;

    fn decoder(options: BodyParserOptions) -> FormDecoder {
        let reader = Arc::new(BodyReader::new(&options).unwrap());
        FormDecoder::new(&options, reader)
    }

    fn request(body: &'static str) -> Request {
        http::Request::post("/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn decodes_pairs() {
        let mut req = request("name=hello+world&tag=a&tag=b");

        decoder(BodyParserOptions::default()).decode(&mut req).await.unwrap();

        assert_eq!(req.parsed_body(), Some(&json!({"name": "hello world", "tag": ["a", "b"]})));
        assert!(req.params().is_empty());
    }

    #[tokio::test]
    async fn maps_fields_into_params() {
        let options = BodyParserOptions { map_params: true, ..Default::default() };
        let mut req = request("id=body&page=2").with_params([("id", "path")].into_iter().collect());

        decoder(options).decode(&mut req).await.unwrap();

        assert_eq!(req.params().get_str("id"), Some("path"));
        assert_eq!(req.params().get_str("page"), Some("2"));
    }

    #[tokio::test]
    async fn empty_body_is_ignored() {
        let mut req = request("");

        decoder(BodyParserOptions::default()).decode(&mut req).await.unwrap();

        assert!(req.parsed_body().is_none());
    }
}
