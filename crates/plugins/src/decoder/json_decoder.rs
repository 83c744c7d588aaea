use crate::decoder::{Decoder, map_params};
use crate::{BodyParserOptions, BodyReader};
use async_trait::async_trait;
use micro_request::{Request, RequestError};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Decodes `application/json` bodies.
///
/// The decoded value becomes the parsed body. With `mapParams`, the members of a JSON
/// object are also merged into the request parameters; arrays and scalars are never
/// mapped.
#[derive(Debug, Clone)]
pub struct JsonDecoder {
    reader: Arc<BodyReader>,
    map_params: bool,
    override_params: bool,
}

impl JsonDecoder {
    pub fn new(options: &BodyParserOptions, reader: Arc<BodyReader>) -> Self {
        Self { reader, map_params: options.map_params, override_params: options.override_params }
    }
}

#[async_trait]
impl Decoder for JsonDecoder {
    async fn decode(&self, req: &mut Request) -> Result<(), RequestError> {
        let bytes = self.reader.read(req).await?;
        if bytes.is_empty() {
            return Ok(());
        }

        let value: Value =
            serde_json::from_slice(&bytes).map_err(|e| RequestError::invalid_content(format!("invalid JSON: {e}")))?;
        trace!(size = bytes.len(), "json body decoded");

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

    fn decoder(options: BodyParserOptions) -> JsonDecoder {
        let reader = Arc::new(BodyReader::new(&options).unwrap());
        JsonDecoder::new(&options, reader)
    }

    fn request(body: &'static str) -> Request {
        http::Request::post("/").header(CONTENT_TYPE, "application/json").body(body).unwrap().into()
    }

    #[tokio::test]
    async fn decodes_into_parsed_body() {
        let mut req = request(r#"{"name":"hello","zip":"world"}"#);

        decoder(BodyParserOptions::default()).decode(&mut req).await.unwrap();

        assert_eq!(req.parsed_body(), Some(&json!({"name": "hello", "zip": "world"})));
        assert!(req.params().is_empty());
        assert!(req.raw_body().is_some());
    }

    #[tokio::test]
    async fn empty_body_is_ignored() {
        let mut req = request("");

        decoder(BodyParserOptions::default()).decode(&mut req).await.unwrap();

        assert!(req.parsed_body().is_none());
    }

    #[tokio::test]
    async fn invalid_json() {
        let mut req = request("{\"name\":");

        let err = decoder(BodyParserOptions::default()).decode(&mut req).await.unwrap_err();

        assert!(matches!(err, RequestError::InvalidContent { ref reason } if reason.starts_with("invalid JSON")));
    }

    #[tokio::test]
    async fn maps_object_members_into_params() {
        let options = BodyParserOptions { map_params: true, ..Default::default() };
        let mut req = request(r#"{"id":"body","count":3}"#).with_params([("id", "path")].into_iter().collect());

        decoder(options).decode(&mut req).await.unwrap();

        assert_eq!(req.params().get_str("id"), Some("path"));
        assert_eq!(req.params().get("count"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn override_params() {
        let options = BodyParserOptions { map_params: true, override_params: true, ..Default::default() };
        let mut req = request(r#"{"id":"body"}"#).with_params([("id", "path")].into_iter().collect());

        decoder(options).decode(&mut req).await.unwrap();

        assert_eq!(req.params().get_str("id"), Some("body"));
    }

    #[tokio::test]
    async fn arrays_are_not_mapped() {
        let options = BodyParserOptions { map_params: true, ..Default::default() };
        let mut req = request("[1,2,3]");

        decoder(options).decode(&mut req).await.unwrap();

        assert!(req.params().is_empty());
        assert_eq!(req.parsed_body(), Some(&json!([1, 2, 3])));
    }
}
