use crate::decoder::{Decoder, map_params};
use crate::utils::ensure;
use crate::{BodyParserOptions, BodyReader, ConfigError};
use async_trait::async_trait;
use futures::stream;
use micro_request::{Request, RequestError, UploadedFile};
use multer::Multipart;
use serde_json::map::Entry;
use serde_json::{Map, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::trace;

/// Decodes `multipart/form-data` bodies held in memory.
///
/// Parts carrying a `filename` become [`UploadedFile`]s, every other part is a text
/// field. The fields form the parsed body object and, with `mapParams`, are merged
/// into the request parameters.
#[derive(Debug, Clone)]
pub struct MultipartDecoder {
    reader: Arc<BodyReader>,
    map_params: bool,
    override_params: bool,
    max_fields_size: u64,
    multiples: bool,
}

impl MultipartDecoder {
    pub fn new(options: &BodyParserOptions, reader: Arc<BodyReader>) -> Result<Self, ConfigError> {
        ensure!(options.max_fields_size > 0, ConfigError::invalid_value("maxFieldsSize", "must be greater than 0"));

        Ok(Self {
            reader,
            map_params: options.map_params,
            override_params: options.override_params,
            max_fields_size: options.max_fields_size,
            multiples: options.multiples,
        })
    }

    fn insert_field(&self, fields: &mut Map<String, Value>, name: String, value: String) {
        match fields.entry(name) {
            Entry::Occupied(mut occupied) if self.multiples => match occupied.get_mut() {
                Value::Array(values) => values.push(Value::String(value)),
                first => {
                    let taken = first.take();
                    *first = Value::Array(vec![taken, Value::String(value)]);
                }
            },
            Entry::Occupied(mut occupied) => {
                occupied.insert(Value::String(value));
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Value::String(value));
            }
        }
    }
}

#[async_trait]
impl Decoder for MultipartDecoder {
    async fn decode(&self, req: &mut Request) -> Result<(), RequestError> {
        let boundary = boundary(req)?;
        let bytes = self.reader.read(req).await?;
        let mut multipart = Multipart::new(stream::once(async move { Ok::<_, Infallible>(bytes) }), boundary);

        let mut fields = Map::new();
        let mut fields_size = 0u64;
        while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
            let name = field
                .name()
                .map(str::to_owned)
                .ok_or_else(|| RequestError::invalid_content("multipart part without a name"))?;
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(ToString::to_string);
            let data = field.bytes().await.map_err(invalid_multipart)?;

            if let Some(file_name) = file_name {
                trace!(field = %name, file_name = %file_name, size = data.len(), "multipart file received");
                req.push_file(UploadedFile::new(name, file_name, content_type, data));
                continue;
            }

            fields_size += data.len() as u64;
            ensure!(
                fields_size <= self.max_fields_size,
                RequestError::payload_too_large(fields_size, self.max_fields_size)
            );

            let value = String::from_utf8(data.to_vec())
                .map_err(|e| RequestError::invalid_content(format!("field {name} is not utf-8: {e}")))?;
            self.insert_field(&mut fields, name, value);
        }

        if self.map_params {
            map_params(req.params_mut(), &fields, self.override_params);
        }

        req.set_parsed_body(Value::Object(fields));
        Ok(())
    }
}

fn invalid_multipart(e: multer::Error) -> RequestError {
    RequestError::invalid_content(format!("invalid multipart body: {e}"))
}

fn boundary(req: &Request) -> Result<String, RequestError> {
    req.header()
        .mime()
        .and_then(|content_type| {
            content_type.get_param(mime::BOUNDARY).map(|value| value.as_str().trim_matches('"').to_owned())
        })
        .filter(|value| !value.is_empty())
        .ok_or_else(|| RequestError::invalid_content("multipart body without boundary"))
}
