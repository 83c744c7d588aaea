//! Body decoders: one per content type, selected by the [`BodyParser`](crate::BodyParser).
//!
//! A decoder reads the body through the shared [`BodyReader`](crate::BodyReader),
//! decodes it and stores the result on the request. Errors are returned to the
//! pipeline unchanged.

mod form_decoder;
mod json_decoder;
mod multipart_decoder;

pub use form_decoder::FormDecoder;
pub use json_decoder::JsonDecoder;
pub use multipart_decoder::MultipartDecoder;

use async_trait::async_trait;
use micro_request::{Params, Request, RequestError};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Converts the body of one content type into request state.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Decoder: Send + Sync {
    async fn decode(&self, req: &mut Request) -> Result<(), RequestError>;
}

#[async_trait]
impl<D: Decoder + ?Sized> Decoder for Arc<D> {
    async fn decode(&self, req: &mut Request) -> Result<(), RequestError> {
        (**self).decode(req).await
    }
}

/// Merges decoded body fields into the request parameters under the override policy.
fn map_params<'a, I>(params: &mut Params, fields: I, override_params: bool)
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    for (key, value) in fields {
        if !params.merge(key.as_str(), value.clone(), override_params) {
            debug!(key = %key, "body field shadowed by an existing parameter");
        }
    }
}
