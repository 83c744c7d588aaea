//! Request parsing stages for a [`micro_request::Pipeline`].
//!
//! - [`QueryParser`] parses the query string into [`Request::query`] and merges it
//!   into the request parameters.
//! - [`BodyParser`] selects a [`Decoder`] by content type and lets it decode the
//!   body into [`Request::parsed_body`], uploaded files and, optionally, the request
//!   parameters.
//!
//! Both stages validate their options when built and fail with a [`ConfigError`]
//! before any request is served.
//!
//! # Example
//!
//! ```
//! use micro_plugins::{BodyParser, QueryParser};
//! use micro_request::{Pipeline, Request};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::builder()
//!     .add_last(QueryParser::builder().build()?)
//!     .add_last(BodyParser::builder().map_params(true).reject_unknown(true).build()?)
//!     .build();
//!
//! let mut req: Request = http::Request::post("/users?page=2")
//!     .header(http::header::CONTENT_TYPE, "application/json")
//!     .body(r#"{"name":"hello"}"#)?
//!     .into();
//! pipeline.run(&mut req).await?;
//!
//! assert_eq!(req.params().get_str("page"), Some("2"));
//! assert_eq!(req.params().get_str("name"), Some("hello"));
//! assert_eq!(req.parsed_body(), Some(&json!({"name": "hello"})));
//! # Ok(())
//! # }
//! ```
//!
//! [`Request::query`]: micro_request::Request::query
//! [`Request::parsed_body`]: micro_request::Request::parsed_body

mod body;
mod error;
mod query_parser;
mod urlencoded;
mod utils;

pub mod decoder;

pub use body::{BodyParser, BodyParserBuilder, BodyParserOptions, BodyReader, DEFAULT_MAX_FIELDS_SIZE, DecoderRegistry};
pub use decoder::Decoder;
pub use error::ConfigError;
pub use query_parser::{QueryParser, QueryParserBuilder, QueryParserOptions};
pub use urlencoded::DEFAULT_MAX_KEYS;
