//! The request model and stage pipeline shared by the micro plugins.
//!
//! A server hands every incoming request to a [`Pipeline`]: an ordered list of
//! [`Stage`]s that each inspect and mutate the [`Request`] in place. A stage returns
//! `Ok(())` to pass the request on, or a [`RequestError`] to abort the remaining
//! stages for that request. Because a stage is an `async fn` returning a `Result`, it
//! resolves exactly once per request.
//!
//! # Example
//!
//! ```
//! use micro_request::{fn_stage, Pipeline, Request};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pipeline = Pipeline::builder()
//!     .add_last(fn_stage(|req: &mut Request| {
//!         req.params_mut().insert("tenant", "acme");
//!         Ok(())
//!     }))
//!     .build();
//!
//! let mut req: Request = http::Request::get("/orders?page=2").body(()).unwrap().into();
//! pipeline.run(&mut req).await.unwrap();
//! assert_eq!(req.params().get_str("tenant"), Some("acme"));
//! # }
//! ```
//!
//! # Core Components
//!
//! - [`RequestHeader`]: method, uri and headers, plus the body related accessors
//!   (`content_length`, `is_chunked`, `content_type`)
//! - [`ReqBody`]: the incoming body, a single chunk or a stream of frames
//! - [`Request`]: header, body and the state built up by the stages
//! - [`Params`] / [`Query`]: the key-unique request mappings
//! - [`Stage`] / [`Pipeline`]: the middleware chain
//!
//! # Error Handling
//!
//! [`RequestError`] is the one request-time error type; it maps itself to the response
//! status a server should answer with, see [`RequestError::status_code`].

mod body;
mod error;
mod header;
mod params;
mod pipeline;
mod request;
mod upload;

pub use body::ReqBody;
pub use error::RequestError;
pub use header::{DEFAULT_CONTENT_TYPE, RequestHeader};
pub use params::{Params, Query, QueryValue};
pub use pipeline::{FnStage, Pipeline, PipelineBuilder, Stage, fn_stage};
pub use request::Request;
pub use upload::UploadedFile;
