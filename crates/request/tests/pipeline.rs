use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use http::StatusCode;
use http::header::CONTENT_TYPE;
use http_body::Frame;
use http_body_util::{BodyExt, StreamBody};
use micro_request::{Pipeline, ReqBody, Request, RequestError, Stage, fn_stage};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Reads the body as UTF-8 text into the parsed body.
struct TextStage {
    calls: AtomicUsize,
}

#[async_trait]
impl Stage for TextStage {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if req.content_type() != "text/plain" {
            return Ok(());
        }

        let bytes = req.take_body()?.collect().await?.to_bytes();
        let text = String::from_utf8(bytes.to_vec()).map_err(RequestError::invalid_content)?;
        req.set_raw_body(bytes);
        req.set_parsed_body(text.into());
        Ok(())
    }

    fn name(&self) -> &str {
        "text"
    }
}

#[tokio::test]
async fn custom_stage_reads_a_streamed_body() {
    let text = Arc::new(TextStage { calls: AtomicUsize::new(0) });
    let pipeline = Pipeline::builder().add_last(Arc::clone(&text)).build();

    let frames: Vec<Result<_, RequestError>> =
        vec![Ok(Frame::data(Bytes::from_static(b"hello "))), Ok(Frame::data(Bytes::from_static(b"world")))];
    let mut req: Request = http::Request::post("/notes")
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(ReqBody::stream(StreamBody::new(stream::iter(frames))))
        .unwrap()
        .into();

    pipeline.run(&mut req).await.unwrap();

    assert_eq!(text.calls.load(Ordering::SeqCst), 1);
    assert_eq!(req.parsed_body().and_then(|body| body.as_str()), Some("hello world"));
    assert!(!req.has_unread_body());
}

#[tokio::test]
async fn second_read_of_the_stream_fails() {
    let pipeline = Pipeline::builder()
        .add_last(TextStage { calls: AtomicUsize::new(0) })
        .add_last(TextStage { calls: AtomicUsize::new(0) })
        .build();
    let mut req: Request =
        http::Request::post("/").header(CONTENT_TYPE, "text/plain").body("once").unwrap().into();

    let err = pipeline.run(&mut req).await.unwrap_err();

    assert!(matches!(err, RequestError::BodyConsumed));
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn nested_pipelines() {
    let inner = Pipeline::builder()
        .add_last(fn_stage(|req: &mut Request| {
            req.params_mut().insert("inner", true);
            Ok(())
        }))
        .build();
    let outer = Pipeline::builder()
        .add_last(inner)
        .add_last(fn_stage(|req: &mut Request| {
            let seen = req.params().contains_key("inner");
            req.params_mut().insert("outer_saw_inner", seen);
            Ok(())
        }))
        .build();

    let mut req: Request = http::Request::get("/").body(()).unwrap().into();
    outer.run(&mut req).await.unwrap();

    assert_eq!(req.params().get("outer_saw_inner"), Some(&serde_json::Value::Bool(true)));
    assert_eq!(format!("{outer:?}"), r#"["pipeline", "stage"]"#);
}
