use http::header::CONTENT_TYPE;
use micro_plugins::{BodyParser, BodyParserOptions, QueryParser, QueryParserOptions};
use micro_request::{Pipeline, Request, fn_stage};
use serde_json::json;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let body_options = BodyParserOptions::from_json(json!({
        "mapParams": true,
        "rejectUnknown": true,
        "maxBodySize": 1024 * 1024,
    }))
    .expect("invalid body parser options");
    let query_options =
        QueryParserOptions::from_json(json!({"parameterLimit": 100})).expect("invalid query parser options");

    let pipeline = Pipeline::builder()
        .add_last(fn_stage(|req: &mut Request| {
            req.params_mut().insert("tenant", "acme");
            Ok(())
        }))
        .add_last(QueryParser::build(query_options).expect("query parser"))
        .add_last(BodyParser::build(body_options).expect("body parser"))
        .build();

    let requests = [
        http::Request::post("/users?tenant=evil&page=1")
            .header(CONTENT_TYPE, "application/json")
            .body(r#"{"name":"hello","zip":"world"}"#),
        http::Request::post("/notes").header(CONTENT_TYPE, "text/plain").body("just text"),
    ];

    for request in requests {
        let mut req: Request = request.expect("valid request").into();
        match pipeline.run(&mut req).await {
            Ok(()) => info!(
                uri = %req.uri(),
                params = ?req.params(),
                body = ?req.parsed_body(),
                "request parsed"
            ),
            Err(e) => error!(uri = %req.uri(), status = %e.status_code(), cause = %e, "request rejected"),
        }
    }
}
