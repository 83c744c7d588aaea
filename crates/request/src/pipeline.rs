use crate::{Request, RequestError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{trace, warn};

/// One transformer of the request pipeline.
///
/// `Ok(())` hands the request on to the next stage; an error aborts the pipeline for
/// this request.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError>;

    /// The name used for this stage in log events.
    fn name(&self) -> &str {
        "stage"
    }
}

#[async_trait]
impl<S: Stage + ?Sized> Stage for Arc<S> {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        (**self).call(req).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<S: Stage + ?Sized> Stage for Box<S> {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        (**self).call(req).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// An ordered sequence of stages, run one after another until one of them fails.
pub struct Pipeline {
    inner: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.iter().map(|stage| stage.name())).finish()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Runs every stage in order, stopping at the first error.
    pub async fn run(&self, req: &mut Request) -> Result<(), RequestError> {
        for stage in &self.inner {
            trace!(stage = stage.name(), "running stage");
            if let Err(e) = stage.call(req).await {
                warn!(stage = stage.name(), cause = %e, "stage aborted the request");
                return Err(e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Stage for Pipeline {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        self.run(req).await
    }

    fn name(&self) -> &str {
        "pipeline"
    }
}

#[derive(Default)]
pub struct PipelineBuilder {
    inner: Vec<Box<dyn Stage>>,
}

impl PipelineBuilder {
    fn new() -> Self {
        Self { inner: vec![] }
    }

    pub fn add_last<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.inner.push(Box::new(stage));
        self
    }

    pub fn add_first<S: Stage + 'static>(mut self, stage: S) -> Self {
        self.inner.insert(0, Box::new(stage));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline { inner: self.inner }
    }
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.inner.iter().map(|stage| stage.name())).finish()
    }
}

/// A stage backed by a synchronous closure.
#[derive(Clone, Copy)]
pub struct FnStage<F> {
    f: F,
}

pub fn fn_stage<F>(f: F) -> FnStage<F>
where
    F: Fn(&mut Request) -> Result<(), RequestError> + Send + Sync,
{
    FnStage { f }
}

impl<F> std::fmt::Debug for FnStage<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Stage for FnStage<F>
where
    F: Fn(&mut Request) -> Result<(), RequestError> + Send + Sync,
{
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        (self.f)(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> impl Stage + 'static {
        let log = Arc::clone(log);
        fn_stage(move |_req| {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    fn request() -> Request {
        http::Request::get("/").body(()).unwrap().into()
    }

    #[tokio::test]
    async fn runs_stages_in_order() {
        let log = Arc::new(Mutex::new(vec![]));
        let pipeline = Pipeline::builder()
            .add_last(recorder(&log, "second"))
            .add_last(recorder(&log, "third"))
            .add_first(recorder(&log, "first"))
            .build();

        assert_eq!(pipeline.len(), 3);
        pipeline.run(&mut request()).await.unwrap();
        assert_eq!(*log.lock().unwrap(), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn short_circuits_on_error() {
        let log = Arc::new(Mutex::new(vec![]));
        let pipeline = Pipeline::builder()
            .add_last(recorder(&log, "first"))
            .add_last(fn_stage(|_req| Err(RequestError::unsupported_media_type("text/plain"))))
            .add_last(recorder(&log, "never"))
            .build();

        let result = pipeline.run(&mut request()).await;

        assert!(matches!(
            result,
            Err(RequestError::UnsupportedMediaType { content_type }) if content_type == "text/plain"
        ));
        assert_eq!(*log.lock().unwrap(), ["first"]);
    }

    #[tokio::test]
    async fn stages_mutate_the_request() {
        let pipeline = Pipeline::builder()
            .add_last(fn_stage(|req| {
                req.params_mut().insert("id", "7");
                Ok(())
            }))
            .add_last(Arc::new(fn_stage(|req| {
                assert_eq!(req.params().get_str("id"), Some("7"));
                Ok(())
            })))
            .build();

        let mut req = request();
        pipeline.call(&mut req).await.unwrap();
        assert_eq!(req.params().get_str("id"), Some("7"));
    }

    #[tokio::test]
    async fn empty_pipeline_passes() {
        let pipeline = Pipeline::builder().build();
        assert!(pipeline.is_empty());
        assert!(pipeline.run(&mut request()).await.is_ok());
    }
}
