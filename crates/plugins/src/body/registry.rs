use crate::decoder::Decoder;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Content type to decoder lookup.
///
/// Content types are stored lower-cased and matched case-insensitively. Registering a
/// type twice replaces the earlier decoder.
#[derive(Clone, Default)]
pub struct DecoderRegistry {
    inner: Vec<(String, Arc<dyn Decoder>)>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, content_type: impl AsRef<str>, decoder: Arc<dyn Decoder>) {
        let content_type = content_type.as_ref().trim().to_ascii_lowercase();
        match self.inner.iter_mut().find(|(registered, _)| *registered == content_type) {
            Some((_, existing)) => *existing = decoder,
            None => self.inner.push((content_type, decoder)),
        }
    }

    pub fn get(&self, content_type: &str) -> Option<&Arc<dyn Decoder>> {
        let content_type = content_type.trim();
        self.inner
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(content_type))
            .map(|(_, decoder)| decoder)
    }

    pub fn content_types(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(content_type, _)| content_type.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Debug for DecoderRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.content_types()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::MockDecoder;

    #[test]
    fn lookup_ignores_case() {
        let mut registry = DecoderRegistry::new();
        registry.register("Application/JSON", Arc::new(MockDecoder::new()));

        assert!(registry.get("application/json").is_some());
        assert!(registry.get("APPLICATION/JSON").is_some());
        assert!(registry.get("text/plain").is_none());
        assert_eq!(registry.content_types().collect::<Vec<_>>(), vec!["application/json"]);
    }

    #[test]
    fn register_replaces() {
        let mut registry = DecoderRegistry::new();
        let first: Arc<dyn Decoder> = Arc::new(MockDecoder::new());
        let second: Arc<dyn Decoder> = Arc::new(MockDecoder::new());

        registry.register("text/csv", first);
        registry.register("TEXT/CSV", Arc::clone(&second));

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(registry.get("text/csv").unwrap(), &second));
    }
}
