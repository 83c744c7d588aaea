//! Query string parsing stage.
//!
//! [`QueryParser`] parses the raw query string of every request into
//! [`Request::query`] and, unless disabled, merges the parsed keys into the request
//! parameters. Keys already present in the parameters (route parameters, usually) win
//! over query keys unless `overrideParams` is enabled.
//!
//! # Example
//! ```
//! use micro_plugins::QueryParser;
//!
//! let parser = QueryParser::builder().override_params(true).parameter_limit(50).build().unwrap();
//! # let _ = parser;
//!
//! // options of the richer nested syntax are rejected up front
//! assert!(QueryParser::builder().allow_dots(true).build().is_err());
//! ```

use crate::urlencoded::{self, DEFAULT_MAX_KEYS};
use crate::utils::ensure;
use crate::ConfigError;
use async_trait::async_trait;
use micro_request::{Query, Request, RequestError, Stage};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Every option the query parser recognizes.
///
/// `allowDots`, `parseArrays`, `plainObjects` and `strictNullHandling` belong to the
/// nested query syntax this parser does not implement; they are accepted only with the
/// value that matches the flat behavior. `arrayLimit` and `depth` are no longer
/// supported at all.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QueryParserOptions {
    /// Merge parsed keys into the request parameters, default `true`.
    pub map_params: Option<bool>,
    /// Let query values replace existing parameters, default `false`.
    pub override_params: Option<bool>,
    /// Upper bound on the number of parsed pairs, `0` for no bound.
    pub parameter_limit: Option<usize>,
    pub allow_dots: Option<bool>,
    pub parse_arrays: Option<bool>,
    pub plain_objects: Option<bool>,
    pub strict_null_handling: Option<bool>,
    pub array_limit: Option<u64>,
    pub depth: Option<u64>,
}

impl QueryParserOptions {
    /// Reads options from a JSON object; `null` yields the defaults.
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let removed = [("arrayLimit", self.array_limit.is_some()), ("depth", self.depth.is_some())];
        if let Some((option, _)) = removed.into_iter().find(|(_, present)| *present) {
            return Err(ConfigError::removed(option));
        }

        ensure!(!self.allow_dots.unwrap_or(false), ConfigError::unsupported("allowDots"));
        ensure!(!self.parse_arrays.unwrap_or(false), ConfigError::unsupported("parseArrays"));
        ensure!(self.plain_objects.unwrap_or(true), ConfigError::PlainObjectsRequired);
        ensure!(!self.strict_null_handling.unwrap_or(false), ConfigError::unsupported("strictNullHandling"));
        Ok(())
    }
}

/// The query string stage.
#[derive(Debug, Clone)]
pub struct QueryParser {
    map_params: bool,
    override_params: bool,
    max_keys: usize,
}

impl QueryParser {
    /// Validates `options` and builds the stage.
    pub fn build(options: QueryParserOptions) -> Result<Self, ConfigError> {
        options.validate()?;

        Ok(Self {
            map_params: options.map_params.unwrap_or(true),
            override_params: options.override_params.unwrap_or(false),
            max_keys: options.parameter_limit.unwrap_or(DEFAULT_MAX_KEYS),
        })
    }

    pub fn builder() -> QueryParserBuilder {
        QueryParserBuilder::default()
    }

    /// The bound handed to the pair decoder, see [`QueryParserOptions::parameter_limit`].
    pub fn max_keys(&self) -> usize {
        self.max_keys
    }

    fn parse(&self, raw: &str) -> Result<Query, RequestError> {
        urlencoded::parse_pairs(raw.as_bytes(), self.max_keys).map_err(RequestError::invalid_query)
    }
}

#[async_trait]
impl Stage for QueryParser {
    async fn call(&self, req: &mut Request) -> Result<(), RequestError> {
        let Some(raw) = req.query_string().filter(|raw| !raw.is_empty()) else {
            req.set_query(Query::new());
            return Ok(());
        };

        let query = self.parse(raw)?;

        if self.map_params {
            let params = req.params_mut();
            for (key, value) in &query {
                if !params.merge(key.as_str(), value.clone(), self.override_params) {
                    debug!(key = %key, "query parameter shadowed by an existing parameter");
                }
            }
        }

        req.set_query(query);
        Ok(())
    }

    fn name(&self) -> &str {
        "query_parser"
    }
}

/// Fluent construction of [`QueryParser`], validated by [`QueryParserBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct QueryParserBuilder {
    options: QueryParserOptions,
}

impl QueryParserBuilder {
    pub fn map_params(mut self, map_params: bool) -> Self {
        self.options.map_params = Some(map_params);
        self
    }

    pub fn override_params(mut self, override_params: bool) -> Self {
        self.options.override_params = Some(override_params);
        self
    }

    pub fn parameter_limit(mut self, parameter_limit: usize) -> Self {
        self.options.parameter_limit = Some(parameter_limit);
        self
    }

    pub fn allow_dots(mut self, allow_dots: bool) -> Self {
        self.options.allow_dots = Some(allow_dots);
        self
    }

    pub fn parse_arrays(mut self, parse_arrays: bool) -> Self {
        self.options.parse_arrays = Some(parse_arrays);
        self
    }

    pub fn plain_objects(mut self, plain_objects: bool) -> Self {
        self.options.plain_objects = Some(plain_objects);
        self
    }

    pub fn strict_null_handling(mut self, strict_null_handling: bool) -> Self {
        self.options.strict_null_handling = Some(strict_null_handling);
        self
    }

    pub fn build(self) -> Result<QueryParser, ConfigError> {
        QueryParser::build(self.options)
    }
}
