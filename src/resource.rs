//! Resource definition and builder API
//!
//! Static resources serve fixed content at a fixed URI. Resource templates
//! match URI patterns like `echo://{message}` and compute their content from
//! the extracted variables.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::{ReadResourceResult, ResourceContent, ResourceDefinition};
use crate::tool::BoxFuture;

/// Handler trait for resource reads
pub trait ResourceHandler: Send + Sync {
    fn read(&self) -> BoxFuture<'_, Result<ReadResourceResult>>;
}

struct StaticHandler {
    uri: String,
    mime_type: Option<String>,
    text: String,
}

impl ResourceHandler for StaticHandler {
    fn read(&self) -> BoxFuture<'_, Result<ReadResourceResult>> {
        let result = ReadResourceResult {
            contents: vec![ResourceContent {
                uri: self.uri.clone(),
                mime_type: self.mime_type.clone(),
                text: Some(self.text.clone()),
                blob: None,
            }],
        };
        Box::pin(async move { Ok(result) })
    }
}

/// A resource with a fixed URI
pub struct Resource {
    /// Resource URI
    pub uri: String,
    /// Human-readable name
    pub name: String,
    /// Description of the resource
    pub description: Option<String>,
    /// MIME type of the content
    pub mime_type: Option<String>,
    handler: Arc<dyn ResourceHandler>,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.uri)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Resource {
    /// Get the resource definition for `resources/list`
    pub fn definition(&self) -> ResourceDefinition {
        ResourceDefinition {
            uri: self.uri.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            mime_type: self.mime_type.clone(),
        }
    }

    /// Read the resource content
    pub fn read(&self) -> BoxFuture<'_, Result<ReadResourceResult>> {
        self.handler.read()
    }
}

/// Builder for static resources
pub struct ResourceBuilder {
    uri: String,
    name: Option<String>,
    description: Option<String>,
    mime_type: Option<String>,
}

impl ResourceBuilder {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: None,
            description: None,
            mime_type: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Finish the builder with plain text content
    pub fn text(self, content: impl Into<String>) -> Resource {
        let mime_type = self.mime_type.or_else(|| Some("text/plain".to_string()));
        let uri = self.uri;
        Resource {
            handler: Arc::new(StaticHandler {
                uri: uri.clone(),
                mime_type: mime_type.clone(),
                text: content.into(),
            }),
            name: self.name.unwrap_or_else(|| uri.clone()),
            description: self.description,
            mime_type,
            uri,
        }
    }

    /// Finish the builder with JSON content
    pub fn json(mut self, value: serde_json::Value) -> Resource {
        if self.mime_type.is_none() {
            self.mime_type = Some("application/json".to_string());
        }
        let content = serde_json::to_string_pretty(&value).unwrap_or_default();
        self.text(content)
    }
}

/// Handler trait for template-backed resource reads
pub trait TemplateHandler: Send + Sync {
    fn read(
        &self,
        uri: String,
        variables: HashMap<String, String>,
    ) -> BoxFuture<'static, Result<ReadResourceResult>>;
}

struct FnTemplateHandler<F> {
    f: F,
}

impl<F, Fut> TemplateHandler for FnTemplateHandler<F>
where
    F: Fn(String, HashMap<String, String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ReadResourceResult>> + Send + 'static,
{
    fn read(
        &self,
        uri: String,
        variables: HashMap<String, String>,
    ) -> BoxFuture<'static, Result<ReadResourceResult>> {
        Box::pin((self.f)(uri, variables))
    }
}

/// A dynamic resource matched by URI pattern.
///
/// Patterns are URI strings with `{variable}` placeholders, e.g.
/// `echo://{message}`. A placeholder matches any non-empty run of characters
/// up to the next literal segment.
pub struct ResourceTemplate {
    /// The URI template pattern
    pub uri_template: String,
    /// Human-readable name
    pub name: String,
    /// Description of the template
    pub description: Option<String>,
    handler: Arc<dyn TemplateHandler>,
}

impl std::fmt::Debug for ResourceTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceTemplate")
            .field("uri_template", &self.uri_template)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ResourceTemplate {
    /// Match a URI against this template, extracting placeholder values.
    ///
    /// Returns `None` if the URI does not fit the pattern.
    pub fn match_uri(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut vars = HashMap::new();
        let mut rest = uri;
        let mut pattern = self.uri_template.as_str();

        while let Some(open) = pattern.find('{') {
            let literal = &pattern[..open];
            rest = rest.strip_prefix(literal)?;

            let close = pattern[open..].find('}')? + open;
            let var_name = &pattern[open + 1..close];
            pattern = &pattern[close + 1..];

            // The variable runs until the next literal part begins, or to the
            // end of the URI if this placeholder is last.
            let next_literal_end = pattern.find('{').unwrap_or(pattern.len());
            let next_literal = &pattern[..next_literal_end];
            let value_end = if next_literal.is_empty() {
                rest.len()
            } else {
                rest.find(next_literal)?
            };

            if value_end == 0 {
                return None;
            }
            vars.insert(var_name.to_string(), rest[..value_end].to_string());
            rest = &rest[value_end..];
        }

        if rest == pattern { Some(vars) } else { None }
    }

    /// Read a resource at the given URI using this template's handler
    pub fn read(
        &self,
        uri: &str,
        variables: HashMap<String, String>,
    ) -> BoxFuture<'static, Result<ReadResourceResult>> {
        self.handler.read(uri.to_string(), variables)
    }
}

/// Builder for resource templates
pub struct ResourceTemplateBuilder {
    uri_template: String,
    name: Option<String>,
    description: Option<String>,
}

impl ResourceTemplateBuilder {
    pub fn new(uri_template: impl Into<String>) -> Self {
        Self {
            uri_template: uri_template.into(),
            name: None,
            description: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Finish the builder with a read handler
    pub fn handler<F, Fut>(self, f: F) -> ResourceTemplate
    where
        F: Fn(String, HashMap<String, String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ReadResourceResult>> + Send + 'static,
    {
        ResourceTemplate {
            name: self.name.unwrap_or_else(|| self.uri_template.clone()),
            description: self.description,
            uri_template: self.uri_template,
            handler: Arc::new(FnTemplateHandler { f }),
        }
    }
}

/// Build a `ReadResourceResult` containing a single text item.
pub fn text_result(uri: impl Into<String>, text: impl Into<String>) -> ReadResourceResult {
    ReadResourceResult {
        contents: vec![ResourceContent {
            uri: uri.into(),
            mime_type: Some("text/plain".to_string()),
            text: Some(text.into()),
            blob: None,
        }],
    }
}

/// Error helper for template handlers that reject a URI after matching.
pub fn not_found(uri: &str) -> Error {
    Error::JsonRpc(crate::error::JsonRpcError::resource_not_found(uri))
}
