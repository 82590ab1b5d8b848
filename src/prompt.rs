//! Prompt definition and builder API

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::{
    Content, GetPromptResult, PromptArgument, PromptDefinition, PromptMessage, PromptRole,
};
use crate::tool::BoxFuture;

/// Handler trait for prompt expansion
pub trait PromptHandler: Send + Sync {
    fn get(&self, arguments: HashMap<String, String>)
    -> BoxFuture<'static, Result<GetPromptResult>>;
}

struct FnPromptHandler<F> {
    f: F,
}

impl<F, Fut> PromptHandler for FnPromptHandler<F>
where
    F: Fn(HashMap<String, String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<GetPromptResult>> + Send + 'static,
{
    fn get(
        &self,
        arguments: HashMap<String, String>,
    ) -> BoxFuture<'static, Result<GetPromptResult>> {
        Box::pin((self.f)(arguments))
    }
}

/// A named prompt that expands to a list of messages
pub struct Prompt {
    /// Prompt name
    pub name: String,
    /// Description of the prompt
    pub description: Option<String>,
    /// Declared arguments
    pub arguments: Vec<PromptArgument>,
    handler: Arc<dyn PromptHandler>,
}

impl std::fmt::Debug for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prompt")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Prompt {
    /// Get the prompt definition for `prompts/list`
    pub fn definition(&self) -> PromptDefinition {
        PromptDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            arguments: self.arguments.clone(),
        }
    }

    /// Expand the prompt, checking that required arguments are present
    pub async fn get(&self, arguments: HashMap<String, String>) -> Result<GetPromptResult> {
        for arg in &self.arguments {
            if arg.required && !arguments.contains_key(&arg.name) {
                return Err(Error::JsonRpc(crate::error::JsonRpcError::invalid_params(
                    format!("Missing required prompt argument: {}", arg.name),
                )));
            }
        }
        self.handler.get(arguments).await
    }
}

/// Builder for prompts
pub struct PromptBuilder {
    name: String,
    description: Option<String>,
    arguments: Vec<PromptArgument>,
}

impl PromptBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declare a required argument
    pub fn required_arg(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.arguments.push(PromptArgument {
            name: name.into(),
            description: Some(description.into()),
            required: true,
        });
        self
    }

    /// Declare an optional argument
    pub fn optional_arg(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.arguments.push(PromptArgument {
            name: name.into(),
            description: Some(description.into()),
            required: false,
        });
        self
    }

    /// Finish the builder with an expansion handler
    pub fn handler<F, Fut>(self, f: F) -> Prompt
    where
        F: Fn(HashMap<String, String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<GetPromptResult>> + Send + 'static,
    {
        Prompt {
            name: self.name,
            description: self.description,
            arguments: self.arguments,
            handler: Arc::new(FnPromptHandler { f }),
        }
    }
}

/// Build a single-message user prompt result.
pub fn user_message(text: impl Into<String>) -> GetPromptResult {
    GetPromptResult {
        description: None,
        messages: vec![PromptMessage {
            role: PromptRole::User,
            content: Content::Text { text: text.into() },
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greeting_prompt() -> Prompt {
        PromptBuilder::new("greeting_prompt")
            .description("Generate a greeting prompt")
            .optional_arg("name", "Name to greet")
            .handler(|args| async move {
                let name = args.get("name").map(String::as_str).unwrap_or("World");
                Ok(user_message(format!(
                    "Please write a friendly greeting for {}",
                    name
                )))
            })
    }

    #[tokio::test]
    async fn test_prompt_expansion() {
        let prompt = greeting_prompt();
        let mut args = HashMap::new();
        args.insert("name".to_string(), "Johnny".to_string());

        let result = prompt.get(args).await.unwrap();
        assert_eq!(result.messages.len(), 1);
        match &result.messages[0].content {
            Content::Text { text } => assert!(text.contains("Johnny")),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_optional_arg_defaults() {
        let prompt = greeting_prompt();
        let result = prompt.get(HashMap::new()).await.unwrap();
        match &result.messages[0].content {
            Content::Text { text } => assert!(text.contains("World")),
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_required_arg() {
        let prompt = PromptBuilder::new("strict")
            .required_arg("name", "Name to greet")
            .handler(|_args| async move { Ok(user_message("hi")) });

        assert!(prompt.get(HashMap::new()).await.is_err());
    }

    #[test]
    fn test_definition_lists_arguments() {
        let def = greeting_prompt().definition();
        assert_eq!(def.name, "greeting_prompt");
        assert_eq!(def.arguments.len(), 1);
        assert!(!def.arguments[0].required);
    }
}
