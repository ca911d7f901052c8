use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::llm::ToolDeclaration;

pub mod calendar;

pub type ToolFuture = BoxFuture<'static, Result<Value, String>>;
pub type ToolHandler = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    handler: ToolHandler,
}

impl Tool {
    pub fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.input_schema.clone(),
        }
    }

    pub async fn call(&self, args: Value) -> Result<Value, String> {
        (self.handler)(args).await
    }
}

/// Ordered set of callable tools shared by agents and the MCP server.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, Fut>(&mut self, name: &str, description: &str, input_schema: Value, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Value, String>> + Send + 'static,
    {
        let handler: ToolHandler = Arc::new(move |args| handler(args).boxed());
        let tool = Tool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            handler,
        };
        match self.tools.iter_mut().find(|t| t.name == name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn register_sync<F>(&mut self, name: &str, description: &str, input_schema: Value, handler: F)
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register(name, description, input_schema, move |args| {
            futures::future::ready(handler(args))
        });
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn list(&self) -> &[Tool] {
        &self.tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        self.tools.iter().map(Tool::declaration).collect()
    }

    pub async fn call(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool not found: {name}"))?;
        tool.call(args).await
    }
}

/// Deserializes tool arguments, treating `null` as an empty object.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, String> {
    let args = if args.is_null() {
        Value::Object(Default::default())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|err| format!("invalid arguments: {err}"))
}
