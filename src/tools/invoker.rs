//! Tool invoker
//!
//! Runs a batch of tool calls concurrently and converts every outcome,
//! including panics and unknown names, into a [`ToolResult`]. Results come
//! back in call-issue order.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::core::{ToolCall, ToolResult};
use crate::tools::registry::ToolRegistry;

/// Executes tool calls against a registry
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
}

/// Text fed back to the agent when a call fails
pub fn error_feedback(error: impl std::fmt::Display) -> String {
    format!("Error: {}\n please fix your mistakes.", error)
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute every call of a batch. Never fails.
    pub async fn invoke_batch(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let handles: Vec<_> = calls
            .iter()
            .cloned()
            .map(|call| {
                let invoker = self.clone();
                tokio::spawn(async move { invoker.invoke_one(&call).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(calls)
            .map(|(joined, call)| match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool task aborted");
                    ToolResult::failure(call, error_feedback(format!("tool task aborted: {}", e)))
                }
            })
            .collect()
    }

    /// Execute a single call
    pub async fn invoke_one(&self, call: &ToolCall) -> ToolResult {
        let Some(entry) = self.registry.get(&call.name) else {
            warn!(tool = %call.name, "unknown tool requested");
            return ToolResult::failure(
                call,
                error_feedback(format!("unknown tool '{}'", call.name)),
            );
        };

        debug!(tool = %call.name, call_id = %call.id, safety = %entry.safety(), "invoking tool");
        match entry.tool().invoke(&call.arguments).await {
            Ok(output) => ToolResult::success(call, output.render()),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool failed");
                ToolResult::failure(call, error_feedback(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LeadflowError, Result, ToolDefinition, ToolSafety};
    use crate::tools::registry::tests::EchoTool;
    use crate::tools::registry::{Tool, ToolOutput};
    use async_trait::async_trait;
    use std::time::Duration;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::function("fails", "always fails", serde_json::json!({}))
        }

        fn safety(&self) -> ToolSafety {
            ToolSafety::Safe
        }

        async fn invoke(&self, _arguments: &serde_json::Value) -> Result<ToolOutput> {
            Err(LeadflowError::tool("database offline"))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::function("slow", "sleeps", serde_json::json!({}))
        }

        fn safety(&self) -> ToolSafety {
            ToolSafety::Safe
        }

        async fn invoke(&self, _arguments: &serde_json::Value) -> Result<ToolOutput> {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(ToolOutput::Text("slow done".into()))
        }
    }

    struct PanickingTool;

    #[async_trait]
    impl Tool for PanickingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::function("panics", "panics", serde_json::json!({}))
        }

        fn safety(&self) -> ToolSafety {
            ToolSafety::Safe
        }

        async fn invoke(&self, _arguments: &serde_json::Value) -> Result<ToolOutput> {
            panic!("boom")
        }
    }

    fn invoker() -> ToolInvoker {
        let registry = ToolRegistry::new()
            .with(Arc::new(EchoTool { name: "echo", safety: ToolSafety::Safe }))
            .and_then(|r| r.with(Arc::new(FailingTool)))
            .and_then(|r| r.with(Arc::new(SlowTool)))
            .and_then(|r| r.with(Arc::new(PanickingTool)))
            .unwrap();
        ToolInvoker::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_results_keep_call_order() {
        let calls = vec![
            ToolCall::with_id("a", "slow", serde_json::json!({})),
            ToolCall::with_id("b", "echo", serde_json::json!({"x": 1})),
        ];
        let results = invoker().invoke_batch(&calls).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].call_id, "a");
        assert_eq!(results[0].content, "slow done");
        assert_eq!(results[1].call_id, "b");
        assert_eq!(results[1].content, r#"{"x":1}"#);
    }

    #[tokio::test]
    async fn test_failures_become_results() {
        let calls = vec![
            ToolCall::with_id("a", "fails", serde_json::json!({})),
            ToolCall::with_id("b", "ghost", serde_json::json!({})),
            ToolCall::with_id("c", "panics", serde_json::json!({})),
        ];
        let results = invoker().invoke_batch(&calls).await;

        assert!(results.iter().all(|r| !r.success));
        assert!(results[0].content.contains("database offline"));
        assert!(results[0].content.ends_with("please fix your mistakes."));
        assert!(results[1].content.contains("unknown tool 'ghost'"));
        assert!(results[2].content.contains("aborted"));
        assert_eq!(results[2].call_id, "c");
    }
}
