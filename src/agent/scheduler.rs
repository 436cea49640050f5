//! Turn scheduler
//!
//! Drives one turn: run the active agent, route its output, execute safe
//! tools or dialog transitions, and loop until the agent replies, the
//! router gives up, or a sensitive batch needs the operator.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::agent::delegation;
use crate::agent::node::AgentNode;
use crate::agent::prompts;
use crate::agent::router::{Route, Router};
use crate::agent::state::{PendingAction, StateUpdate};
use crate::agent::turn::{Decision, TurnOutcome, TurnPhase, TurnReport};
use crate::core::{AgentId, AmbiguityPolicy, LeadflowError, Message, Result};
use crate::store::{ThreadLease, ThreadRegistry};
use crate::tools::ToolInvoker;

/// Runs turns against the thread registry
pub struct TurnScheduler {
    threads: Arc<ThreadRegistry>,
    invoker: ToolInvoker,
    nodes: HashMap<AgentId, AgentNode>,
    max_steps: usize,
    ambiguity_policy: AmbiguityPolicy,
}

impl TurnScheduler {
    pub fn new(threads: Arc<ThreadRegistry>, invoker: ToolInvoker) -> Self {
        Self {
            threads,
            invoker,
            nodes: HashMap::new(),
            max_steps: 25,
            ambiguity_policy: AmbiguityPolicy::default(),
        }
    }

    /// Add the node that runs when its agent is active
    pub fn with_node(mut self, node: AgentNode) -> Self {
        self.nodes.insert(node.agent(), node);
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub fn with_ambiguity_policy(mut self, policy: AmbiguityPolicy) -> Self {
        self.ambiguity_policy = policy;
        self
    }

    pub fn threads(&self) -> &Arc<ThreadRegistry> {
        &self.threads
    }

    pub fn node(&self, agent: AgentId) -> Result<&AgentNode> {
        self.nodes
            .get(&agent)
            .ok_or_else(|| LeadflowError::UnknownAgent(agent.to_string()))
    }

    /// Process one user input on `thread_id`
    pub async fn run_turn(&self, thread_id: &str, input: &str) -> Result<TurnReport> {
        let mut lease = self.threads.lease(thread_id).await?;
        if lease.state().pending.is_some() {
            return Err(LeadflowError::TurnSuspended {
                thread_id: thread_id.to_string(),
            });
        }

        let first_new = lease.state().messages.len();
        let mut update = delegation::seal_unanswered(lease.state());
        if !update.messages.is_empty() {
            debug!(thread = %thread_id, count = update.messages.len(), "answering calls left open");
        }
        update.messages.push(Message::user(input));
        lease.apply(update).await?;

        info!(thread = %thread_id, agent = %lease.state().active_agent(), "turn started");
        self.drive(&mut lease, first_new).await
    }

    /// Continue a suspended turn with the operator's decision
    pub async fn resume(&self, thread_id: &str, decision: Decision) -> Result<TurnReport> {
        let mut lease = self.threads.lease(thread_id).await?;
        let Some(pending) = lease.state().pending.clone() else {
            return Err(LeadflowError::NoPendingAction {
                thread_id: thread_id.to_string(),
            });
        };
        let first_new = lease.state().messages.len();

        let results = match decision {
            Decision::Approve => {
                info!(thread = %thread_id, tools = ?pending.calls.iter().map(|c| &c.name).collect::<Vec<_>>(), "sensitive action approved");
                self.invoker
                    .invoke_batch(&pending.calls)
                    .await
                    .into_iter()
                    .map(|r| r.into_message())
                    .collect()
            }
            Decision::Deny { reason } => {
                let reason = reason.unwrap_or_else(|| "no reason given".to_string());
                info!(thread = %thread_id, reason = %reason, "sensitive action denied");
                pending
                    .calls
                    .iter()
                    .map(|call| Message::tool(call, prompts::denial(&reason)))
                    .collect()
            }
        };

        lease.resolve(StateUpdate::messages(results)).await?;
        self.drive(&mut lease, first_new).await
    }

    async fn drive(&self, lease: &mut ThreadLease, first_new: usize) -> Result<TurnReport> {
        let mut steps = 0;

        let outcome = loop {
            let agent = lease.state().active_agent();
            let mut phase = TurnPhase::active(agent);

            if steps >= self.max_steps {
                warn!(thread = %lease.state().thread_id, steps, "step limit reached");
                break TurnOutcome::StepLimitReached;
            }
            steps += 1;

            let node = self.node(agent)?;
            let produced = node.respond(&lease.state().messages).await?;
            lease.apply(StateUpdate::messages(produced)).await?;

            let Some(output) = lease.state().last_message().cloned() else {
                break TurnOutcome::Completed {
                    reply: String::new(),
                };
            };

            let route = Router::new(node.profile()).route(&output);
            debug!(thread = %lease.state().thread_id, %phase, ?route, "routing");

            match route {
                Route::EndTurn => {
                    phase = TurnPhase::TurnComplete;
                    debug!(%phase, "agent replied");
                    break TurnOutcome::Completed {
                        reply: output.content,
                    };
                }
                Route::SafeTools => {
                    phase = TurnPhase::AwaitingSafeTool;
                    debug!(%phase, tools = ?output.tool_names(), "executing safe tools");
                    let results = self.invoker.invoke_batch(&output.tool_calls).await;
                    lease
                        .apply(StateUpdate::messages(
                            results.into_iter().map(|r| r.into_message()).collect(),
                        ))
                        .await?;
                }
                Route::SensitiveTools => {
                    phase = TurnPhase::AwaitingSensitiveTool;
                    info!(%phase, tools = ?output.tool_names(), "suspending for confirmation");
                    lease
                        .suspend(PendingAction {
                            agent,
                            calls: output.tool_calls.clone(),
                            requested_at: Utc::now(),
                        })
                        .await?;
                    break TurnOutcome::AwaitingConfirmation {
                        pending: output.tool_calls,
                    };
                }
                Route::LeaveSkill => {
                    lease.apply(delegation::leave(&output)).await?;
                }
                Route::EnterSpecialist(target) => {
                    self.node(target)?;
                    lease.apply(delegation::enter(&output, target)).await?;
                }
                Route::Ambiguous { tools } => {
                    warn!(thread = %lease.state().thread_id, ?tools, "ambiguous tool batch");
                    match self.ambiguity_policy {
                        AmbiguityPolicy::EndTurn => {
                            let reply = Some(output.content)
                                .filter(|c| !c.trim().is_empty());
                            break TurnOutcome::Unresolved { reply, tools };
                        }
                        AmbiguityPolicy::Error => {
                            return Err(LeadflowError::RoutingAmbiguous { tools });
                        }
                    }
                }
            }
        };

        Ok(TurnReport::new(lease.state(), outcome, first_new, steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::profile::AgentProfile;
    use crate::core::{Config, Role, ToolCall, ToolSafety};
    use crate::llm::{LLMResponse, ScriptedProvider};
    use crate::store::InMemoryThreadStore;
    use crate::tools::control::COMPLETE_OR_ESCALATE;
    use crate::tools::registry::tests::EchoTool;
    use crate::tools::ToolRegistry;

    fn build(responses: Vec<LLMResponse>, policy: AmbiguityPolicy) -> (TurnScheduler, Arc<ScriptedProvider>) {
        let config = Config::default();
        let registry = Arc::new(
            ToolRegistry::new()
                .with(Arc::new(EchoTool {
                    name: "lookup",
                    safety: ToolSafety::Safe,
                }))
                .unwrap()
                .with(Arc::new(EchoTool {
                    name: "create",
                    safety: ToolSafety::Sensitive,
                }))
                .unwrap(),
        );
        let provider = Arc::new(ScriptedProvider::new(responses));
        let tz = chrono_tz::Asia::Kolkata;

        let primary = AgentProfile::primary(&config, &registry).unwrap();
        let lead = AgentProfile::lead(&config, &registry).unwrap();
        let threads = Arc::new(ThreadRegistry::new(Arc::new(InMemoryThreadStore::new())));

        let scheduler = TurnScheduler::new(threads, ToolInvoker::new(registry))
            .with_node(AgentNode::new(primary, provider.clone(), tz, 3))
            .with_node(AgentNode::new(lead, provider.clone(), tz, 3))
            .with_max_steps(6)
            .with_ambiguity_policy(policy);
        (scheduler, provider)
    }

    fn call(name: &str) -> ToolCall {
        ToolCall::new(name, serde_json::json!({"reason": "done"}))
    }

    #[tokio::test]
    async fn test_plain_reply_completes() {
        let (scheduler, _) = build(vec![LLMResponse::text("Hello!")], AmbiguityPolicy::EndTurn);
        let report = scheduler.run_turn("t", "hi").await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::Completed { reply: "Hello!".into() });
        assert_eq!(report.new_messages.len(), 2);
        assert_eq!(report.active_agent, AgentId::Primary);
    }

    #[tokio::test]
    async fn test_safe_tools_loop_back_to_same_agent() {
        let (scheduler, provider) = build(
            vec![
                LLMResponse::tools(vec![call("ToLeadAssistant")]),
                LLMResponse::tools(vec![call("lookup")]),
                LLMResponse::text("Customer not found."),
            ],
            AmbiguityPolicy::EndTurn,
        );
        let report = scheduler.run_turn("t", "find John").await.unwrap();

        assert_eq!(report.outcome.reply(), Some("Customer not found."));
        assert_eq!(report.active_agent, AgentId::LeadAgent);
        let models: Vec<String> = provider.requests().iter().map(|r| r.tool_names.join(",")).collect();
        assert_eq!(models[0], "ToLeadAssistant");
        assert!(models[2].contains("lookup"));
    }

    #[tokio::test]
    async fn test_tool_result_follows_its_call() {
        let lookup = call("lookup");
        let (scheduler, _) = build(
            vec![
                LLMResponse::tools(vec![call("ToLeadAssistant")]),
                LLMResponse::tools(vec![lookup.clone()]),
                LLMResponse::text("done"),
            ],
            AmbiguityPolicy::EndTurn,
        );
        scheduler.run_turn("t", "x").await.unwrap();

        let state = scheduler.threads().get("t").await.unwrap();
        let idx = state
            .messages
            .iter()
            .position(|m| m.tool_calls.iter().any(|c| c.id == lookup.id))
            .unwrap();
        assert_eq!(state.messages[idx + 1].tool_call_id.as_deref(), Some(lookup.id.as_str()));
    }

    #[tokio::test]
    async fn test_sensitive_batch_suspends_before_execution() {
        let (scheduler, provider) = build(
            vec![
                LLMResponse::tools(vec![call("ToLeadAssistant")]),
                LLMResponse::tools(vec![call("create")]),
            ],
            AmbiguityPolicy::EndTurn,
        );
        let report = scheduler.run_turn("t", "create").await.unwrap();

        assert!(report.outcome.is_suspended());
        let state = scheduler.threads().get("t").await.unwrap();
        assert!(state.pending.is_some());
        assert_eq!(state.last_message().unwrap().role, Role::Assistant);
        assert_eq!(provider.remaining(), 0);

        let err = scheduler.run_turn("t", "hello?").await.unwrap_err();
        assert!(matches!(err, LeadflowError::TurnSuspended { .. }));
    }

    #[tokio::test]
    async fn test_resume_without_pending_is_error() {
        let (scheduler, _) = build(vec![], AmbiguityPolicy::EndTurn);
        let err = scheduler.resume("t", Decision::Approve).await.unwrap_err();
        assert!(matches!(err, LeadflowError::NoPendingAction { .. }));
    }

    #[tokio::test]
    async fn test_escalation_returns_to_primary() {
        let (scheduler, _) = build(
            vec![
                LLMResponse::tools(vec![call("ToLeadAssistant")]),
                LLMResponse::tools(vec![call("lookup"), call(COMPLETE_OR_ESCALATE)]),
                LLMResponse::text("Anything else?"),
            ],
            AmbiguityPolicy::EndTurn,
        );
        let report = scheduler.run_turn("t", "never mind").await.unwrap();

        assert_eq!(report.active_agent, AgentId::Primary);
        assert!(report.dialog_stack.is_empty());
        assert!(report
            .new_messages
            .iter()
            .any(|m| m.content == prompts::RESUMPTION));
    }

    #[tokio::test]
    async fn test_ambiguous_batch_under_each_policy() {
        let batch = || {
            vec![
                LLMResponse::tools(vec![call("ToLeadAssistant")]),
                LLMResponse::tools(vec![call("lookup"), call("create")]),
            ]
        };

        let (scheduler, _) = build(batch(), AmbiguityPolicy::EndTurn);
        let report = scheduler.run_turn("t", "x").await.unwrap();
        assert_eq!(
            report.outcome,
            TurnOutcome::Unresolved {
                reply: None,
                tools: vec!["lookup".into(), "create".into()]
            }
        );

        let (scheduler, _) = build(batch(), AmbiguityPolicy::Error);
        let err = scheduler.run_turn("t", "x").await.unwrap_err();
        assert!(matches!(err, LeadflowError::RoutingAmbiguous { .. }));
    }

    #[tokio::test]
    async fn test_step_limit() {
        let responses: Vec<LLMResponse> = (0..10).map(|_| LLMResponse::tools(vec![call("lookup")])).collect();
        let (scheduler, _) = build(
            [vec![LLMResponse::tools(vec![call("ToLeadAssistant")])], responses].concat(),
            AmbiguityPolicy::EndTurn,
        );
        let report = scheduler.run_turn("t", "loop").await.unwrap();

        assert_eq!(report.outcome, TurnOutcome::StepLimitReached);
        assert_eq!(report.steps, 6);
    }
}
