//! Router
//!
//! Pure decision from the latest model output to the next node. One router
//! exists per agent level; both share the same rules, the primary level
//! adding the transfer check in front and the specialist level the
//! escalation check.

use tracing::debug;

use crate::agent::profile::{AgentProfile, ToolKind};
use crate::core::{AgentId, Message};

/// Next node to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// No tool calls; control returns to the human
    EndTurn,
    /// Every call is safe
    SafeTools,
    /// Every call is sensitive; suspend for confirmation
    SensitiveTools,
    /// Escalation signal present; pop the dialog stack
    LeaveSkill,
    /// Transfer requested; push the specialist
    EnterSpecialist(AgentId),
    /// Mixed or unrecognised batch
    Ambiguous { tools: Vec<String> },
}

/// Router for one agent level
pub struct Router<'a> {
    profile: &'a AgentProfile,
}

impl<'a> Router<'a> {
    pub fn new(profile: &'a AgentProfile) -> Self {
        Self { profile }
    }

    fn is_primary(&self) -> bool {
        self.profile.agent() == AgentId::Primary
    }

    /// Decide what follows `output`
    pub fn route(&self, output: &Message) -> Route {
        let Some(first) = output.tool_calls.first() else {
            return Route::EndTurn;
        };

        if self.is_primary() {
            if let ToolKind::Transfer(target) = self.profile.classify(&first.name) {
                return Route::EnterSpecialist(target);
            }
        } else if output
            .tool_calls
            .iter()
            .any(|call| self.profile.classify(&call.name) == ToolKind::Escalation)
        {
            return Route::LeaveSkill;
        }

        let kinds: Vec<ToolKind> = output
            .tool_calls
            .iter()
            .map(|call| self.profile.classify(&call.name))
            .collect();

        let route = if kinds.iter().all(|k| *k == ToolKind::Safe) {
            Route::SafeTools
        } else if kinds.iter().all(|k| *k == ToolKind::Sensitive) {
            Route::SensitiveTools
        } else {
            Route::Ambiguous {
                tools: output.tool_names(),
            }
        };

        debug!(agent = %self.profile.agent(), ?route, "routed tool batch");
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, ToolCall, ToolSafety};
    use crate::tools::control::COMPLETE_OR_ESCALATE;
    use crate::tools::registry::tests::EchoTool;
    use crate::tools::ToolRegistry;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
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
            .unwrap()
    }

    fn output(names: &[&str]) -> Message {
        let calls = names
            .iter()
            .map(|n| ToolCall::new(*n, serde_json::json!({})))
            .collect();
        Message::assistant_with_tools("", calls)
    }

    fn lead() -> AgentProfile {
        AgentProfile::lead(&Config::default(), &registry()).unwrap()
    }

    fn primary() -> AgentProfile {
        AgentProfile::primary(&Config::default(), &registry()).unwrap()
    }

    #[test]
    fn test_plain_reply_ends_turn() {
        let profile = lead();
        assert_eq!(Router::new(&profile).route(&Message::assistant("hello")), Route::EndTurn);
    }

    #[test]
    fn test_all_safe_routes_to_safe_executor() {
        let profile = lead();
        let router = Router::new(&profile);
        assert_eq!(router.route(&output(&["lookup"])), Route::SafeTools);
        assert_eq!(router.route(&output(&["lookup", "lookup"])), Route::SafeTools);
    }

    #[test]
    fn test_all_sensitive_routes_to_sensitive_executor() {
        let profile = lead();
        assert_eq!(Router::new(&profile).route(&output(&["create"])), Route::SensitiveTools);
    }

    #[test]
    fn test_mixed_batch_is_ambiguous_in_any_order() {
        let profile = lead();
        let router = Router::new(&profile);
        for batch in [["lookup", "create"], ["create", "lookup"]] {
            assert!(matches!(router.route(&output(&batch)), Route::Ambiguous { .. }));
        }
    }

    #[test]
    fn test_unknown_tool_is_ambiguous() {
        let profile = lead();
        assert_eq!(
            Router::new(&profile).route(&output(&["delete_everything"])),
            Route::Ambiguous {
                tools: vec!["delete_everything".into()]
            }
        );
    }

    #[test]
    fn test_escalation_wins_regardless_of_companions() {
        let profile = lead();
        let router = Router::new(&profile);
        assert_eq!(router.route(&output(&[COMPLETE_OR_ESCALATE])), Route::LeaveSkill);
        assert_eq!(router.route(&output(&["create", COMPLETE_OR_ESCALATE])), Route::LeaveSkill);
        assert_eq!(router.route(&output(&["ghost", COMPLETE_OR_ESCALATE])), Route::LeaveSkill);
    }

    #[test]
    fn test_primary_transfer_checked_on_first_call() {
        let profile = primary();
        let router = Router::new(&profile);
        assert_eq!(
            router.route(&output(&["ToLeadAssistant"])),
            Route::EnterSpecialist(AgentId::LeadAgent)
        );
        assert!(matches!(
            router.route(&output(&["lookup", "ToLeadAssistant"])),
            Route::Ambiguous { .. }
        ));
    }

    #[test]
    fn test_primary_has_no_executable_tools() {
        let profile = primary();
        let router = Router::new(&profile);
        assert!(matches!(router.route(&output(&["lookup"])), Route::Ambiguous { .. }));
        assert!(matches!(
            router.route(&output(&[COMPLETE_OR_ESCALATE])),
            Route::Ambiguous { .. }
        ));
    }
}
