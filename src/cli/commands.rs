//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::{Assistant, ThreadId};
use crate::core::{Config, Result};

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Switch to another thread
    SwitchThread(ThreadId),
    /// Exit the REPL
    Exit,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub async fn handle_command(
    input: &str,
    assistant: &Assistant,
    thread_id: &str,
) -> Result<CommandResult> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(CommandResult::None);
    }

    // Plain text belongs to the agent; only a bare exit word is honoured
    let Some(command) = input.strip_prefix('/') else {
        return Ok(match input.to_lowercase().as_str() {
            "exit" | "quit" | "q" => CommandResult::Exit,
            _ => CommandResult::Continue(input.to_string()),
        });
    };

    let parts: Vec<&str> = command.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "status" => {
            let state = assistant.state(thread_id).await?;
            let config = assistant.config();
            let stack: Vec<String> = state
                .dialog_stack
                .as_slice()
                .iter()
                .map(|a| a.to_string())
                .collect();
            let status = format!(
                "Leadflow Status:\n\
                 ─────────────────────────────\n\
                 Thread:       {}\n\
                 Active agent: {}\n\
                 Dialog stack: [{}]\n\
                 Pending:      {}\n\
                 History:      {} messages\n\
                 Primary:      {}\n\
                 Specialist:   {}",
                state.thread_id,
                state.active_agent(),
                stack.join(", "),
                match &state.pending {
                    Some(p) => p
                        .calls
                        .iter()
                        .map(|c| c.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    None => "none".to_string(),
                },
                state.messages.len(),
                config.models.primary,
                config.models.specialist,
            );
            Ok(CommandResult::Handled(status))
        }

        "history" => {
            let state = assistant.state(thread_id).await?;
            if state.messages.is_empty() {
                return Ok(CommandResult::Handled("No messages yet.".to_string()));
            }
            let lines: Vec<String> = state
                .messages
                .iter()
                .map(|m| {
                    let mut line = format!("[{}] {}", m.role, m.content.lines().next().unwrap_or(""));
                    if m.has_tool_calls() {
                        line.push_str(&format!(" -> {}", m.tool_names().join(", ")));
                    }
                    line
                })
                .collect();
            Ok(CommandResult::Handled(lines.join("\n")))
        }

        "threads" => {
            let threads = assistant.threads().await?;
            if threads.is_empty() {
                return Ok(CommandResult::Handled("No saved threads.".to_string()));
            }
            Ok(CommandResult::Handled(
                threads
                    .iter()
                    .map(|t| {
                        if t == thread_id {
                            format!("* {}", t)
                        } else {
                            format!("  {}", t)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ))
        }

        "thread" => {
            if args.is_empty() {
                return Ok(CommandResult::Handled(format!("Current thread: {}", thread_id)));
            }
            Ok(CommandResult::SwitchThread(args.to_string()))
        }

        "new" => Ok(CommandResult::SwitchThread(uuid::Uuid::new_v4().to_string())),

        "config" => match args {
            "" => Ok(CommandResult::Handled(format!(
                "Config file: {}\n\nDefaults:\n{}",
                Config::config_file().display(),
                Config::default_config_toml()
            ))),
            "save" => {
                let path = assistant.save_config()?;
                Ok(CommandResult::Handled(format!(
                    "Configuration saved to {}",
                    path.display()
                )))
            }
            other => Ok(CommandResult::Handled(format!(
                "Unknown config action: {}. Use /config or /config save.",
                other
            ))),
        },

        "models" => {
            let models = assistant.list_models().await?;
            let output = format!(
                "Available models:\n{}\n\nCurrent:\n  Primary:    {}\n  Specialist: {}",
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                assistant.config().models.primary,
                assistant.config().models.specialist
            );
            Ok(CommandResult::Handled(output))
        }

        _ => Ok(CommandResult::Handled(format!(
            "Unknown command: /{}. Type /help for available commands.",
            cmd
        ))),
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Leadflow Commands:
─────────────────────────────────────────────
  /help, /?        Show this help message
  /exit, /quit     Exit Leadflow (bare exit, quit or q also work)
  /status          Show thread and model status
  /history         Show the messages of this thread
  /threads         List saved threads
  /thread <id>     Switch to another thread
  /new             Start a fresh thread
  /models          List available Ollama models
  /config          Show the config file location and defaults
  /config save     Write the running configuration to the config file

Anything else is sent to the assistant.

When an action needs confirmation:
  y                Approve and run it
  anything else    Deny it, with your text as the reason

Keyboard Shortcuts:
  Ctrl+D           Exit Leadflow
─────────────────────────────────────────────"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crm::InMemoryLeadDirectory;
    use crate::llm::ScriptedProvider;
    use crate::store::InMemoryThreadStore;
    use std::sync::Arc;

    fn assistant() -> Assistant {
        let mut config = Config::default();
        config.agent.timezone = "UTC".into();
        Assistant::with_parts(
            config,
            Arc::new(ScriptedProvider::new([])),
            Arc::new(InMemoryLeadDirectory::new()),
            Arc::new(InMemoryThreadStore::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_exit_and_plain_input() {
        let assistant = assistant();
        assert_eq!(handle_command("quit", &assistant, "1").await.unwrap(), CommandResult::Exit);
        assert_eq!(
            handle_command("create a lead", &assistant, "1").await.unwrap(),
            CommandResult::Continue("create a lead".into())
        );
        assert_eq!(handle_command("  ", &assistant, "1").await.unwrap(), CommandResult::None);
        assert_eq!(handle_command("/exit", &assistant, "1").await.unwrap(), CommandResult::Exit);
    }

    #[tokio::test]
    async fn test_requests_starting_with_command_words_reach_the_agent() {
        let assistant = assistant();
        for request in [
            "new lead for John Doe, phone +1-202-555-0134",
            "status of my lead for John Doe?",
            "help me register a customer",
            "thread the needle",
            "history of John Doe's enquiries",
        ] {
            assert_eq!(
                handle_command(request, &assistant, "1").await.unwrap(),
                CommandResult::Continue(request.into())
            );
        }
    }

    #[tokio::test]
    async fn test_config_shows_location_and_defaults() {
        let assistant = assistant();
        let CommandResult::Handled(text) = handle_command("/config", &assistant, "1").await.unwrap() else {
            panic!("expected handled");
        };
        assert!(text.contains("config.toml"));
        assert!(text.contains("[models]"));

        let CommandResult::Handled(text) = handle_command("/config reset", &assistant, "1").await.unwrap() else {
            panic!("expected handled");
        };
        assert!(text.starts_with("Unknown config action: reset"));
    }

    #[tokio::test]
    async fn test_slash_help() {
        let assistant = assistant();
        let CommandResult::Handled(text) = handle_command("/help", &assistant, "1").await.unwrap() else {
            panic!("expected handled");
        };
        assert!(text.contains("/thread <id>"));
    }

    #[tokio::test]
    async fn test_unknown_slash_command() {
        let assistant = assistant();
        let CommandResult::Handled(text) = handle_command("/frobnicate", &assistant, "1").await.unwrap() else {
            panic!("expected handled");
        };
        assert!(text.starts_with("Unknown command: /frobnicate"));
    }

    #[tokio::test]
    async fn test_status_reports_active_agent() {
        let assistant = assistant();
        let CommandResult::Handled(text) = handle_command("/status", &assistant, "7").await.unwrap() else {
            panic!("expected handled");
        };
        assert!(text.contains("Thread:       7"));
        assert!(text.contains("Active agent: primary_assistant"));
        assert!(text.contains("Pending:      none"));
    }

    #[tokio::test]
    async fn test_history_and_thread_switching() {
        let assistant = assistant();
        let CommandResult::Handled(text) = handle_command("/history", &assistant, "1").await.unwrap() else {
            panic!("expected handled");
        };
        assert_eq!(text, "No messages yet.");

        assert_eq!(
            handle_command("/thread 42", &assistant, "1").await.unwrap(),
            CommandResult::SwitchThread("42".into())
        );
        assert!(matches!(
            handle_command("/new", &assistant, "1").await.unwrap(),
            CommandResult::SwitchThread(_)
        ));
    }
}
