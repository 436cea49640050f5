//! Interactive REPL for Leadflow
//!
//! Provides the operator loop: free-text turns, the approval prompt when a
//! sensitive action is pending, and printing of every new message once.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};

use uuid::Uuid;

use crate::agent::{Assistant, ConversationState, Decision, ThreadId, TurnOutcome, TurnReport};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{AgentId, Config, Message, Result, Role};

/// Longest message body printed before truncation
pub const MAX_PRINT_LEN: usize = 1500;

const APPROVAL_PROMPT: &str = "Do you approve of the above actions? Type 'y' to continue; otherwise, explain your requested changed.";

/// Renders each message once, by id, and announces agent changes
#[derive(Debug, Default)]
pub struct MessagePrinter {
    seen: HashSet<Uuid>,
    current_agent: Option<AgentId>,
}

impl MessagePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark existing history as already shown
    pub fn prime(&mut self, state: &ConversationState) {
        self.seen.extend(state.messages.iter().map(|m| m.id));
        self.current_agent = Some(state.active_agent());
    }

    /// Lines to print for a turn report
    pub fn render(&mut self, report: &TurnReport) -> Vec<String> {
        let mut lines = Vec::new();

        if self.current_agent != Some(report.active_agent) {
            lines.push(format!("Currently in: {}", report.active_agent));
            self.current_agent = Some(report.active_agent);
        }

        for message in &report.new_messages {
            if self.seen.insert(message.id) {
                lines.push(render_message(message));
            }
        }

        match &report.outcome {
            TurnOutcome::AwaitingConfirmation { pending } => {
                lines.push("Pending action:".to_string());
                for call in pending {
                    lines.push(format!("  {} {}", call.name, call.arguments));
                }
            }
            TurnOutcome::Unresolved { tools, .. } => {
                lines.push(format!(
                    "(turn ended unresolved: could not route {})",
                    tools.join(", ")
                ));
            }
            TurnOutcome::StepLimitReached => {
                lines.push("(turn stopped: step limit reached)".to_string());
            }
            TurnOutcome::Completed { .. } => {}
        }

        lines
    }
}

fn render_message(message: &Message) -> String {
    let title = match message.role {
        Role::System => "System Message",
        Role::User => "Human Message",
        Role::Assistant => "Ai Message",
        Role::Tool => "Tool Message",
    };

    let mut body = format!("{:=^64}\n", format!(" {} ", title));
    if let Some(name) = &message.name {
        body.push_str(&format!("Name: {}\n", name));
    }
    body.push_str(&message.content);
    for call in &message.tool_calls {
        body.push_str(&format!("\nTool Call: {} ({})\n  Args: {}", call.name, call.id, call.arguments));
    }

    truncate(&body, MAX_PRINT_LEN)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{} ... (truncated)", &text[..idx]),
        None => text.to_string(),
    }
}

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    assistant: Assistant,
    thread_id: ThreadId,
    printer: MessagePrinter,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config, thread_id: impl Into<ThreadId>) -> Result<Self> {
        Ok(Self::with_assistant(Assistant::with_config(config)?, thread_id))
    }

    pub fn with_assistant(assistant: Assistant, thread_id: impl Into<ThreadId>) -> Self {
        Self {
            assistant,
            thread_id: thread_id.into(),
            printer: MessagePrinter::new(),
        }
    }

    /// Run a single prompt and print the outcome
    pub async fn run_once(&mut self, prompt: &str) -> Result<()> {
        self.assistant.initialize().await?;
        self.printer.prime(&self.assistant.state(&self.thread_id).await?);

        let report = self.assistant.process(&self.thread_id, prompt).await?;
        self.show(&report);
        if report.outcome.is_suspended() {
            println!(
                "\nThread '{}' is waiting for confirmation. Run again without --prompt to approve or deny.",
                self.thread_id
            );
        }
        Ok(())
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        print!("Initializing...");
        io::stdout().flush()?;

        match self.assistant.initialize().await {
            Ok(()) => println!(" Ready!\n"),
            Err(e) => {
                println!("\n\nInitialization Error: {}\n", e);
                return Ok(());
            }
        }

        self.switch_thread(self.thread_id.clone()).await?;

        loop {
            let Some(input) = read_line("You: ")? else {
                println!("\nGoodbye!");
                break;
            };

            match handle_command(&input, &self.assistant, &self.thread_id).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Handled(output)) => println!("{}\n", output),
                Ok(CommandResult::SwitchThread(thread_id)) => self.switch_thread(thread_id).await?,
                Ok(CommandResult::None) => continue,
                Ok(CommandResult::Continue(input)) => {
                    let result = self.assistant.process(&self.thread_id, &input).await;
                    self.handle_result(result).await?;
                }
                Err(e) => eprintln!("Command error: {}\n", e),
            }
        }

        Ok(())
    }

    async fn switch_thread(&mut self, thread_id: ThreadId) -> Result<()> {
        self.thread_id = thread_id;
        self.printer = MessagePrinter::new();
        let state = self.assistant.state(&self.thread_id).await?;
        self.printer.prime(&state);

        println!("Thread: {} ({} messages)", self.thread_id, state.messages.len());
        println!("Currently in: {}\n", state.active_agent());

        if let Some(pending) = state.pending {
            println!("Pending action:");
            for call in &pending.calls {
                println!("  {} {}", call.name, call.arguments);
            }
            self.confirm().await?;
        }
        Ok(())
    }

    /// Print a turn and keep asking for approval while it stays suspended
    async fn handle_result(&mut self, result: Result<TurnReport>) -> Result<()> {
        match result {
            Ok(report) => {
                self.show(&report);
                if report.outcome.is_suspended() {
                    self.confirm().await?;
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => eprintln!("\nError: {}\n", e),
        }
        Ok(())
    }

    async fn confirm(&mut self) -> Result<()> {
        loop {
            let Some(answer) = read_line(&format!("{}\n", APPROVAL_PROMPT))? else {
                return Ok(());
            };
            let report = match self
                .assistant
                .resume(&self.thread_id, Decision::from_input(&answer))
                .await
            {
                Ok(report) => report,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    eprintln!("\nError: {}\n", e);
                    return Ok(());
                }
            };
            self.show(&report);
            if !report.outcome.is_suspended() {
                return Ok(());
            }
        }
    }

    fn show(&mut self, report: &TurnReport) {
        for line in self.printer.render(report) {
            println!("{}", line);
        }
        println!();
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.assistant.config();

        println!(
            r#"
╔═══════════════════════════════════════════════════════════╗
║                                                           ║
║   Leadflow                                                ║
║   Automotive lead assistant                               ║
║                                                           ║
╚═══════════════════════════════════════════════════════════╝
"#
        );
        println!("Ollama:     {}", config.ollama_url());
        println!("Models:");
        println!("  Primary:    {}", config.models.primary);
        println!("  Specialist: {}", config.models.specialist);
        println!();
        println!("Commands: /help, /status, /history, /threads, /new, /exit");
        println!("───────────────────────────────────────────────────────────────");
    }
}

/// Prompt and read one trimmed line; `None` on EOF
fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolCall;

    fn report(agent: AgentId, messages: Vec<Message>, outcome: TurnOutcome) -> TurnReport {
        TurnReport {
            thread_id: "1".into(),
            outcome,
            active_agent: agent,
            dialog_stack: Vec::new(),
            new_messages: messages,
            steps: 1,
        }
    }

    #[test]
    fn test_messages_printed_once() {
        let mut printer = MessagePrinter::new();
        let hello = Message::assistant("hello");
        let done = TurnOutcome::Completed { reply: "hello".into() };

        let first = printer.render(&report(AgentId::Primary, vec![hello.clone()], done.clone()));
        assert_eq!(first.len(), 2);
        assert_eq!(first[0], "Currently in: primary_assistant");

        let second = printer.render(&report(AgentId::Primary, vec![hello], done));
        assert!(second.is_empty());
    }

    #[test]
    fn test_agent_change_announced() {
        let mut printer = MessagePrinter::new();
        let done = TurnOutcome::Completed { reply: String::new() };
        printer.render(&report(AgentId::Primary, vec![], done.clone()));
        let lines = printer.render(&report(AgentId::LeadAgent, vec![], done));
        assert_eq!(lines, vec!["Currently in: lead_agent".to_string()]);
    }

    #[test]
    fn test_pending_calls_listed() {
        let mut printer = MessagePrinter::new();
        let call = ToolCall::new("customer_lead_creation", serde_json::json!({"customer_name": "John Doe"}));
        let lines = printer.render(&report(
            AgentId::LeadAgent,
            vec![],
            TurnOutcome::AwaitingConfirmation { pending: vec![call] },
        ));
        assert!(lines.contains(&"Pending action:".to_string()));
        assert!(lines.iter().any(|l| l.contains("customer_lead_creation") && l.contains("John Doe")));
    }

    #[test]
    fn test_long_messages_truncated() {
        let long = Message::user("x".repeat(3000));
        let rendered = render_message(&long);
        assert!(rendered.ends_with(" ... (truncated)"));
        assert_eq!(rendered.chars().count(), MAX_PRINT_LEN + " ... (truncated)".len());
    }
}
