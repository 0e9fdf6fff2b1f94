//! Interactive chat session
//!
//! A plain-text consumer of the controller's exposed surface: it submits
//! turns, renders whatever the timeline gained since the last render, and
//! maps slash commands onto the controller's operations. All conversation
//! state lives in the controller; this module only tracks how far it has
//! rendered.

use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::api::ModelChoice;
use crate::controller::{ConversationController, ConversationSnapshot};
use crate::parser::{self, ParsedReply};
use crate::timeline::Message;

/// What a slash command asks the loop to do next
enum SlashResult {
    Continue,
    Quit,
}

/// Interactive shopping chat session
pub struct ChatSession {
    controller: Arc<ConversationController>,
    rendered: usize,
}

impl ChatSession {
    pub fn new(controller: Arc<ConversationController>) -> Self {
        Self {
            controller,
            rendered: 0,
        }
    }

    /// Run the chat main loop
    pub async fn run(&mut self, initial_query: Option<String>) -> Result<()> {
        self.print_welcome();

        // If an opening query was provided, process it first
        if let Some(query) = initial_query {
            println!("{} {}", ">".bright_green(), query);
            self.process_input(&query).await;
        }

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_input(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Print welcome message
    fn print_welcome(&self) {
        println!();
        println!("{}", "ShopAgent".bright_cyan().bold());
        println!("Tell me what you want to buy, for example:");
        for suggestion in [
            "Find laptops under $1500",
            "Recommend espresso machine",
            "Find running shoes in white",
        ] {
            println!("  {}", suggestion.dimmed());
        }
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Submit a turn and render what it produced
    async fn process_input(&mut self, input: &str) {
        if let Err(e) = self.controller.submit_turn(input).await {
            tracing::warn!(error = %e, "process_input: turn failed");
        }
        self.render_new_entries().await;
    }

    /// Handle slash commands
    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");

        match cmd {
            "/help" | "/h" => {
                self.print_help();
                SlashResult::Continue
            }
            "/quit" | "/q" | "/exit" => SlashResult::Quit,
            "/new" | "/n" => {
                self.controller.reset_conversation().await;
                self.rendered = 0;
                println!("{}", "Started a new conversation.".dimmed());
                SlashResult::Continue
            }
            "/model" | "/m" => {
                self.switch_model(parts.get(1).copied()).await;
                SlashResult::Continue
            }
            "/prefs" | "/p" => {
                self.print_preferences().await;
                SlashResult::Continue
            }
            "/pick" => {
                if let (Some(category), true) = (parts.get(1), parts.len() > 2) {
                    let answer = parts[2..].join(" ");
                    self.controller.answer_clarification(*category, answer.clone()).await;
                    println!("{} {}: {}", "Picked".dimmed(), category, answer);
                } else {
                    println!("Usage: /pick <category> <answer>");
                }
                SlashResult::Continue
            }
            "/drop" => {
                if let Some(category) = parts.get(1) {
                    self.controller.remove_preference(category).await;
                    println!("{} {}", "Dropped".dimmed(), category);
                } else {
                    println!("Usage: /drop <category>");
                }
                SlashResult::Continue
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                SlashResult::Continue
            }
        }
    }

    /// Print help message
    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:24} Show this help", "/help".yellow());
        println!("  {:24} Exit the chat", "/quit".yellow());
        println!("  {:24} Start a new conversation", "/new".yellow());
        println!("  {:24} Switch model (perplexity, openai, hybrid)", "/model <name>".yellow());
        println!("  {:24} Show collected preferences", "/prefs".yellow());
        println!("  {:24} Answer a clarifying question", "/pick <category> <answer>".yellow());
        println!("  {:24} Remove a preference", "/drop <category>".yellow());
        println!();
        println!("Anything else is sent to the shopping assistant.");
        println!();
    }

    /// Switch the backing model
    async fn switch_model(&mut self, name: Option<&str>) {
        let Some(name) = name else {
            let snapshot = self.controller.snapshot().await;
            println!("Current model: {}", snapshot.model.display_name());
            return;
        };

        let model: ModelChoice = match name.parse() {
            Ok(model) => model,
            Err(e) => {
                println!("{} {}", "?".yellow(), e);
                return;
            }
        };

        if self.controller.switch_model(model).await.is_ok() {
            println!("{} {}", "Model:".dimmed(), model.display_name());
        }
        self.render_new_entries().await;
    }

    /// Print both preference views
    async fn print_preferences(&self) {
        let snapshot = self.controller.snapshot().await;
        if snapshot.persisted_preferences.is_empty() {
            println!("{}", "No preferences collected.".dimmed());
            return;
        }

        println!();
        println!("{}", "Preferences:".bright_cyan());
        for (category, answer) in &snapshot.persisted_preferences {
            let pending = snapshot.displayed_preferences.contains_key(category);
            let marker = if pending { "*" } else { " " };
            println!("  {}{}: {}", marker, category, answer);
        }
        if !snapshot.displayed_preferences.is_empty() {
            println!("{}", "  (* not yet sent)".dimmed());
        }
        println!();
    }

    /// Render timeline entries appended since the last render, then any
    /// process-level error
    async fn render_new_entries(&mut self) {
        let snapshot = self.controller.snapshot().await;

        for entry in snapshot.entries.iter().skip(self.rendered) {
            self.render_message(&entry.message);
        }
        self.rendered = snapshot.entries.len();

        if let Some(error) = &snapshot.last_error {
            println!("{}", error.red());
        }
    }

    /// Render one timeline message as plain text
    fn render_message(&self, message: &Message) {
        match message {
            Message::User { .. } | Message::Loading { .. } => {
                // The user already sees what they typed; loading entries are
                // gone by the time a turn settles
            }
            Message::Assistant { text } => {
                println!("{} {}", "ai:".bright_blue(), text);
            }
            Message::Overview { raw } => {
                let overview = match parser::parse_reply(raw) {
                    Ok(ParsedReply::Recommendations {
                        overview: Some(overview),
                        ..
                    }) => overview,
                    Ok(_) => "No overview available for this recommendation.".to_string(),
                    Err(_) => "Unable to parse overview data. Please try again.".to_string(),
                };
                println!("{} {}", "ai:".bright_blue(), overview);
            }
            Message::Clarification { questions } => {
                println!();
                for (category, question) in questions {
                    println!("  {}: {}", category.bright_white().bold(), question.question);
                    for option in &question.options {
                        println!("    - {}", option);
                    }
                }
                println!(
                    "{}",
                    "Answer with /pick <category> <answer>, then press enter to submit.".dimmed()
                );
                println!();
            }
            Message::Products {
                recommendations,
                details,
            } => {
                println!();
                for (index, product) in recommendations.iter().enumerate() {
                    let price = product.price_label().unwrap_or_default();
                    println!("  {}. {} {}", index + 1, product.name.bright_white().bold(), price.green());
                    if !product.description.is_empty() {
                        println!("     {}", product.description);
                    }
                    for pro in &product.pros {
                        println!("     {} {}", "+".green(), pro);
                    }
                    for con in &product.cons {
                        println!("     {} {}", "-".red(), con);
                    }
                    match details.get(index) {
                        Some(detail) if !detail.buy_links.is_empty() => {
                            for link in &detail.buy_links {
                                if let Some(url) = link.get("url").and_then(|u| u.as_str()) {
                                    println!("     {} {}", "buy:".dimmed(), url);
                                }
                            }
                        }
                        _ => println!("     {}", "no details available".dimmed()),
                    }
                }
                println!();
            }
        }
    }
}

/// Entry point used by the CLI: build a session and run it
pub async fn run_interactive(
    controller: Arc<ConversationController>,
    initial_query: Option<String>,
) -> Result<()> {
    ChatSession::new(controller).run(initial_query).await
}

/// One-shot mode: submit a single turn and print the resulting timeline
pub async fn run_once(controller: Arc<ConversationController>, query: &str) -> ConversationSnapshot {
    let mut session = ChatSession::new(controller.clone());
    session.process_input(query).await;
    controller.snapshot().await
}
