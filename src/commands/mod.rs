/*!
Command handlers for the CLI

This module provides the handlers invoked by the CLI entrypoint:

- `chat`    - Interactive chat REPL
- `ask`     - Send one message and print the answer
- `summary` - Fetch the combined market and moon-phase summary
- `tools`   - List the tools of both backends
- `moon`    - Show the current moon phase
- `watch`   - Run the periodic summary refresh until interrupted
- `history` - Show or clear the saved transcript
*/

use crate::config::Config;
use crate::domain::{ChatItem, ChatPayload, ChatRole, ToolItem};
use crate::error::Result;
use crate::render::print_item;
use crate::repository::{ChatRepository, Repository};
use crate::session::{ChatEvent, ChatSession};
use crate::usecases::{GetSummary, LoadTools};
use std::sync::Arc;

// Special commands parser for the REPL
pub mod special_commands;

// Transcript inspection
pub mod history;

fn build_repository(config: &Config) -> Result<Arc<dyn ChatRepository>> {
    let repository: Arc<dyn ChatRepository> = Arc::new(Repository::from_config(config)?);
    Ok(repository)
}

/// Print everything except the echo of the user's own message
fn print_answers(items: &[ChatItem]) {
    for item in items.iter().filter(|item| item.role != ChatRole::User) {
        print_item(item);
    }
}

fn print_tool_list(tools: &[ToolItem]) {
    use colored::Colorize;

    if tools.is_empty() {
        println!("{}", "No tools available.".yellow());
        return;
    }
    for (index, tool) in tools.iter().enumerate() {
        println!(
            "{:>3}. {} [{}]",
            index + 1,
            tool.title.bold(),
            tool.source.to_string().cyan()
        );
        if !tool.description.is_empty() {
            println!("     {}", tool.description);
        }
        println!("     e.g. {}", tool.sample_query.dimmed());
    }
    println!();
}

// Chat command handler
pub mod chat {
    //! Interactive chat mode handler.
    //!
    //! Restores the saved transcript, then runs a readline loop. Plain text
    //! is routed to a backend through the session; `/` commands are handled
    //! locally. When the periodic refresh runs, a background task appends
    //! each published batch to the session and prints it.

    use super::*;
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use rustyline::error::ReadlineError;
    use rustyline::DefaultEditor;
    use tokio::sync::Mutex;
    use tokio::task::JoinHandle;
    use tokio_stream::wrappers::BroadcastStream;
    use tokio_stream::StreamExt;

    const RESTORED_PREVIEW: usize = 10;

    /// Start interactive chat mode
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `watch` - Start the periodic summary refresh immediately
    ///
    /// # Examples
    ///
    /// ```
    /// use cryptomoon::commands::chat;
    /// use cryptomoon::config::Config;
    ///
    /// // In application code:
    /// // chat::run_chat(Config::default(), false).await?;
    /// ```
    pub async fn run_chat(config: Config, watch: bool) -> Result<()> {
        tracing::info!("Starting interactive chat mode");

        let repository = build_repository(&config)?;
        let get_summary = GetSummary::new(Arc::clone(&repository));
        let session = Arc::new(Mutex::new(ChatSession::new(
            Arc::clone(&repository),
            config.refresh.interval(),
        )));

        let restored = {
            let mut session = session.lock().await;
            let restored = session.restore().await;
            let items = &session.state().items;
            for item in items.iter().skip(items.len().saturating_sub(RESTORED_PREVIEW)) {
                print_item(item);
            }
            restored
        };

        let observer = spawn_update_observer(Arc::clone(&session)).await;

        let mut rl = DefaultEditor::new()?;

        print_welcome_banner(&config, restored);

        if watch {
            session.lock().await.on_event(ChatEvent::StartRefresh).await;
            println!("Periodic refresh started\n");
        }

        let mut prefill: Option<String> = None;

        loop {
            let prompt = "cryptomoon> ";
            let line = match prefill.take() {
                Some(initial) => rl.readline_with_initial(prompt, (initial.as_str(), "")),
                None => rl.readline(prompt),
            };

            match line {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    record_history(&mut rl, trimmed);

                    let command = match parse_special_command(trimmed) {
                        Ok(command) => command,
                        Err(e) => {
                            eprintln!("{}\n", e);
                            continue;
                        }
                    };

                    match command {
                        SpecialCommand::ShowTools => {
                            let mut session = session.lock().await;
                            session.load_tools().await;
                            session.on_event(ChatEvent::ToolsPressed).await;
                            print_tool_list(&session.state().tools);
                            session.on_event(ChatEvent::ToolsDialogDismissed).await;
                        }
                        SpecialCommand::PickTool(number) => {
                            let mut session = session.lock().await;
                            if session.state().tools.is_empty() {
                                session.load_tools().await;
                            }
                            match session.state().tools.get(number - 1).cloned() {
                                Some(tool) => {
                                    session.on_event(ChatEvent::ToolPicked(tool)).await;
                                    prefill = Some(session.state().input.clone());
                                }
                                None => eprintln!(
                                    "No tool #{} ({} available)\n",
                                    number,
                                    session.state().tools.len()
                                ),
                            }
                        }
                        SpecialCommand::Summary => match get_summary.execute().await {
                            Ok(items) => {
                                session.lock().await.append_items(items.clone()).await;
                                print_answers(&items);
                            }
                            Err(e) => eprintln!("Error: {}\n", e),
                        },
                        SpecialCommand::Moon => match repository.current_moon_phase().await {
                            Ok(moon_phase) => {
                                let item = ChatItem::assistant(ChatPayload::MoonPhase(moon_phase));
                                session.lock().await.append_items(vec![item.clone()]).await;
                                print_item(&item);
                            }
                            Err(e) => eprintln!("Error: {}\n", e),
                        },
                        SpecialCommand::StartWatch => {
                            session.lock().await.on_event(ChatEvent::StartRefresh).await;
                            println!(
                                "Periodic refresh started (every {}s)\n",
                                config.refresh.interval_seconds
                            );
                        }
                        SpecialCommand::StopWatch => {
                            session.lock().await.on_event(ChatEvent::StopRefresh).await;
                            println!("Periodic refresh stopped\n");
                        }
                        SpecialCommand::ShowStatus => {
                            let session = session.lock().await;
                            print_status_display(&config, &session);
                        }
                        SpecialCommand::Clear => {
                            let mut session = session.lock().await;
                            match session.clear().await {
                                Ok(()) => {
                                    print!("\x1B[2J\x1B[1;1H");
                                    println!("Transcript cleared\n");
                                }
                                Err(e) => eprintln!("Failed to clear transcript: {}\n", e),
                            }
                        }
                        SpecialCommand::Help => print_help(),
                        SpecialCommand::Exit => break,
                        SpecialCommand::None => {
                            let mut session = session.lock().await;
                            session
                                .on_event(ChatEvent::InputChanged(trimmed.to_string()))
                                .await;
                            let appended = session.on_event(ChatEvent::SendPressed).await;
                            print_answers(&appended);
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        observer.abort();
        session.lock().await.on_event(ChatEvent::StopRefresh).await;

        println!("Goodbye!");
        Ok(())
    }

    /// Append and print every batch the refresh loop publishes
    async fn spawn_update_observer(session: Arc<Mutex<ChatSession>>) -> JoinHandle<()> {
        let updates = session.lock().await.subscribe_updates();
        tokio::spawn(async move {
            let mut stream = BroadcastStream::new(updates);
            while let Some(batch) = stream.next().await {
                match batch {
                    Ok(items) => {
                        println!();
                        print_answers(&items);
                        session.lock().await.append_items(items).await;
                    }
                    Err(e) => tracing::warn!("Refresh updates lagged: {}", e),
                }
            }
        })
    }

    /// Display welcome banner at the start of interactive chat mode
    /// Add a line to the editor history; failures are logged and ignored
    fn record_history(rl: &mut DefaultEditor, line: &str) {
        match rl.add_history_entry(line) {
            Ok(_) => {}
            Err(e) => tracing::warn!("Failed to record input history: {}", e),
        }
    }

    fn print_welcome_banner(config: &Config, restored: usize) {
        use colored::Colorize;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║           Cryptomoon Interactive Chat - Welcome!             ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Crypto: {}", config.backends.crypto.base_url.cyan());
        println!("Moon:   {}", config.backends.moon.base_url.cyan());
        if restored > 0 {
            println!("Restored {} messages from the previous session", restored);
        }
        println!("\nType '/help' for available commands, 'exit' to quit\n");
    }

    /// Display session status for the '/status' command
    fn print_status_display(config: &Config, session: &ChatSession) {
        use colored::Colorize;

        let state = session.state();
        let refresh = if state.is_refresh_running {
            "running".green()
        } else {
            "stopped".yellow()
        };

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Cryptomoon Session Status                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");
        println!("Crypto Backend:    {}", config.backends.crypto.base_url);
        println!("Moon Backend:      {}", config.backends.moon.base_url);
        println!("Locale:            {} ({})", config.chat.locale, config.chat.timezone);
        match config.cache.resolve_dir() {
            Ok(dir) => println!("Cache Directory:   {}", dir.display()),
            Err(e) => println!("Cache Directory:   {}", e.to_string().red()),
        }
        println!("Conversation Size: {} messages", state.items.len());
        println!("Loaded Tools:      {}", state.tools.len());
        println!(
            "Periodic Refresh:  {} (every {}s)",
            refresh, config.refresh.interval_seconds
        );
        if let Some(error) = &state.error {
            println!("Last Error:        {}", error.red());
        }
        println!();
    }

}

// One-shot message handler
pub mod ask {
    use super::*;
    use crate::error::CryptomoonError;

    /// Send a single message, print the answer and record both in the transcript
    pub async fn run_ask(config: Config, message: String) -> Result<()> {
        let message = message.trim().to_string();
        if message.is_empty() {
            return Err(CryptomoonError::Config("Message must not be empty".to_string()).into());
        }

        let repository = build_repository(&config)?;
        let mut session = ChatSession::new(repository, config.refresh.interval());
        session.restore().await;

        session.on_event(ChatEvent::InputChanged(message)).await;
        let appended = session.on_event(ChatEvent::SendPressed).await;
        print_answers(&appended);

        match &session.state().error {
            Some(error) => Err(CryptomoonError::Network(error.clone()).into()),
            None => Ok(()),
        }
    }
}

// Combined summary handler
pub mod summary {
    use super::*;

    /// Fetch and print the combined summary
    pub async fn run_summary(config: Config) -> Result<()> {
        let repository = build_repository(&config)?;
        let items = GetSummary::new(repository).execute().await?;
        print_answers(&items);
        Ok(())
    }
}

// Tool listing handler
pub mod tools {
    use super::*;
    use colored::Colorize;
    use prettytable::{format, Table};

    /// List tools from both backends as a table or JSON
    pub async fn list_tools(config: Config, json: bool) -> Result<()> {
        let repository = build_repository(&config)?;
        let tools = LoadTools::new(repository).execute().await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&tools)?);
            return Ok(());
        }

        if tools.is_empty() {
            println!("{}", "No tools available.".yellow());
            return Ok(());
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.add_row(prettytable::row![
            "#".bold(),
            "Source".bold(),
            "Title".bold(),
            "Sample Query".bold()
        ]);
        for (index, tool) in tools.iter().enumerate() {
            table.add_row(prettytable::row![
                index + 1,
                tool.source.to_string().cyan(),
                tool.title,
                tool.sample_query
            ]);
        }

        println!("\nAvailable Tools:");
        table.printstd();
        println!();
        Ok(())
    }
}

// Moon phase handler
pub mod moon {
    use super::*;

    /// Print the current moon phase, served from the daily cache when fresh
    pub async fn show_moon_phase(config: Config) -> Result<()> {
        let repository = build_repository(&config)?;
        let moon_phase = repository.current_moon_phase().await?;
        print_item(&ChatItem::assistant(ChatPayload::MoonPhase(moon_phase)));
        Ok(())
    }
}

// Periodic refresh handler
pub mod watch {
    use super::*;
    use crate::config::RefreshConfig;
    use crate::refresh::RefreshService;
    use colored::Colorize;
    use tokio_stream::wrappers::BroadcastStream;
    use tokio_stream::StreamExt;

    /// Print a fresh summary every interval until Ctrl-C
    ///
    /// `interval_override` takes precedence over `refresh.interval_seconds`
    /// and is held to the same bounds.
    pub async fn run_watch(config: Config, interval_override: Option<u64>) -> Result<()> {
        let refresh = match interval_override {
            Some(interval_seconds) => RefreshConfig { interval_seconds },
            None => config.refresh.clone(),
        };
        refresh.validate()?;
        let interval = refresh.interval();

        let repository = build_repository(&config)?;
        let mut service = RefreshService::new(GetSummary::new(repository), interval);
        let mut updates = BroadcastStream::new(service.subscribe());

        println!(
            "Refreshing every {}s, press {} to stop\n",
            interval.as_secs(),
            "Ctrl-C".bold()
        );
        service.start();

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, stopping refresh");
                    break;
                }
                batch = updates.next() => match batch {
                    Some(Ok(items)) => {
                        println!(
                            "{}",
                            format!("── {} ──", chrono::Local::now().format("%H:%M:%S")).dimmed()
                        );
                        print_answers(&items);
                    }
                    Some(Err(e)) => tracing::warn!("Refresh updates lagged: {}", e),
                    None => break,
                },
            }
        }

        service.stop();
        Ok(())
    }
}
