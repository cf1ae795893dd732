use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, Write};

use flowpilot::chat::{self, ChatClient};
use flowpilot::{agent, BrowserSession, Config, ProcessStore, Recorder, ReplayConfig, Replayer, TaskMatcher};

#[derive(Parser)]
#[command(name = "flowpilot")]
#[command(version = "0.1.0")]
#[command(about = "Record, persist and replay browser workflows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new process: interact in the browser, close it to finish
    Record {
        /// Name to store the process under (e.g. "login email")
        name: String,
    },
    /// Match a task description against stored processes and replay the best fit
    Run {
        /// Free-text task description
        task: String,

        /// Replay a match without asking for confirmation
        #[arg(long, short = 'y', default_value = "false")]
        yes: bool,
    },
    /// List stored processes
    List,
    /// Chat with the configured model
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::load();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Record { name }) => record_process(&config, &name).await?,
        Some(Commands::Run { task, yes }) => run_task(&config, &task, yes).await?,
        Some(Commands::List) => list_processes(&config),
        Some(Commands::Chat) => {
            let client = ChatClient::from_config(&config)?;
            chat::run_chat(&client).await?;
        }
        None => run_menu(&config).await?,
    }

    Ok(())
}

/// Interactive control surface, the default when no subcommand is given.
/// Errors from individual operations are reported and the menu comes back.
async fn run_menu(config: &Config) -> Result<()> {
    println!("\n{}", "=== flowpilot ===".bold().green());

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        println!("\n1. Record a new process");
        println!("2. Execute a task");
        println!("3. Chat");
        println!("4. Quit");
        print!("{} ", "flowpilot>".blue().bold());
        io::stdout().flush().ok();

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }

        match input.trim() {
            "1" => {
                let name = prompt("Process name (e.g. login email): ")?;
                if name.is_empty() {
                    println!("{} A process needs a name.", "⚠".yellow());
                    continue;
                }
                if let Err(e) = record_process(config, &name).await {
                    println!("{} Recording failed: {}", "❌".red(), e);
                }
            }
            "2" => {
                let task = prompt("Describe the task (e.g. login email): ")?;
                if task.is_empty() {
                    println!("{} Nothing to do.", "⚠".yellow());
                    continue;
                }
                if let Err(e) = run_task(config, &task, false).await {
                    println!("{} Task failed: {}", "❌".red(), e);
                }
            }
            "3" => match ChatClient::from_config(config) {
                Ok(client) => {
                    if let Err(e) = chat::run_chat(&client).await {
                        println!("{} Chat failed: {}", "❌".red(), e);
                    }
                }
                Err(e) => println!("{} {}", "❌".red(), e),
            },
            "4" | "q" | "quit" | "exit" => break,
            "" => continue,
            other => println!("{} Unknown choice: {}", "⚠".yellow(), other),
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn record_process(config: &Config, name: &str) -> Result<()> {
    let mut store = ProcessStore::load(&config.processes_file);

    // session acquisition is the one fatal failure in this flow
    let session = BrowserSession::launch(&config.session_config()).await?;
    let recorder = Recorder::new(config.recorder_config());
    let actions = recorder.record(session).await;

    if actions.is_empty() {
        println!("{} Nothing was captured, not saving.", "⚠".yellow());
        return Ok(());
    }

    match store.save(name, actions) {
        Ok(()) => println!("{} Process '{}' saved.", "✅".green().bold(), name),
        Err(e) => println!(
            "{} Could not persist '{}' (kept in memory, retry later): {}",
            "❌".red(),
            name,
            e
        ),
    }
    Ok(())
}

async fn run_task(config: &Config, task: &str, assume_yes: bool) -> Result<()> {
    let store = ProcessStore::load(&config.processes_file);
    let matcher = TaskMatcher::new();

    let Some((name, actions)) = matcher.find(task, store.processes()) else {
        return agent::run_fallback(task, config).await;
    };

    println!("{} Matched process '{}'.", "🔍".blue(), name.cyan());
    if !assume_yes && !confirm("Replay it? (y/n): ")? {
        return agent::run_fallback(task, config).await;
    }

    let session = BrowserSession::launch(&config.session_config()).await?;
    let replayer = Replayer::new(ReplayConfig::default());
    replayer.replay(session, actions).await;
    println!("{} Task '{}' finished.", "✅".green().bold(), task);
    Ok(())
}

fn list_processes(config: &Config) {
    let store = ProcessStore::load(&config.processes_file);
    if store.is_empty() {
        println!("{} No processes recorded yet.", "ℹ".blue());
        return;
    }
    for (name, actions) in store.processes() {
        println!("  {} {} ({} actions)", "•".green(), name.cyan(), actions.len());
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush().ok();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn confirm(label: &str) -> Result<bool> {
    let answer = prompt(label)?;
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
