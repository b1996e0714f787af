use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use taskdeck::board::{TaskBoard, render_task};
use taskdeck::chat::ChatClient;
use taskdeck::cli::{Cli, CliCommand};
use taskdeck::config::Config;
use taskdeck::dashboard::Dashboard;
use taskdeck::error::{Error, Result};
use taskdeck::gateway::Gateway;
use taskdeck::refresh::{RefreshCoordinator, TaskFeed, mutate_and_refresh};
use taskdeck::session::{EnvSessionProvider, SessionProvider};
use taskdeck::tasks::{NewTask, TaskClient, TaskPatch, TaskStatus};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let config = match Config::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, &config) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: &Config) -> Result<()> {
    let provider = Arc::new(EnvSessionProvider::new(config));
    let gateway = Arc::new(Gateway::new(config, provider.clone()));
    let tasks = TaskClient::new(gateway.clone());
    let chat = ChatClient::new(gateway);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        CliCommand::List => {
            let fetched = tasks.list()?;
            TaskBoard::partition(&fetched).render(&mut out)?;
        }
        CliCommand::Show { id } => {
            let task = tasks.get(id)?;
            render_task(&mut out, &task)?;
        }
        CliCommand::Add {
            ref title,
            ref description,
        } => {
            let new_task = NewTask {
                title: title.clone(),
                description: description.clone(),
            };
            let created = run_mutation(&tasks, &mut out, || tasks.create(&new_task))?;
            writeln!(out, "created task {}", created.id)?;
        }
        CliCommand::Edit {
            id,
            ref title,
            ref description,
            ref status,
        } => {
            let status = match status {
                Some(s) => Some(TaskStatus::parse(s).ok_or_else(|| {
                    Error::ConfigValidation(format!(
                        "unknown status: {s} (expected: pending, completed)"
                    ))
                })?),
                None => None,
            };
            let patch = TaskPatch {
                title: title.clone(),
                description: description.clone(),
                status,
            };
            if patch.is_empty() {
                return Err(Error::ConfigValidation(
                    "edit requires at least one of --title, --description, --status".to_string(),
                ));
            }
            run_mutation(&tasks, &mut out, || tasks.update(id, &patch))?;
        }
        CliCommand::Toggle { id } => {
            let toggled = run_mutation(&tasks, &mut out, || tasks.toggle(id))?;
            writeln!(out, "task {} is now {:?}", toggled.id, toggled.status)?;
        }
        CliCommand::Rm { id } => {
            run_mutation(&tasks, &mut out, || tasks.delete(id))?;
            writeln!(out, "deleted task {id}")?;
        }
        CliCommand::Chat {
            ref message,
            conversation,
        } => {
            let session = provider.current_session().ok_or_else(|| {
                Error::Session("chat requires a signed-in session".to_string())
            })?;
            let reply = chat.send(&session.user_id, message, conversation)?;
            writeln!(out, "{}", reply.content)?;
            if !reply.tools_used.is_empty() {
                writeln!(out, "(used: {})", reply.tools_used.join(", "))?;
            }
            writeln!(out, "conversation: {}", reply.conversation_id)?;
        }
        CliCommand::Dashboard => {
            info!("starting dashboard session");
            let mut dashboard = Dashboard::open(provider.as_ref(), tasks, chat)?;
            let stdin = std::io::stdin();
            dashboard.run(stdin.lock(), &mut out)?;
        }
    }

    Ok(())
}

/// One-shot mutation cycle: run it, bump the revision, refetch, render the
/// refreshed board.
fn run_mutation<T>(
    tasks: &TaskClient,
    out: &mut impl Write,
    mutation: impl FnOnce() -> Result<T>,
) -> Result<T> {
    let coordinator = RefreshCoordinator::new();
    let mut feed = TaskFeed::new();
    let result = mutate_and_refresh(&coordinator, &mut feed, tasks, mutation)?;
    if let Some(error) = feed.last_error() {
        writeln!(out, "could not refresh tasks: {error}")?;
    } else {
        TaskBoard::partition(feed.tasks()).render(out)?;
    }
    Ok(result)
}
