use std::io::{BufRead, Write};

use tracing::info;

use crate::board::{TaskBoard, render_task};
use crate::chat::ChatClient;
use crate::error::{Error, Result};
use crate::refresh::{RefreshCoordinator, TaskFeed, mutate_and_refresh};
use crate::session::{Session, SessionProvider};
use crate::tasks::{NewTask, TaskClient, TaskPatch, TaskStatus};

const HELP: &str = "\
commands:
  add <title> [-- <description>]   create a task
  done <id>                        toggle a task
  edit <id> <new title>            rename a task
  desc <id> <description>          set a task's description
  status <id> <pending|completed>  set a task's status
  rm <id>                          delete a task
  show <id>                        show one task
  chat <message>                   ask the assistant
  refresh                          reload the list
  retry                            retry a failed reload
  help                             show this help
  quit                             leave the dashboard";

/// Interactive dashboard session: owns the revision counter and the task
/// feed; every successful mutation bumps the counter and the feed re-syncs
/// before the board is re-rendered. Errors are printed inline and never end
/// the session.
pub struct Dashboard {
    session: Session,
    tasks: TaskClient,
    chat: ChatClient,
    coordinator: RefreshCoordinator,
    feed: TaskFeed,
    conversation_id: Option<i64>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("session", &self.session)
            .field("coordinator", &self.coordinator)
            .field("feed", &self.feed)
            .field("conversation_id", &self.conversation_id)
            .finish_non_exhaustive()
    }
}

impl Dashboard {
    /// Gate on the session: without one, the user is told to sign in
    /// instead of getting a dashboard that can only fail.
    pub fn open(
        provider: &dyn SessionProvider,
        tasks: TaskClient,
        chat: ChatClient,
    ) -> Result<Self> {
        let session = provider.current_session().ok_or_else(|| {
            Error::Session(
                "not signed in: set the token and user id env vars or write \
                 ~/.config/taskdeck/credentials.toml"
                    .to_string(),
            )
        })?;
        info!(user_id = %session.user_id, "dashboard session opened");

        Ok(Self {
            session,
            tasks,
            chat,
            coordinator: RefreshCoordinator::new(),
            feed: TaskFeed::new(),
            conversation_id: None,
        })
    }

    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> Result<()> {
        // Counter at zero triggers the first load.
        self.feed.sync(&self.coordinator, &self.tasks);
        self.render(out)?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (command, rest) = match line.split_once(char::is_whitespace) {
                Some((command, rest)) => (command, rest.trim()),
                None => (line, ""),
            };

            match command {
                "quit" | "exit" | "q" => break,
                "help" => writeln!(out, "{HELP}")?,
                _ => {
                    if let Err(e) = self.dispatch(command, rest, out) {
                        writeln!(out, "error: {e}")?;
                    }
                }
            }
        }

        Ok(())
    }

    fn dispatch(&mut self, command: &str, rest: &str, out: &mut impl Write) -> Result<()> {
        match command {
            "add" => self.cmd_add(rest, out),
            "done" | "toggle" => self.cmd_toggle(rest, out),
            "edit" => self.cmd_edit(rest, out),
            "desc" => self.cmd_desc(rest, out),
            "status" => self.cmd_status(rest, out),
            "rm" => self.cmd_rm(rest, out),
            "show" => self.cmd_show(rest, out),
            "chat" => self.cmd_chat(rest, out),
            "refresh" => {
                self.coordinator.bump();
                self.feed.sync(&self.coordinator, &self.tasks);
                self.render(out)
            }
            "retry" => {
                self.feed.retry(&self.coordinator, &self.tasks);
                self.render(out)
            }
            other => {
                writeln!(out, "unknown command: {other} (try 'help')")?;
                Ok(())
            }
        }
    }

    fn cmd_add(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        let (title, description) = match rest.split_once("--") {
            Some((title, description)) => (title.trim(), Some(description.trim().to_string())),
            None => (rest, None),
        };
        if title.is_empty() {
            writeln!(out, "usage: add <title> [-- <description>]")?;
            return Ok(());
        }

        let new_task = NewTask {
            title: title.to_string(),
            description,
        };
        let created = mutate_and_refresh(&self.coordinator, &mut self.feed, &self.tasks, || {
            self.tasks.create(&new_task)
        })?;
        writeln!(out, "created task {}", created.id)?;
        self.render(out)
    }

    fn cmd_toggle(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        let Some(id) = parse_id(rest, out, "done <id>")? else {
            return Ok(());
        };
        let toggled = mutate_and_refresh(&self.coordinator, &mut self.feed, &self.tasks, || {
            self.tasks.toggle(id)
        })?;
        writeln!(out, "task {} is now {:?}", toggled.id, toggled.status)?;
        self.render(out)
    }

    fn cmd_edit(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        let Some((id, title)) = parse_id_and_text(rest, out, "edit <id> <new title>")? else {
            return Ok(());
        };
        let patch = TaskPatch {
            title: Some(title),
            ..Default::default()
        };
        mutate_and_refresh(&self.coordinator, &mut self.feed, &self.tasks, || {
            self.tasks.update(id, &patch)
        })?;
        self.render(out)
    }

    fn cmd_desc(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        let Some((id, description)) = parse_id_and_text(rest, out, "desc <id> <description>")?
        else {
            return Ok(());
        };
        let patch = TaskPatch {
            description: Some(description),
            ..Default::default()
        };
        mutate_and_refresh(&self.coordinator, &mut self.feed, &self.tasks, || {
            self.tasks.update(id, &patch)
        })?;
        self.render(out)
    }

    fn cmd_status(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        let Some((id, status)) = parse_id_and_text(rest, out, "status <id> <pending|completed>")?
        else {
            return Ok(());
        };
        let Some(status) = TaskStatus::parse(&status) else {
            writeln!(out, "unknown status: {status} (expected: pending, completed)")?;
            return Ok(());
        };
        let patch = TaskPatch {
            status: Some(status),
            ..Default::default()
        };
        mutate_and_refresh(&self.coordinator, &mut self.feed, &self.tasks, || {
            self.tasks.update(id, &patch)
        })?;
        self.render(out)
    }

    fn cmd_rm(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        let Some(id) = parse_id(rest, out, "rm <id>")? else {
            return Ok(());
        };
        mutate_and_refresh(&self.coordinator, &mut self.feed, &self.tasks, || {
            self.tasks.delete(id)
        })?;
        writeln!(out, "deleted task {id}")?;
        self.render(out)
    }

    fn cmd_show(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        let Some(id) = parse_id(rest, out, "show <id>")? else {
            return Ok(());
        };
        let task = self.tasks.get(id)?;
        render_task(out, &task)?;
        Ok(())
    }

    fn cmd_chat(&mut self, rest: &str, out: &mut impl Write) -> Result<()> {
        if rest.is_empty() {
            writeln!(out, "usage: chat <message>")?;
            return Ok(());
        }
        let reply = self
            .chat
            .send(&self.session.user_id, rest, self.conversation_id)?;
        self.conversation_id = Some(reply.conversation_id);
        writeln!(out, "assistant: {}", reply.content)?;
        if !reply.tools_used.is_empty() {
            writeln!(out, "  (used: {})", reply.tools_used.join(", "))?;
        }
        // The assistant may have mutated tasks on our behalf.
        self.coordinator.bump();
        self.feed.sync(&self.coordinator, &self.tasks);
        self.render(out)
    }

    fn render(&self, out: &mut impl Write) -> Result<()> {
        if let Some(error) = self.feed.last_error() {
            writeln!(out, "could not refresh tasks: {error} (type 'retry')")?;
        }
        TaskBoard::partition(self.feed.tasks()).render(out)?;
        Ok(())
    }
}

fn parse_id(rest: &str, out: &mut impl Write, usage: &str) -> Result<Option<i64>> {
    match rest.parse::<i64>() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            writeln!(out, "usage: {usage}")?;
            Ok(None)
        }
    }
}

fn parse_id_and_text(
    rest: &str,
    out: &mut impl Write,
    usage: &str,
) -> Result<Option<(i64, String)>> {
    if let Some((id, text)) = rest.split_once(char::is_whitespace)
        && let Ok(id) = id.parse::<i64>()
        && !text.trim().is_empty()
    {
        return Ok(Some((id, text.trim().to_string())));
    }
    writeln!(out, "usage: {usage}")?;
    Ok(None)
}
