use std::io::{self, Write};

use crate::tasks::{Task, TaskStatus};

/// Display partition of the task cache: pending and completed groups,
/// server order preserved within each. Purely derived: recomputed from the
/// cache on demand, never stored, so it cannot go stale relative to it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBoard {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
}

impl TaskBoard {
    pub fn partition(tasks: &[Task]) -> Self {
        let mut pending = Vec::new();
        let mut completed = Vec::new();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => pending.push(task.clone()),
                TaskStatus::Completed => completed.push(task.clone()),
            }
        }
        Self { pending, completed }
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }

    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        if self.is_empty() {
            writeln!(out, "No tasks yet.")?;
            return Ok(());
        }

        if !self.pending.is_empty() {
            writeln!(out, "Active Tasks")?;
            for task in &self.pending {
                render_task(out, task)?;
            }
        }

        if !self.completed.is_empty() {
            if !self.pending.is_empty() {
                writeln!(out)?;
            }
            writeln!(out, "Completed")?;
            for task in &self.completed {
                render_task(out, task)?;
            }
        }

        Ok(())
    }
}

pub fn render_task(out: &mut impl Write, task: &Task) -> io::Result<()> {
    let mark = match task.status {
        TaskStatus::Pending => ' ',
        TaskStatus::Completed => 'x',
    };
    writeln!(out, "  [{mark}] {:>3}  {}", task.id, task.title)?;
    if let Some(ref description) = task.description
        && !description.is_empty()
    {
        writeln!(out, "           {description}")?;
    }
    Ok(())
}
