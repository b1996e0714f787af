use clap::{Parser, Subcommand};

/// Command-line dashboard for the todo task service
#[derive(Parser, Debug, Clone)]
#[command(name = "taskdeck", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,

    /// Base URL of the task service
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Env var holding the bearer token
    #[arg(long, global = true)]
    pub token_env: Option<String>,

    /// Env var holding the user id (used by chat)
    #[arg(long, global = true)]
    pub user_env: Option<String>,

    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// List tasks grouped into active and completed
    List,

    /// Show a single task
    Show { id: i64 },

    /// Create a task
    Add {
        title: String,

        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },

    /// Update fields of an existing task
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// New status (pending, completed)
        #[arg(long)]
        status: Option<String>,
    },

    /// Flip a task between pending and completed
    Toggle { id: i64 },

    /// Delete a task
    Rm { id: i64 },

    /// Send one message to the assistant
    Chat {
        message: String,

        /// Continue an existing conversation
        #[arg(long)]
        conversation: Option<i64>,
    },

    /// Interactive dashboard session
    Dashboard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let cli = Cli::parse_from(["taskdeck", "list"]);
        assert!(matches!(cli.command, CliCommand::List));
        assert!(cli.api_url.is_none());
    }

    #[test]
    fn test_parse_add_with_description() {
        let cli = Cli::parse_from(["taskdeck", "add", "buy milk", "--description", "2%"]);
        match cli.command {
            CliCommand::Add { title, description } => {
                assert_eq!(title, "buy milk");
                assert_eq!(description.as_deref(), Some("2%"));
            }
            _ => panic!("expected Add subcommand"),
        }
    }

    #[test]
    fn test_parse_add_without_description() {
        let cli = Cli::parse_from(["taskdeck", "add", "buy milk"]);
        match cli.command {
            CliCommand::Add { title, description } => {
                assert_eq!(title, "buy milk");
                assert!(description.is_none());
            }
            _ => panic!("expected Add subcommand"),
        }
    }

    #[test]
    fn test_parse_edit_partial_fields() {
        let cli = Cli::parse_from(["taskdeck", "edit", "3", "--status", "completed"]);
        match cli.command {
            CliCommand::Edit {
                id,
                title,
                description,
                status,
            } => {
                assert_eq!(id, 3);
                assert!(title.is_none());
                assert!(description.is_none());
                assert_eq!(status.as_deref(), Some("completed"));
            }
            _ => panic!("expected Edit subcommand"),
        }
    }

    #[test]
    fn test_parse_toggle_and_rm() {
        let cli = Cli::parse_from(["taskdeck", "toggle", "7"]);
        assert!(matches!(cli.command, CliCommand::Toggle { id: 7 }));

        let cli = Cli::parse_from(["taskdeck", "rm", "7"]);
        assert!(matches!(cli.command, CliCommand::Rm { id: 7 }));
    }

    #[test]
    fn test_parse_chat_with_conversation() {
        let cli = Cli::parse_from(["taskdeck", "chat", "list my tasks", "--conversation", "5"]);
        match cli.command {
            CliCommand::Chat {
                message,
                conversation,
            } => {
                assert_eq!(message, "list my tasks");
                assert_eq!(conversation, Some(5));
            }
            _ => panic!("expected Chat subcommand"),
        }
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "taskdeck",
            "list",
            "--api-url",
            "http://localhost:9000",
            "--token-env",
            "MY_TOKEN",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(cli.token_env.as_deref(), Some("MY_TOKEN"));
    }

    #[test]
    fn test_parse_dashboard() {
        let cli = Cli::parse_from(["taskdeck", "dashboard"]);
        assert!(matches!(cli.command, CliCommand::Dashboard));
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!(Cli::try_parse_from(["taskdeck", "show", "abc"]).is_err());
    }
}
