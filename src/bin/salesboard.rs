//! Operator CLI for a sales pipeline record store.
//!
//! Usage:
//!
//! ```text
//! salesboard [--config PATH] [--api-url URL] [--log-level LEVEL] <command>
//! ```
//!
//! Commands:
//!
//! - `board` prints every stage column with overdue markers.
//! - `move <id> <STAGE>` moves a task to another stage.
//! - `create <title> [--stage STAGE] [--description TEXT] [--tag TAG]...`
//!   creates a task.
//! - `delete <id> [--hard]` soft-deletes a task, or removes the record
//!   with `--hard`.
//!
//! Logs go to stderr; command output goes to stdout.

use clap::{Parser, Subcommand};
use eyre::{WrapErr, bail};
use mockable::DefaultClock;
use salesboard::{
    config::{GlobalArgs, SalesboardConfig},
    pipeline::{
        adapters::{HttpGateway, RetryingGateway, TracingNotifier},
        board::{BoardView, MoveOutcome, PipelineBoard},
        domain::{StageKey, TaskId},
        ports::RecordGateway,
        services::MutationCoordinator,
    },
    telemetry,
};
use std::{
    io::{self, Write},
    sync::Arc,
};

type Board = PipelineBoard<RetryingGateway<HttpGateway>, TracingNotifier, DefaultClock>;

#[derive(Parser, Debug)]
#[command(version, about = "Sales pipeline board operator")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the board columns.
    Board,
    /// Move a task to another stage.
    Move {
        /// Task identifier.
        id: u64,
        /// Target stage key, for example `NEGOCIACION`.
        stage: String,
    },
    /// Create a task.
    Create {
        /// Task title.
        title: String,
        /// Target stage key.
        #[arg(long, default_value = StageKey::INBOX)]
        stage: String,
        /// Task description.
        #[arg(long)]
        description: Option<String>,
        /// Tag to attach; may be repeated.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Delete a task.
    Delete {
        /// Task identifier.
        id: u64,
        /// Remove the record instead of marking it deleted.
        #[arg(long)]
        hard: bool,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let config = SalesboardConfig::load(&cli.global).wrap_err("failed to load configuration")?;
    telemetry::init(&config.log_level)?;

    let http = HttpGateway::new(&config.gateway.base_url, config.gateway.timeout)?;
    let gateway = Arc::new(RetryingGateway::new(http, config.retry));
    let coordinator = MutationCoordinator::new(
        Arc::clone(&gateway),
        Arc::new(TracingNotifier),
        Arc::new(DefaultClock),
    )
    .with_resource(config.gateway.resource.clone());
    let mut board = Board::new(coordinator, config.board);
    tracing::debug!(base_url = %config.gateway.base_url, "loading board");
    board.refresh().await.wrap_err("failed to load the board")?;

    let mut out = io::stdout().lock();
    match cli.command {
        Command::Board => print_board(&mut out, &board.list_tasks_by_stage())?,
        Command::Move { id, stage } => {
            match board.move_task(TaskId::new(id), StageKey::new(stage)).await? {
                MoveOutcome::Ignored(reason) => writeln!(out, "nothing to do: {reason}")?,
                MoveOutcome::Applied(task) => {
                    writeln!(out, "moved #{} to {}", task.id(), task.stage())?;
                }
                MoveOutcome::Pending(pending) => {
                    let task = board.settle(pending).await?;
                    writeln!(out, "moved #{} to {}", task.id(), task.stage())?;
                }
            }
        }
        Command::Create {
            title,
            stage,
            description,
            tags,
        } => {
            let mut form = board.open_create(StageKey::new(stage));
            form.set_title(title);
            if let Some(text) = description {
                form.set_description(text);
            }
            for tag in &tags {
                form.add_tag(tag)?;
            }
            let created = form.submit().await?;
            writeln!(out, "created #{} in {}", created.task.id(), created.task.stage())?;
        }
        Command::Delete { id, hard } => {
            let task_id = TaskId::new(id);
            if hard {
                gateway
                    .delete(&config.gateway.resource, task_id.value())
                    .await
                    .wrap_err_with(|| format!("failed to remove task {task_id}"))?;
                writeln!(out, "removed #{task_id}")?;
            } else {
                if board.delete_task(task_id).await?.is_none() {
                    bail!("task {task_id} is not on the board");
                }
                writeln!(out, "deleted #{task_id}")?;
            }
        }
    }
    Ok(())
}

fn print_board(out: &mut impl Write, view: &BoardView) -> io::Result<()> {
    for column in &view.columns {
        writeln!(out, "{} ({}) [{}]", column.title, column.stage, column.cards.len())?;
        for card in &column.cards {
            let marker = if card.overdue { " OVERDUE" } else { "" };
            write!(out, "  #{} {}{marker}", card.id, card.title)?;
            if let Some(due) = card.due_date {
                write!(out, " due {}", due.format("%Y-%m-%d %H:%M"))?;
            }
            if card.checklist_total > 0 {
                write!(out, " [{}/{}]", card.checklist_done, card.checklist_total)?;
            }
            if !card.tags.is_empty() {
                let labels: Vec<&str> = card.tags.iter().map(|tag| tag.label.as_str()).collect();
                write!(out, " {{{}}}", labels.join(", "))?;
            }
            writeln!(out)?;
        }
    }
    if !view.unplaced.is_empty() {
        let ids: Vec<String> = view.unplaced.iter().map(ToString::to_string).collect();
        writeln!(out, "unplaced: {}", ids.join(", "))?;
    }
    Ok(())
}
