//! Command dispatch
//!
//! Each subcommand runs against an already-loaded [`BoardContext`] and
//! returns an [`Outcome`]; `main` decides what to print and the exit code.

use crate::cli::{Commands, FilterArgs, TaskCommand, VersionCommand};
use crate::config::BoardConfig;
use crate::render;
use anyhow::{bail, Result};
use branchboard::board::GetBoard;
use branchboard::drag::{BoardSession, Cell, DragController, DragEvent, DragOutcome};
use branchboard::task::{AddTask, GetTask, ListTasks, RemoveTask, UpdateTask};
use branchboard::version::{
    CreateVersion, DeleteVersion, ListVersions, MoveVersion, RenameVersion, SetVersionOrder,
};
use branchboard::{BoardContext, BoardError, BoardFilter, Execute, TaskId, VersionKey};
use serde::Serialize;

/// How a command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Output for stdout
    Done(String),
    /// Nothing changed; a note for stderr
    Unchanged(String),
    /// The change was rolled back; the notifier already told the user
    Rejected,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Done(_) | Self::Unchanged(_) => 0,
            Self::Rejected => 2,
        }
    }
}

/// Run one subcommand
pub async fn run(command: Commands, ctx: &BoardContext, config: &BoardConfig) -> Result<Outcome> {
    match command {
        Commands::Board {
            filter,
            collapse,
            json,
        } => board(ctx, filter, collapse, json).await,
        Commands::Task { command } => task(ctx, config, command).await,
        Commands::Version { command } => version(ctx, command).await,
        Commands::Config => show_config(config),
    }
}

/// The effective configuration as YAML. Needs no board.
pub fn show_config(config: &BoardConfig) -> Result<Outcome> {
    Ok(Outcome::Done(serde_yaml_ng::to_string(config)?))
}

async fn board(
    ctx: &BoardContext,
    args: FilterArgs,
    collapse: Vec<String>,
    json: bool,
) -> Result<Outcome> {
    let mut filter = BoardFilter::new();
    filter.statuses = args.statuses;
    filter.query = args.query;
    filter.min_priority = args.min_priority;
    for version in &args.versions {
        filter.versions.push(resolve_version(ctx, version)?);
    }
    let collapsed = collapse
        .iter()
        .map(|v| resolve_version(ctx, v))
        .collect::<Result<Vec<_>>>()?;

    let lanes = GetBoard::new()
        .with_filter(filter)
        .with_collapsed(collapsed)
        .execute(ctx)
        .await?;
    output(&lanes, json, |l: &Vec<_>| render::board(l))
}

async fn task(ctx: &BoardContext, config: &BoardConfig, command: TaskCommand) -> Result<Outcome> {
    match command {
        TaskCommand::Add {
            title,
            description,
            status,
            version,
            priority,
        } => {
            let version = match version {
                Some(v) => resolve_version(ctx, &v)?,
                None => config.default_version.clone(),
            };
            let mut add = AddTask::quick(title, status.unwrap_or(config.default_status), version);
            if let Some(description) = description {
                add = add.with_description(description);
            }
            if let Some(priority) = priority {
                add = add.with_priority(priority);
            }
            absorb(add.execute(ctx).await, |task| {
                format!("Added {} {}", task.id, task.title)
            })
        }

        TaskCommand::Update {
            id,
            title,
            description,
            status,
            version,
            priority,
        } => {
            let mut update = UpdateTask::new(resolve_task(ctx, &id)?);
            update.title = title;
            update.description = description;
            update.status = status;
            update.priority = priority;
            if let Some(version) = version {
                update.version = Some(resolve_version(ctx, &version)?);
            }
            absorb(update.execute(ctx).await, render::task)
        }

        TaskCommand::Move {
            id,
            status,
            version,
            before,
        } => {
            let id = resolve_task(ctx, &id)?;
            let cell = Cell::new(status, resolve_version(ctx, &version)?);
            let before = before.map(|b| resolve_task(ctx, &b)).transpose()?;
            drag(ctx, id, cell, before).await
        }

        TaskCommand::Rm { id } => {
            let id = resolve_task(ctx, &id)?;
            absorb(RemoveTask::new(id).execute(ctx).await, |task| {
                format!("Removed {} {}", task.id, task.title)
            })
        }

        TaskCommand::Show { id, json } => {
            let task = GetTask::new(resolve_task(ctx, &id)?).execute(ctx).await?;
            output(&task, json, render::task)
        }

        TaskCommand::List {
            status,
            version,
            json,
        } => {
            let mut list = ListTasks::new();
            if let Some(status) = status {
                list = list.with_status(status);
            }
            if let Some(version) = version {
                list = list.with_version(resolve_version(ctx, &version)?);
            }
            let tasks = list.execute(ctx).await?;
            output(&tasks, json, |t: &Vec<_>| render::tasks(t))
        }
    }
}

/// Replay a keyboard-style drag: pick up, hover, drop
async fn drag(
    ctx: &BoardContext,
    id: TaskId,
    cell: Cell,
    before: Option<TaskId>,
) -> Result<Outcome> {
    let hover = match before {
        Some(target) => DragEvent::HoverTask { target, cell },
        None => DragEvent::HoverCell { cell },
    };

    let controller = DragController::new();
    let mut session = BoardSession::new();
    let mut outcome = DragOutcome::Pending;
    for event in [DragEvent::Start { task: id }, hover, DragEvent::Drop] {
        let (next, result) = controller.handle(ctx, session, event).await;
        session = next;
        outcome = result;
        if !matches!(outcome, DragOutcome::Pending) {
            break;
        }
    }

    match outcome {
        DragOutcome::Moved(task) => Ok(Outcome::Done(format!(
            "Moved {} to {}/{}",
            task.id, task.version_id, task.status
        ))),
        DragOutcome::NoChange => Ok(Outcome::Unchanged("task is already there".to_string())),
        DragOutcome::Rejected(e) => absorb_error(e),
        other => Ok(Outcome::Unchanged(format!("nothing moved ({:?})", other))),
    }
}

async fn version(ctx: &BoardContext, command: VersionCommand) -> Result<Outcome> {
    match command {
        VersionCommand::List { all, json } => {
            let versions = ListVersions::new().with_hidden(all).execute(ctx).await?;
            output(&versions, json, |v: &Vec<_>| render::versions(v))
        }

        VersionCommand::Create { label, key } => {
            let mut create = CreateVersion::new(label);
            if let Some(key) = key {
                create = create.with_key(key);
            }
            absorb(create.execute(ctx).await, |v| {
                format!("Created {} {}", v.key, v.label)
            })
        }

        VersionCommand::Rename { version, label } => {
            let key = resolve_version(ctx, &version)?;
            absorb(RenameVersion::new(key, label).execute(ctx).await, |v| {
                format!("Renamed {} to {}", v.key, v.label)
            })
        }

        VersionCommand::Up { version } => {
            let key = resolve_version(ctx, &version)?;
            absorb(MoveVersion::up(key).execute(ctx).await, |v| {
                render::versions(v)
            })
        }

        VersionCommand::Down { version } => {
            let key = resolve_version(ctx, &version)?;
            absorb(MoveVersion::down(key).execute(ctx).await, |v| {
                render::versions(v)
            })
        }

        VersionCommand::Order { versions } => {
            let keys = versions
                .iter()
                .map(|v| resolve_version(ctx, v))
                .collect::<Result<Vec<_>>>()?;
            absorb(SetVersionOrder::new(keys).execute(ctx).await, |v| {
                render::versions(v)
            })
        }

        VersionCommand::Delete { version, to } => {
            let key = resolve_version(ctx, &version)?;
            let target = resolve_version(ctx, &to)?;
            absorb(DeleteVersion::new(key, target).execute(ctx).await, |d| {
                format!(
                    "Deleted {}; {} task(s) moved to {}",
                    d.key,
                    d.reassigned.len(),
                    d.reassigned_to
                )
            })
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Turn a command result into an outcome. Stale references and rolled-back
/// rejections are absorbed; everything else is an error.
fn absorb<T>(
    result: branchboard::Result<T>,
    describe: impl FnOnce(&T) -> String,
) -> Result<Outcome> {
    match result {
        Ok(value) => Ok(Outcome::Done(describe(&value))),
        Err(e) => absorb_error(e),
    }
}

fn absorb_error(error: BoardError) -> Result<Outcome> {
    if error.is_stale() {
        tracing::debug!(error = %error, "stale reference");
        return Ok(Outcome::Unchanged(error.to_string()));
    }
    if error.is_remote() {
        return Ok(Outcome::Rejected);
    }
    Err(error.into())
}

fn output<T: Serialize>(value: &T, json: bool, text: impl FnOnce(&T) -> String) -> Result<Outcome> {
    if json {
        Ok(Outcome::Done(serde_json::to_string_pretty(value)?))
    } else {
        Ok(Outcome::Done(text(value)))
    }
}

/// A task id, or a prefix matching exactly one task
pub fn resolve_task(ctx: &BoardContext, input: &str) -> Result<TaskId> {
    let input = input.trim();
    let tasks = ctx.tasks();
    if let Some(task) = tasks.iter().find(|t| t.id.as_str() == input) {
        return Ok(task.id.clone());
    }

    let matches: Vec<&TaskId> = tasks
        .iter()
        .map(|t| &t.id)
        .filter(|id| !input.is_empty() && id.as_str().starts_with(input))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("no task matches '{}'", input),
        many => bail!("'{}' matches {} tasks; use more characters", input, many.len()),
    }
}

/// A version key, or a case-insensitive label of a visible version
pub fn resolve_version(ctx: &BoardContext, input: &str) -> Result<VersionKey> {
    let input = input.trim();
    let versions = ctx.versions();
    if let Some(version) = versions.iter().find(|v| v.key.as_str() == input) {
        return Ok(version.key.clone());
    }

    let matches: Vec<&VersionKey> = versions
        .iter()
        .filter(|v| v.label.eq_ignore_ascii_case(input))
        .map(|v| &v.key)
        .collect();
    match matches.as_slice() {
        [key] => Ok((*key).clone()),
        [] => bail!("no version matches '{}'", input),
        _ => bail!("several versions are labelled '{}'; use the key", input),
    }
}
