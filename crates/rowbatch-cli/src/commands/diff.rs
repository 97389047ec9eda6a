//! Diff command
//!
//! Usage: rowbatch diff <OLD> <NEW> [--json] [--config <FILE>]
//!
//! Snapshots are JSON arrays of `{"key": .., "items": [..]}`. Sections match
//! by key, items by JSON equality.

use clap::Args;
use rowbatch_core::errors::{ExError, ExErrorKind};
use rowbatch_core::{nested_diff, FlushPlan, Section};
use serde_json::Value;
use std::path::PathBuf;

use super::{load_config, read_json};

pub type JsonSnapshot = Vec<Section<Value, Value>>;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Snapshot before the update
    pub old: PathBuf,

    /// Snapshot after the update
    pub new: PathBuf,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,

    /// Coordinator config; `declarative_animation` is applied to every call
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute diff command
pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let old: JsonSnapshot = read_json(&args.old, "diff")?;
    let new: JsonSnapshot = read_json(&args.new, "diff")?;

    let plan = plan_for(&old, &new, config.declarative_animation)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else if plan.is_empty() {
        println!("no changes");
    } else {
        for op in plan.ops() {
            println!("{}", op);
        }
    }

    Ok(())
}

/// Diff two snapshots and check that the plan replays `old` into `new`
pub fn plan_for(
    old: &JsonSnapshot,
    new: &JsonSnapshot,
    animation: rowbatch_core::RowAnimation,
) -> Result<FlushPlan, ExError> {
    let plan = FlushPlan::from_nested_diff(&nested_diff(old, new), animation);
    let replayed = plan
        .apply_to_snapshot(old, new)
        .map_err(|e| ExError::from(e).with_op("diff"))?;
    if &replayed != new {
        return Err(ExError::new(ExErrorKind::Internal)
            .with_op("diff")
            .with_message("plan does not reproduce the new snapshot"));
    }
    Ok(plan)
}
