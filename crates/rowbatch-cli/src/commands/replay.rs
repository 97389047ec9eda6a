//! Replay command
//!
//! Usage: rowbatch replay <SCRIPT> [--json] [--no-initial-load] [--config <FILE>]
//!
//! A script is a JSON document:
//!
//! ```json
//! {
//!   "initial_counts": [2, 1],
//!   "steps": [
//!     {"op": "begin"},
//!     {"op": "set_counts", "counts": [3, 1]},
//!     {"op": "insert_rows", "rows": [{"section": 0, "item": 2}], "animation": "fade"},
//!     {"op": "end", "animated": true}
//!   ]
//! }
//! ```
//!
//! Every step runs against an imperative coordinator with a recording
//! surface. Failed steps are reported and the replay continues; the command
//! fails at the end if any step failed.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Args;
use rowbatch_core::errors::{ExError, ExErrorKind};
use rowbatch_core::{
    Completion, Coordinator, IndexPath, RecordingSurface, RowAnimation, SurfaceCall,
};
use serde::{Deserialize, Serialize};

use super::{load_config, read_json};

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// Edit script to run
    pub script: PathBuf,

    /// Print the replay log as JSON
    #[arg(long)]
    pub json: bool,

    /// Start without a full reload, so transactions are absorbed until a
    /// `reload_data` step
    #[arg(long)]
    pub no_initial_load: bool,

    /// Coordinator config (mode must be imperative)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    pub initial_counts: Vec<usize>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Begin,
    End {
        #[serde(default)]
        animated: bool,
    },
    SetCounts {
        counts: Vec<usize>,
    },
    InsertSections {
        sections: Vec<usize>,
        #[serde(default)]
        animation: RowAnimation,
    },
    DeleteSections {
        sections: Vec<usize>,
        #[serde(default)]
        animation: RowAnimation,
    },
    ReloadSections {
        sections: Vec<usize>,
        #[serde(default)]
        animation: RowAnimation,
    },
    MoveSection {
        from: usize,
        to: usize,
    },
    InsertRows {
        rows: Vec<IndexPath>,
        #[serde(default)]
        animation: RowAnimation,
    },
    DeleteRows {
        rows: Vec<IndexPath>,
        #[serde(default)]
        animation: RowAnimation,
    },
    ReloadRows {
        rows: Vec<IndexPath>,
        #[serde(default)]
        animation: RowAnimation,
    },
    MoveRow {
        from: IndexPath,
        to: IndexPath,
    },
    ReloadData,
    Wait,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Begin => "begin",
            Step::End { .. } => "end",
            Step::SetCounts { .. } => "set_counts",
            Step::InsertSections { .. } => "insert_sections",
            Step::DeleteSections { .. } => "delete_sections",
            Step::ReloadSections { .. } => "reload_sections",
            Step::MoveSection { .. } => "move_section",
            Step::InsertRows { .. } => "insert_rows",
            Step::DeleteRows { .. } => "delete_rows",
            Step::ReloadRows { .. } => "reload_rows",
            Step::MoveRow { .. } => "move_row",
            Step::ReloadData => "reload_data",
            Step::Wait => "wait",
        }
    }
}

/// What one step did to the surface
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub op: &'static str,
    pub calls: Vec<SurfaceCall>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub completions: Vec<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

type ReplayCoordinator = Coordinator<Vec<usize>, RecordingSurface>;

/// Execute replay command
pub fn execute(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.config.as_deref())?;
    let script: Script = read_json(&args.script, "replay")?;

    let coordinator =
        Coordinator::imperative(script.initial_counts.clone(), RecordingSurface::new())
            .with_config(config)
            .map_err(|e| ExError::from(e).with_op("replay"))?;
    let reports = run(coordinator, &script.steps, !args.no_initial_load);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(Box::new(
            ExError::new(ExErrorKind::InvalidInput)
                .with_op("replay")
                .with_message(format!("{} step(s) failed", failed)),
        ));
    }
    Ok(())
}

/// Run every step and report the surface calls each one caused
///
/// Transactions the script leaves open are closed afterwards and reported
/// as a failed trailing step.
pub fn run(
    mut coordinator: ReplayCoordinator,
    steps: &[Step],
    initial_load: bool,
) -> Vec<StepReport> {
    let completions = Rc::new(RefCell::new(Vec::new()));
    let mut reports = Vec::with_capacity(steps.len());

    if initial_load {
        // Cannot fail: no transaction is open yet.
        let _ = coordinator.reload_data(None);
        coordinator.surface_mut().take_calls();
    }

    for (index, step) in steps.iter().enumerate() {
        let error = apply_step(&mut coordinator, step, &completions)
            .err()
            .map(|e| ExError::from(e).to_string());
        reports.push(StepReport {
            step: index,
            op: step.name(),
            calls: coordinator.surface_mut().take_calls(),
            completions: completions.borrow_mut().drain(..).collect(),
            error,
        });
    }

    if coordinator.is_batch_updating() {
        let open = coordinator.transaction_depth();
        let mut closing_error = None;
        while coordinator.is_batch_updating() {
            if let Err(e) = coordinator.end_updates(false, None) {
                closing_error = Some(ExError::from(e).to_string());
            }
        }
        let message = format!("script left {} transaction(s) open", open);
        reports.push(StepReport {
            step: steps.len(),
            op: "end",
            calls: coordinator.surface_mut().take_calls(),
            completions: completions.borrow_mut().drain(..).collect(),
            error: Some(match closing_error {
                Some(cause) => format!("{}; closing failed: {}", message, cause),
                None => message,
            }),
        });
    }

    reports
}

fn apply_step(
    coordinator: &mut ReplayCoordinator,
    step: &Step,
    completions: &Rc<RefCell<Vec<bool>>>,
) -> rowbatch_core::Result<()> {
    match step.clone() {
        Step::Begin => {
            coordinator.begin_updates();
            Ok(())
        }
        Step::End { animated } => coordinator.end_updates(animated, Some(record(completions))),
        Step::SetCounts { counts } => {
            *coordinator.data_source_mut() = counts;
            Ok(())
        }
        Step::InsertSections {
            sections,
            animation,
        } => coordinator.insert_sections(sections, animation),
        Step::DeleteSections {
            sections,
            animation,
        } => coordinator.delete_sections(sections, animation),
        Step::ReloadSections {
            sections,
            animation,
        } => coordinator.reload_sections(sections, animation),
        Step::MoveSection { from, to } => coordinator.move_section(from, to),
        Step::InsertRows { rows, animation } => coordinator.insert_rows(rows, animation),
        Step::DeleteRows { rows, animation } => coordinator.delete_rows(rows, animation),
        Step::ReloadRows { rows, animation } => coordinator.reload_rows(rows, animation),
        Step::MoveRow { from, to } => coordinator.move_row(from, to),
        Step::ReloadData => coordinator.reload_data(Some(record(completions))),
        Step::Wait => {
            coordinator.wait_until_all_updates_committed();
            Ok(())
        }
    }
}

fn record(completions: &Rc<RefCell<Vec<bool>>>) -> Completion {
    let completions = completions.clone();
    Box::new(move |finished| completions.borrow_mut().push(finished))
}

fn print_report(report: &StepReport) {
    println!("step {}: {}", report.step, report.op);
    for call in &report.calls {
        println!("  {}", describe(call));
    }
    for finished in &report.completions {
        println!("  completion({})", finished);
    }
    if let Some(error) = &report.error {
        println!("  error: {}", error);
    }
}

fn join<P: std::fmt::Display>(positions: &[P]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(call: &SurfaceCall) -> String {
    match call {
        SurfaceCall::BeginBatch { animated } => format!("begin batch (animated: {})", animated),
        SurfaceCall::EndBatch => "end batch".to_string(),
        SurfaceCall::InsertSections {
            sections,
            animation,
        } => format!("insert sections [{}] ({})", join(sections), animation),
        SurfaceCall::DeleteSections {
            sections,
            animation,
        } => format!("delete sections [{}] ({})", join(sections), animation),
        SurfaceCall::InsertItems { items, animation } => {
            format!("insert items [{}] ({})", join(items), animation)
        }
        SurfaceCall::DeleteItems { items, animation } => {
            format!("delete items [{}] ({})", join(items), animation)
        }
        SurfaceCall::ReloadData => "reload data".to_string(),
        SurfaceCall::WaitUntilCommitted => "wait until committed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(source: &str) -> Script {
        serde_json::from_str(source).unwrap()
    }

    #[test]
    fn test_run_reports_one_batch_per_outer_end() {
        let script = script(
            r#"{
                "initial_counts": [2, 1],
                "steps": [
                    {"op": "begin"},
                    {"op": "set_counts", "counts": [3, 1]},
                    {"op": "insert_rows", "rows": [{"section": 0, "item": 2}], "animation": "fade"},
                    {"op": "end", "animated": true}
                ]
            }"#,
        );
        let coordinator =
            Coordinator::imperative(script.initial_counts.clone(), RecordingSurface::new());
        let reports = run(coordinator, &script.steps, true);

        assert_eq!(reports.len(), 4);
        assert!(reports[..3].iter().all(|r| r.calls.is_empty()));
        assert_eq!(reports[3].calls.len(), 3);
        assert_eq!(reports[3].completions, vec![true]);
        assert!(reports.iter().all(|r| r.error.is_none()));
    }

    #[test]
    fn test_run_closes_open_transactions() {
        let script = script(r#"{"initial_counts": [], "steps": [{"op": "begin"}]}"#);
        let coordinator =
            Coordinator::imperative(script.initial_counts.clone(), RecordingSurface::new());
        let reports = run(coordinator, &script.steps, true);

        let last = reports.last().unwrap();
        assert_eq!(last.op, "end");
        assert!(last.error.as_deref().unwrap().contains("left 1 transaction(s) open"));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        let parsed: Result<Script, _> =
            serde_json::from_str(r#"{"initial_counts": [], "steps": [{"op": "explode"}]}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_describe_calls() {
        assert_eq!(
            describe(&SurfaceCall::DeleteItems {
                items: vec![IndexPath::new(0, 1), IndexPath::new(2, 0)],
                animation: RowAnimation::Left,
            }),
            "delete items [0.1, 2.0] (left)"
        );
    }
}
