//! Status commands - set, advance, and list allowed transitions

use clap::Args;
use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOpts;
use crate::cli::commands::entity::IdArgs;
use crate::cli::helpers::{parse_entity_id, Context};
use crate::cli::output::print_rows;
use crate::core::{StageGate, WorkflowStatus};
use crate::entities::Entity;

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Record ID
    pub id: String,

    /// Target status (draft, in_review, checked, calculated, verified, approved, issued)
    pub status: WorkflowStatus,
}

#[derive(Debug, Tabled, Serialize)]
struct TransitionRow {
    #[tabled(rename = "STATUS")]
    status: WorkflowStatus,
    #[tabled(rename = "DIRECTION")]
    direction: &'static str,
    #[tabled(rename = "ROLES")]
    roles: String,
}

pub fn run_status(args: StatusArgs) -> Result<()> {
    let mut ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    let before = ctx.controller.load(&id)?.status;
    let entity = ctx
        .controller
        .request_status_change(&id, args.status, &ctx.session)?;
    report_change(&entity, before);
    Ok(())
}

pub fn run_advance(args: IdArgs) -> Result<()> {
    let mut ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    let before = ctx.controller.load(&id)?.status;
    let entity = ctx.controller.advance_one_step(&id, &ctx.session)?;
    report_change(&entity, before);
    Ok(())
}

fn report_change(entity: &Entity, before: WorkflowStatus) {
    if entity.status == before {
        println!("{} is already {}", entity.id, style(entity.status).cyan());
    } else {
        println!(
            "{} {}: {} → {}",
            style("✓").green(),
            entity.id,
            before,
            style(entity.status).cyan()
        );
    }
}

pub fn run_transitions(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    let entity = ctx.controller.load(&id)?;
    let kind = entity.kind();
    let targets = ctx.controller.allowed_targets(&id, &ctx.session)?;

    if targets.is_empty() {
        println!(
            "No transitions available for {} as {} ({}).",
            id, ctx.session.user_id, ctx.session.role
        );
        return Ok(());
    }

    let current = kind.stage_index(entity.status);
    let rows: Vec<TransitionRow> = targets
        .into_iter()
        .map(|status| {
            let forward = kind.stage_index(status) > current;
            let gate = if forward {
                StageGate::for_stage(kind, status).unwrap_or(StageGate::Edit)
            } else {
                StageGate::Edit
            };
            TransitionRow {
                status,
                direction: if forward { "forward" } else { "back" },
                roles: gate
                    .roles()
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            }
        })
        .collect();

    print_rows(&rows, global.format, |r| r.status.to_string())
}
