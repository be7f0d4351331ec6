//! `psvt rev` command - revision history and sign-off

use clap::{Args, Subcommand};
use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{confirm, parse_entity_id, parse_revision_id, truncate_str, Context};
use crate::cli::output::{print_record, print_rows};
use crate::cli::OutputFormat;
use crate::core::{MemoryStore, RevisionLedger};
use crate::entities::{Revision, Signature, SignatureSlot};

#[derive(Debug, Subcommand)]
pub enum RevCommands {
    /// Start a new revision of a record
    New(RevNewArgs),
    /// List a record's revisions
    List(RevEntityArgs),
    /// Show a record's current revision
    Current(RevEntityArgs),
    /// Make a revision the record's current one
    SetCurrent(RevIdArgs),
    /// Sign a revision as originator, checker or approver
    Sign(RevSignArgs),
    /// Remove a signature from a revision
    Revoke(RevSignArgs),
    /// Delete a revision (requires override rights)
    Delete(RevDeleteArgs),
    /// Print the code that follows a given code
    NextCode(NextCodeArgs),
}

#[derive(Debug, Args)]
pub struct RevNewArgs {
    /// Record ID
    pub id: String,

    /// Revision code (e.g. A1); defaults to the next free code
    #[arg(long, short = 'c')]
    pub code: Option<String>,

    /// What changed in this revision
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Make the new revision current
    #[arg(long)]
    pub current: bool,
}

#[derive(Debug, Args)]
pub struct RevEntityArgs {
    /// Record ID
    pub id: String,
}

#[derive(Debug, Args)]
pub struct RevIdArgs {
    /// Revision ID (REV-...)
    pub rev_id: String,
}

#[derive(Debug, Args)]
pub struct RevSignArgs {
    /// Revision ID (REV-...)
    pub rev_id: String,

    /// Signature slot
    #[arg(value_enum)]
    pub slot: SignatureSlot,
}

#[derive(Debug, Args)]
pub struct RevDeleteArgs {
    /// Revision ID (REV-...)
    pub rev_id: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Args)]
pub struct NextCodeArgs {
    /// Current code; omit to get the first code
    pub code: Option<String>,
}

#[derive(Debug, Tabled, Serialize)]
struct RevisionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "CODE")]
    code: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
    #[tabled(rename = "ORIGINATOR")]
    originator: String,
    #[tabled(rename = "CHECKER")]
    checker: String,
    #[tabled(rename = "APPROVER")]
    approver: String,
    #[tabled(rename = "CURRENT")]
    current: bool,
}

fn signer(signature: &Signature) -> String {
    signature.signer().unwrap_or("-").to_string()
}

pub fn run(cmd: RevCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        RevCommands::New(args) => run_new(args, global),
        RevCommands::List(args) => run_list(args, global),
        RevCommands::Current(args) => run_current(args, global),
        RevCommands::SetCurrent(args) => run_set_current(args),
        RevCommands::Sign(args) => run_sign(args),
        RevCommands::Revoke(args) => run_revoke(args),
        RevCommands::Delete(args) => run_delete(args),
        RevCommands::NextCode(args) => run_next_code(args),
    }
}

fn run_new(args: RevNewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    let revision = ctx.controller.new_revision(
        &id,
        args.code.as_deref(),
        args.description,
        args.current,
        &ctx.session,
    )?;

    if global.format == OutputFormat::Id {
        println!("{}", revision.id);
        return Ok(());
    }
    println!(
        "{} Created revision {} of {}{}",
        style("✓").green(),
        style(revision.code).cyan(),
        id,
        if args.current { " (current)" } else { "" }
    );
    println!("{}", revision.id);
    Ok(())
}

fn run_list(args: RevEntityArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    let ledger = ctx.controller.ledger();
    let revisions = ledger.list(id.kind(), &id)?;

    if revisions.is_empty() {
        println!("No revisions for {}.", id);
        return Ok(());
    }

    let current = ledger.get_current(id.kind(), &id)?.map(|r| r.id);
    let rows: Vec<RevisionRow> = revisions
        .iter()
        .map(|r| RevisionRow {
            id: r.id.to_string(),
            code: r.code.to_string(),
            description: truncate_str(r.description.as_deref().unwrap_or(""), 32),
            originator: signer(&r.originated),
            checker: signer(&r.checked),
            approver: signer(&r.approved),
            current: current == Some(r.id),
        })
        .collect();

    print_rows(&rows, global.format, |r| r.id.clone())
}

fn run_current(args: RevEntityArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    match ctx.controller.ledger().get_current(id.kind(), &id)? {
        Some(revision) if global.format == OutputFormat::Id => println!("{}", revision.id),
        Some(revision) => print_record(&revision, global.format)?,
        None => println!("No revisions for {}.", id),
    }
    Ok(())
}

fn run_set_current(args: RevIdArgs) -> Result<()> {
    let mut ctx = Context::load()?;
    let rev_id = parse_revision_id(&args.rev_id)?;
    let revision = ctx.controller.ledger().get(&rev_id)?;
    let entity = ctx.controller.set_current(&rev_id, &ctx.session)?;
    println!(
        "{} {} is now at revision {}",
        style("✓").green(),
        entity.id,
        style(revision.code).cyan()
    );
    Ok(())
}

fn run_sign(args: RevSignArgs) -> Result<()> {
    let mut ctx = Context::load()?;
    let rev_id = parse_revision_id(&args.rev_id)?;
    let revision = ctx
        .controller
        .sign_revision(&rev_id, args.slot, &ctx.session)?;
    println!(
        "{} Signed revision {} as {} ({})",
        style("✓").green(),
        style(revision.code).cyan(),
        args.slot,
        ctx.session.user_id
    );
    print_sign_off(&revision);
    Ok(())
}

fn run_revoke(args: RevSignArgs) -> Result<()> {
    let mut ctx = Context::load()?;
    let rev_id = parse_revision_id(&args.rev_id)?;
    let revision = ctx
        .controller
        .revoke_signature(&rev_id, args.slot, &ctx.session)?;
    println!(
        "{} Revoked {} signature on revision {}",
        style("✓").green(),
        args.slot,
        style(revision.code).cyan()
    );
    print_sign_off(&revision);
    Ok(())
}

fn print_sign_off(revision: &Revision) {
    for slot in SignatureSlot::ALL {
        let state = match revision.slot(slot) {
            Signature::Signed { by, at } => {
                format!("{} ({})", style(by).green(), at.format("%Y-%m-%d %H:%M"))
            }
            Signature::Unsigned => style("unsigned").dim().to_string(),
        };
        println!("  {:<12} {}", slot.to_string(), state);
    }
}

fn run_delete(args: RevDeleteArgs) -> Result<()> {
    let mut ctx = Context::load()?;
    let rev_id = parse_revision_id(&args.rev_id)?;
    let revision = ctx.controller.ledger().get(&rev_id)?;

    if !confirm(
        &format!(
            "Delete revision {} of {}? This cannot be undone",
            revision.code, revision.entity_id
        ),
        args.yes,
    )? {
        println!("Aborted.");
        return Ok(());
    }

    ctx.controller.delete_revision(&rev_id, &ctx.session)?;
    println!(
        "{} Deleted revision {} of {}",
        style("✓").green(),
        revision.code,
        revision.entity_id
    );
    Ok(())
}

fn run_next_code(args: NextCodeArgs) -> Result<()> {
    let code = RevisionLedger::<MemoryStore>::suggest_next_revision_code(args.code.as_deref())?;
    println!("{}", code);
    Ok(())
}
