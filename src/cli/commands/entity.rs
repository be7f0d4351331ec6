//! Record commands - create, list, show, deactivate

use clap::Args;
use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOpts;
use crate::cli::filters::{KindFilter, StatusFilter};
use crate::cli::helpers::{parse_entity_id, truncate_str, Context};
use crate::cli::output::{print_record, print_rows};
use crate::cli::OutputFormat;
use crate::core::{EntityKind, Store};
use crate::entities::{Entity, Revision};

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Kind of record to create
    #[arg(value_enum)]
    pub kind: KindFilter,

    /// Title (tag number for PSVs)
    #[arg(long, short = 't')]
    pub title: String,

    /// Parent record ID (required for everything below a customer)
    #[arg(long, short = 'p')]
    pub parent: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only this kind of record
    #[arg(long, short = 'k', value_enum)]
    pub kind: Option<KindFilter>,

    /// Filter by workflow status
    #[arg(long, short = 's', value_enum, default_value_t = StatusFilter::Any)]
    pub status: StatusFilter,

    /// Include deactivated records
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    /// Record ID (e.g. PSV-01KC5B2...)
    pub id: String,
}

#[derive(Debug, Tabled, Serialize)]
struct EntityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "KIND")]
    kind: String,
    #[tabled(rename = "TITLE")]
    title: String,
    #[tabled(rename = "STATUS")]
    status: String,
    #[tabled(rename = "REV")]
    revision: String,
    #[tabled(rename = "ACTIVE")]
    active: bool,
}

/// `show` output: the record followed by its revision history
#[derive(Debug, Serialize)]
struct EntityView<'a> {
    #[serde(flatten)]
    entity: &'a Entity,
    revisions: Vec<Revision>,
}

pub fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::load()?;
    let parent = args.parent.as_deref().map(parse_entity_id).transpose()?;
    let entity = ctx
        .controller
        .create_entity(args.kind.kind(), &args.title, parent, &ctx.session)?;

    match global.format {
        OutputFormat::Id => println!("{}", entity.id),
        OutputFormat::Auto | OutputFormat::Table => {
            println!(
                "{} Created {} {}",
                style("✓").green(),
                entity.kind(),
                style(&entity.title).bold()
            );
            println!("{}", entity.id);
        }
        format => print_record(&entity, format)?,
    }
    Ok(())
}

pub fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load()?;
    let ledger = ctx.controller.ledger();

    let mut entities: Vec<Entity> = ctx
        .controller
        .store()
        .list()?
        .into_iter()
        .filter(|e| args.all || e.is_active)
        .filter(|e| args.kind.is_none_or(|k| k.kind() == e.kind()))
        .filter(|e| args.status.matches(e.kind(), e.status))
        .collect();

    if entities.is_empty() {
        println!("No records found.");
        return Ok(());
    }

    // Hierarchy order first, then creation order
    entities.sort_by(|a, b| {
        let rank = |e: &Entity| EntityKind::ALL.iter().position(|k| *k == e.kind());
        rank(a).cmp(&rank(b)).then(a.created.cmp(&b.created))
    });

    let mut rows = Vec::with_capacity(entities.len());
    for entity in &entities {
        let kind = entity.kind();
        let revision = if kind.has_workflow() {
            ledger
                .get_current(kind, &entity.id)?
                .map(|r| r.code.to_string())
                .unwrap_or_else(|| "-".to_string())
        } else {
            "-".to_string()
        };
        rows.push(EntityRow {
            id: entity.id.to_string(),
            kind: kind.to_string(),
            title: truncate_str(&entity.title, 32),
            status: if kind.has_workflow() {
                entity.status.to_string()
            } else {
                "-".to_string()
            },
            revision,
            active: entity.is_active,
        });
    }

    print_rows(&rows, global.format, |r| r.id.clone())
}

pub fn run_show(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    let entity = ctx.controller.load(&id)?;
    let revisions = if entity.kind().has_workflow() {
        ctx.controller.ledger().list(entity.kind(), &id)?
    } else {
        Vec::new()
    };

    if global.format == OutputFormat::Id {
        println!("{}", entity.id);
        return Ok(());
    }
    print_record(
        &EntityView {
            entity: &entity,
            revisions,
        },
        global.format,
    )
}

pub fn run_deactivate(args: IdArgs) -> Result<()> {
    set_active(args, false)
}

pub fn run_activate(args: IdArgs) -> Result<()> {
    set_active(args, true)
}

fn set_active(args: IdArgs, active: bool) -> Result<()> {
    let mut ctx = Context::load()?;
    let id = parse_entity_id(&args.id)?;
    let entity = if active {
        ctx.controller.reactivate(&id, &ctx.session)?
    } else {
        ctx.controller.deactivate(&id, &ctx.session)?
    };

    println!(
        "{} {} is now {}",
        style("✓").green(),
        entity.id,
        if entity.is_active {
            style("active").green()
        } else {
            style("inactive").yellow()
        }
    );
    Ok(())
}
