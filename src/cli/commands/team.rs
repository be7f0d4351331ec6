//! Team command - team roster management

use clap::{Args, Subcommand};
use console::style;
use miette::{bail, miette, IntoDiagnostic, Result};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{confirm, truncate_str};
use crate::cli::output::print_rows;
use crate::core::team::{Capability, Role, TeamMember, TeamRoster, ROSTER_FILE};
use crate::core::{Config, Project};

/// Team roster management
#[derive(Debug, Subcommand)]
pub enum TeamCommands {
    /// Create an empty team roster
    Init(TeamInitArgs),
    /// List team members
    List(TeamListArgs),
    /// Show who you are acting as and what you may do
    Whoami,
    /// Add a team member
    Add(TeamAddArgs),
    /// Remove a team member
    Remove(TeamRemoveArgs),
}

#[derive(Debug, Args)]
pub struct TeamInitArgs {
    /// Overwrite an existing roster
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct TeamListArgs {
    /// Filter by role
    #[arg(long, short = 'r', value_enum)]
    pub role: Option<Role>,
}

#[derive(Debug, Args)]
pub struct TeamAddArgs {
    /// Member's full name
    #[arg(long)]
    pub name: String,

    /// Username (matched against PSVT_USER / $USER)
    #[arg(long)]
    pub username: String,

    /// Member's email
    #[arg(long, default_value = "")]
    pub email: String,

    /// Role
    #[arg(long, value_enum)]
    pub role: Role,
}

#[derive(Debug, Args)]
pub struct TeamRemoveArgs {
    /// Username to remove
    pub username: String,

    /// Skip confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Debug, Tabled, Serialize)]
struct MemberRow {
    #[tabled(rename = "USERNAME")]
    username: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "ROLE")]
    role: Role,
}

impl TeamCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        match self {
            TeamCommands::Init(args) => args.run(),
            TeamCommands::List(args) => args.run(global),
            TeamCommands::Whoami => run_whoami(),
            TeamCommands::Add(args) => args.run(),
            TeamCommands::Remove(args) => args.run(),
        }
    }
}

impl TeamInitArgs {
    pub fn run(&self) -> Result<()> {
        let project = Project::discover()?;
        let path = project.root().join(ROSTER_FILE);
        if path.exists() && !self.force {
            bail!(
                "Team roster already exists at {}\nUse --force to overwrite.",
                path.display()
            );
        }
        if let Some(existing) = TeamRoster::load(&project)? {
            require_admin(&project, &existing)?;
        }
        TeamRoster::default().save(&project).into_diagnostic()?;
        println!("Created team roster at {}", path.display());
        println!("\nAdd members with:");
        println!("  psvt team add --name \"Jane Smith\" --username jsmith --role lead");
        Ok(())
    }
}

impl TeamListArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let project = Project::discover()?;
        let Some(roster) = TeamRoster::load(&project)? else {
            bail!("No team roster found. Run 'psvt team init' to create one.");
        };

        let rows: Vec<MemberRow> = roster
            .active_members()
            .filter(|m| self.role.is_none_or(|r| m.role == r))
            .map(|m| MemberRow {
                username: m.username.clone(),
                name: truncate_str(&m.name, 24),
                email: m.email.clone(),
                role: m.role,
            })
            .collect();

        if rows.is_empty() {
            println!("No team members found.");
            return Ok(());
        }
        print_rows(&rows, global.format, |r| r.username.clone())
    }
}

fn run_whoami() -> Result<()> {
    let project = Project::discover()?;
    let config = Config::load_for(Some(&project));
    let roster = TeamRoster::load(&project)?;
    let session = config.session(roster.as_ref());
    let in_roster = roster
        .as_ref()
        .and_then(|r| r.find(&session.user_id))
        .is_some();

    println!("User:   {}", style(&session.user_id).cyan());
    println!(
        "Role:   {}{}",
        session.role,
        if in_roster { "" } else { " (not in roster)" }
    );

    println!("\nAuthorization:");
    for (label, capability) in [
        ("Edit records", Capability::Edit),
        ("Check", Capability::Check),
        ("Approve", Capability::Approve),
        ("Override signatures", Capability::Override),
    ] {
        let mark = if session.role.has(capability) {
            style("yes").green()
        } else {
            style("no").red()
        };
        println!("  {:<20} {}", label, mark);
    }
    Ok(())
}

/// Once a roster names an admin, only admins may change it
fn require_admin(project: &Project, roster: &TeamRoster) -> Result<()> {
    if roster.members_with_role(Role::Admin).next().is_none() {
        return Ok(());
    }
    let session = Config::load_for(Some(project)).session(Some(roster));
    if session.role != Role::Admin {
        bail!(
            "{} ({}) may not change the team roster; requires admin",
            session.user_id,
            session.role
        );
    }
    Ok(())
}

impl TeamAddArgs {
    pub fn run(&self) -> Result<()> {
        let project = Project::discover()?;
        let mut roster = TeamRoster::load(&project)?.unwrap_or_default();
        require_admin(&project, &roster)?;

        if roster
            .members
            .iter()
            .any(|m| m.username.eq_ignore_ascii_case(&self.username))
        {
            bail!(
                "User '{}' already exists in the team roster.\n\
                 Use 'psvt team remove {}' first to update.",
                self.username,
                self.username
            );
        }

        roster.upsert(TeamMember {
            name: self.name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            active: true,
        });
        roster.save(&project).into_diagnostic()?;

        println!(
            "{} Added {} ({}) as {}",
            style("✓").green(),
            self.name,
            self.username,
            self.role
        );
        Ok(())
    }
}

impl TeamRemoveArgs {
    pub fn run(&self) -> Result<()> {
        let project = Project::discover()?;
        let mut roster =
            TeamRoster::load(&project)?.ok_or_else(|| miette!("No team roster found."))?;
        require_admin(&project, &roster)?;

        if !roster
            .members
            .iter()
            .any(|m| m.username.eq_ignore_ascii_case(&self.username))
        {
            bail!("User '{}' not found in team roster.", self.username);
        }

        if !confirm(
            &format!("Remove {} from the team roster?", self.username),
            self.yes,
        )? {
            println!("Aborted.");
            return Ok(());
        }

        roster.remove(&self.username);
        roster.save(&project).into_diagnostic()?;
        println!("Removed {} from team roster", self.username);
        Ok(())
    }
}
