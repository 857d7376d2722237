// File: ./src/cli.rs
//! Command-line arguments and terminal output.
use crate::lists::ListPolicy;
use crate::migrate::{MigrationOptions, MigrationReport};
use crate::transform::IdentityPolicy;
use clap::Parser;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

/// Migrate a BC2 Tasks JSON export into CalDAV task lists
#[derive(Parser, Debug)]
#[command(name = "bc2t-migrate", author, version, about, long_about = None)]
pub struct Args {
    /// Export file: a JSON task array, optionally followed by the reminder segment
    pub input: PathBuf,

    /// Credentials file (TOML or JSON); defaults to the user config directory
    #[arg(short, long)]
    pub credentials: Option<PathBuf>,

    /// Stop once this many top-level tasks have been counted
    #[arg(long, value_name = "N")]
    pub debug_limit: Option<usize>,

    /// How source lists map to destination lists: prompt, avoid-existing, new-and-existing
    #[arg(long, default_value_t = ListPolicy::Prompt)]
    pub lists: ListPolicy,

    /// Task uids: reuse (item ids) or fresh (random)
    #[arg(long, default_value_t = IdentityPolicy::Reuse)]
    pub identity: IdentityPolicy,

    /// Migrate into memory only; no credentials are read and nothing is sent
    #[arg(long)]
    pub dry_run: bool,

    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Warnings and errors only
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn options(&self) -> MigrationOptions {
        MigrationOptions {
            lists: self.lists,
            identity: self.identity,
            debug_limit: self.debug_limit,
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        if self.verbose {
            LevelFilter::Debug
        } else if self.quiet {
            LevelFilter::Warn
        } else {
            LevelFilter::Info
        }
    }
}

pub fn init_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .add_filter_allow_str(env!("CARGO_CRATE_NAME"))
        .build();
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

pub fn print_summary(report: &MigrationReport, dry_run: bool) {
    println!();
    if dry_run {
        println!("Dry run, nothing was written to the server.");
    }
    println!("Migrated tasks:      {}", report.migrated);
    println!("Top-level visited:   {}", report.visited);
    println!("Duplicates skipped:  {}", report.duplicates);
    println!("Skipped with list:   {}", report.skipped_by_list);
    println!("Alarms attached:     {}", report.alarms_attached);
    if report.unanchored_reminders > 0 {
        println!(
            "Reminders dropped:   {} (no due date to anchor them)",
            report.unanchored_reminders
        );
    }
    if report.halted_at_limit {
        println!("Stopped early at the debug limit.");
    }
}
