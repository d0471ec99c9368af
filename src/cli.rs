use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::schedule::ScheduleOptions;
use crate::commands::{self, CommandReport};

#[derive(Debug, Parser)]
#[command(
    name = "hotboard",
    version,
    about = "Harvest hot-topic board snapshots and archive them behind a recency-window dedup"
)]
struct Cli {
    /// Print the command report as JSON instead of plain lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch the board page and write one timestamped snapshot file (the default)
    Crawl,
    /// Fold pending snapshot files into the index and retire them
    Archive,
    /// Run crawl-then-archive on a fixed cadence
    Schedule {
        /// Fire one crawl-then-archive cycle and exit
        #[arg(long)]
        once: bool,
    },
    /// Show the resolved layout, configuration, and index state
    Status,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command.unwrap_or(Command::Crawl) {
        Command::Crawl => commands::crawl::run()?,
        Command::Archive => commands::archive::run()?,
        Command::Schedule { once } => commands::schedule::run(&ScheduleOptions { once })?,
        Command::Status => commands::status::run()?,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn print_report(report: &CommandReport) {
    for detail in &report.details {
        println!("{detail}");
    }
    for issue in &report.issues {
        eprintln!("issue: {issue}");
    }
}
