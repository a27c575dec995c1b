use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Weekly meal plan generator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate and persist a 7-day plan
    Generate {
        /// User to plan for (overrides the request file)
        #[arg(short, long)]
        user_id: Option<String>,

        /// Monday of the planned week, YYYY-MM-DD (overrides the request file)
        #[arg(short, long)]
        week_start: Option<String>,

        /// JSON request body: { user_id, week_start, preferences? }
        #[arg(short, long)]
        request: Option<PathBuf>,

        /// Use an in-memory store seeded from this JSON catalog; the plan is
        /// archived beside it as `<catalog>.plans.json`
        #[arg(short, long)]
        fixtures: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print a stored plan
    Show {
        #[arg(short, long)]
        plan_id: String,

        /// Read plans archived beside this catalog by an earlier fixture run
        #[arg(short, long)]
        fixtures: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
