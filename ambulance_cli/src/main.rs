use clap::{Parser, Subcommand};

use crate::{optimize::OptimizeArgs, simulate::SimulateArgs};

mod optimize;
mod parsers;
mod region_args;
mod simulate;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replays the historical calls against one allocation
    #[command(visible_alias = "s")]
    Simulate {
        #[command(flatten)]
        args: SimulateArgs,
    },
    /// Searches for the allocation with the lowest mean response time
    #[command(visible_alias = "o")]
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Simulate { args }) => simulate::run(args)?,
        Some(Commands::Optimize { args }) => optimize::run(args)?,
        None => {}
    }

    Ok(())
}
