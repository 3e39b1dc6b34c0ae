use clap::{Parser, Subcommand};

mod cmd;
mod content_hash;
mod corpus;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the offline training pipeline and upsert artifacts for one or
    /// more formats.
    Build(cmd::build::BuildArgs),
    /// Score a decklist locally against a JSON artifact bundle.
    Score(cmd::score::ScoreArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build(args) => cmd::build::run(args).await,
        Commands::Score(args) => cmd::score::run(args),
    }
}
