use clap::Parser;
use lesson_player::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    lesson_player::init_tracing(cli.verbose);
    lesson_player::run(cli).await
}
