use clap::Parser;
use openmesh_demo::{SENTIMENT_ANALYZER, ServeArgs};

/// Sentiment analysis and key phrase extraction over MCP, paid per call via x402.
#[derive(Parser)]
#[command(name = "sentiment-analyzer", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    openmesh_demo::init_tracing(&cli.serve.log_level, cli.serve.log_format)?;
    openmesh_demo::run(
        &SENTIMENT_ANALYZER,
        &cli.serve,
        openmesh_demo_tools::sentiment_tools,
    )
    .await
}
