use clap::Parser;
use openmesh_demo::{ServeArgs, TRANSLATION_SERVICE};

/// Dictionary translation and language detection over MCP, paid per call via x402.
///
/// The port comes from `--port`, then `PORT`, then 3000.
#[derive(Parser)]
#[command(name = "translation-service", version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    openmesh_demo::init_tracing(&cli.serve.log_level, cli.serve.log_format)?;
    openmesh_demo::run(
        &TRANSLATION_SERVICE,
        &cli.serve,
        openmesh_demo_tools::translation_tools,
    )
    .await
}
