use clap::Parser;

use skillhub_client::ClientConfig;

mod app;
mod cli;

use app::App;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skillhub_observability::init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    let app = App::connect(config).await?;
    let output = app.run(cli.command).await?;
    println!("{output}");

    Ok(())
}
