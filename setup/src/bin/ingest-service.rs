use anyhow::Result;
use ingest_configuration::{load_config, load_dotenv, setup_logging};
use ingest_setup::build_and_run;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_path = load_dotenv();
    let config = load_config()?;
    setup_logging(&config);
    if let Some(path) = dotenv_path {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }

    let server_config = config.server.clone();
    build_and_run(config, server_config).await?;
    Ok(())
}
