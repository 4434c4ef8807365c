use anyhow::Result;
use transcribe_configuration::{load_config, setup_logging};
use transcribe_setup::build_and_run;

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config()?;
    setup_logging(&config);
    build_and_run(config).await
}
