use anyhow::Result;
use tracing::info;

use newsbrief::api::{self, AppState};
use newsbrief::config::Config;
use newsbrief::gdelt::GdeltClient;
use newsbrief::logging::configure_logging;
use newsbrief::LLMParams;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    configure_logging();

    let config = Config::from_env()?;

    info!(
        "Starting newsbrief with model {} (temperature {})",
        config.model, config.temperature
    );

    let state = AppState {
        gdelt: GdeltClient::new(config.gdelt_base_url.clone())?,
        llm: LLMParams {
            llm_client: config.llm_client.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        },
        selector: config.selector,
    };

    api::serve(state, config.port).await
}
