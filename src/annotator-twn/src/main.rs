use core_twn::{
    LlmProvider, NewsApiClient,
    llms::ChatCompletionProvider,
    number_from_env, setup_logging,
};

use annotator_twn::{Annotator, work::DEFAULT_BATCH_SIZE};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file., if it exists
    dotenvy::dotenv().ok();

    setup_logging("annotator_twn=info,core_twn=info");

    let provider = ChatCompletionProvider::from_env().unwrap_or_else(|e| panic!("Invalid LLM configuration: {}", e));
    let model = provider.model();

    match provider.list_models().await {
        Ok(models) => tracing::info!("Chat endpoint offers models: {:?}", models),
        Err(e) => tracing::warn!("Couldn't list models from the chat endpoint: {}", e),
    }

    let api = NewsApiClient::from_env().unwrap_or_else(|e| panic!("Couldn't configure the API client: {}", e));
    let batch_size: i64 = number_from_env("AI_BATCH_SIZE", DEFAULT_BATCH_SIZE).unwrap_or_else(|e| panic!("{}", e));

    tracing::info!(
        "Annotating with {} in batches of {} through {}",
        model.model_name(),
        batch_size,
        api.base_url()
    );

    let annotator = Annotator::new(api, provider, model, batch_size);
    match annotator.run().await {
        Ok(summary) => tracing::info!("Annotation run done: {:?}", summary),
        Err(e) => {
            tracing::error!("Annotation run stopped: {}", e);
            std::process::exit(1);
        }
    }
}
