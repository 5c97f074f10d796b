pub mod config;
pub mod error;
pub mod generator;
pub mod openrouter;
pub mod pipeline;
pub mod store;
pub mod twitter;
pub mod types;

#[cfg(test)]
mod testing;

use std::future::Future;
use std::time::Duration;

use log::{debug, error, info};
use tokio::time::{MissedTickBehavior, interval};

use config::Config;
use error::Result;
use generator::ReplyGenerator;
use openrouter::OpenRouterClient;
use pipeline::MentionPipeline;
use store::ReplyStoreBackend;
use twitter::TwitterClient;

/// Run the reply bot until interrupted, one polling cycle per interval.
///
/// Cycles never overlap: each run is awaited before the next tick. Ctrl-C
/// stops the loop, interrupting a run in progress.
///
/// # Errors
///
/// Returns an error if the configuration or the reply store cannot be set
/// up. Errors inside a cycle are logged and the next cycle proceeds.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Initializing clients");
    let twitter = TwitterClient::new(config.twitter.clone());
    let generator = ReplyGenerator::new(
        OpenRouterClient::new(
            config.openrouter.api_key.clone(),
            config.openrouter.model.clone(),
        ),
        config.openrouter.system_prompt.clone(),
        config.openrouter.temperature,
    );
    let store = ReplyStoreBackend::from_config(&config.store).await?;
    let pipeline = MentionPipeline::new(twitter, generator, store, config.pipeline);

    info!(
        "Polling for mentions every {}s",
        config.poll_interval.as_secs()
    );

    let pipeline = &pipeline;
    poll_until(config.poll_interval, shutdown_signal(), move || async move {
        if let Err(e) = pipeline.run().await {
            error!("Job failed: {e}");
        }
    })
    .await;

    info!("Shutdown signal received, shutting down...");
    Ok(())
}

/// Resolves on Ctrl-C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

/// Run `cycle` once per `period` until `shutdown` resolves. A cycle in
/// progress is dropped when shutdown arrives.
async fn poll_until<F, Fut>(period: Duration, shutdown: impl Future<Output = ()>, mut cycle: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            () = cycle() => {}
        }
    }
}
