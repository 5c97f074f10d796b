#[tokio::main]
async fn main() -> mention_reply_bot::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("mention_reply_bot=info"),
    )
    .init();
    log::info!("Starting mention reply bot");

    match mention_reply_bot::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {}", e);
            Err(e)
        }
    }
}
