#[tokio::main]
async fn main() -> moodytunes::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("moodytunes=info,serenity=warn"),
    )
    .init();

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        log::debug!("TLS crypto provider already installed");
    }

    log::info!("Starting moodytunes Discord bot");

    match moodytunes::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}
