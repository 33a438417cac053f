/// Cadenza - media library, queue and playlist manager
use cadenza_cli::{commands, App, CadenzaConfig, Cli};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadenza=info,cadenza_cli=info,cadenza_playback=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = CadenzaConfig::load(cli.config.as_deref())?;
    let app = App::open(&config).await?;

    let mut stdout = std::io::stdout().lock();
    let outcome = commands::run(&app, cli.command, &mut stdout).await;

    // the session is written even when the command failed halfway
    if let Err(err) = app.close().await {
        tracing::warn!(error = %err, "Failed to save session");
    }

    outcome?;
    Ok(())
}
