use clap::Parser;
use signatom_relay::{Args, run};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("signatom_relay={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = args.host.clone();
    let port = args.port;
    let config = args.into_config()?;

    if config.keyless.is_none() {
        tracing::warn!("no identity token configured, keyless endpoints are disabled");
    }

    run(host, port, config).await
}
