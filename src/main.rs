use lexgate::config::Config;
use lexgate::domain::call::context::InboundCall;
use lexgate::domain::call::notification::SessionNotification;
use lexgate::infrastructure::loopback::{LoopbackMediaServer, LoopbackSynthesizer, PlayMode};
use lexgate::interface::metrics::init_metrics;
use lexgate::LexBridge;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    // Initialize tracing; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Lexgate");
    info!("Configuration loaded:\n{}", config.render()?);

    let session_config = config.session_config()?;

    if let Some(listen) = config.metrics.listen {
        init_metrics(listen)?;
    }

    // No media server client ships with this binary; calls run against the
    // in-process loopback server
    let media = LoopbackMediaServer::new(PlayMode::Simulated { time_scale: 1.0 });
    let synthesizer = Arc::new(LoopbackSynthesizer::in_temp_dir());
    let bridge = LexBridge::new(session_config, Arc::new(media.clone()), synthesizer);

    demo_call(&bridge, &media).await?;

    info!("Lexgate initialized successfully, press Ctrl-C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");

    Ok(())
}

/// Drive one call through a short conversation
async fn demo_call(bridge: &LexBridge, media: &LoopbackMediaServer) -> anyhow::Result<()> {
    info!("=== Bot Session Demo ===");

    let call = InboundCall::new(
        Some("Alice".to_string()),
        "15085551212",
        "18005551000",
        uuid::Uuid::new_v4().to_string(),
    );
    let handle = bridge.handle_inbound_call(call).await?;
    let mut notifications = handle.subscribe();

    let Some(loopback) = media.last_call() else {
        anyhow::bail!("loopback media server did not bridge the call");
    };
    let endpoint = loopback.endpoint;

    endpoint.emit(
        "lex::transcription",
        json!({"transcriptions": [{"transcription": "I want to order flowers"}]}),
    );
    endpoint.emit(
        "lex::text_response",
        json!({"messages": [{"type": "PlainText", "msg": "What kind of flowers would you like?"}]}),
    );
    endpoint.press("1");
    endpoint.emit(
        "lex::intent",
        json!({"sessionState": {"dialogAction": {"type": "Close"}, "intent": {"name": "OrderFlowers"}}}),
    );

    let waited = tokio::time::timeout(Duration::from_secs(10), async {
        while let Ok(notification) = notifications.recv().await {
            if let SessionNotification::Terminated(report) = notification {
                return Some(report);
            }
        }
        None
    })
    .await;

    match waited {
        Ok(Some(report)) => info!(
            removed = report.removed,
            failed = report.failed,
            "Demo session terminated"
        ),
        Ok(None) => warn!("Demo session closed without a terminated notification"),
        Err(_) => {
            warn!("Demo session still running, hanging up");
            handle.hangup();
        }
    }

    handle.closed().await?;
    info!("=== Bot Session Demo Complete ===");
    Ok(())
}
