use std::sync::Arc;

use sw_core::{
    artifacts::ArtifactStore,
    config::Config,
    controller::InteractionController,
    registry::SiteRegistry,
    scheduler::SweepScheduler,
    services::{Services, Timeouts},
    session::ChatSessions,
    store::JsonFileStore,
};
use sw_inspect::HttpPageInspector;
use sw_screenshot::{ChromiumConfig, ChromiumScreenshotter};
use sw_telegram::{
    router::{run_polling, AppState},
    TelegramMessenger,
};
use teloxide::Bot;

#[tokio::main]
async fn main() -> Result<(), sw_core::Error> {
    sw_core::logging::init("sitewatch")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        data_file = %cfg.data_file.display(),
        screenshots = %cfg.screenshots_dir.display(),
        chromium = %cfg.chromium_path.display(),
        "configuration loaded"
    );

    let artifacts = Arc::new(ArtifactStore::new(cfg.screenshots_dir.clone()));
    artifacts.ensure_dir().await?;

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let services = Services {
        registry: Arc::new(SiteRegistry::new(Arc::new(JsonFileStore::new(
            cfg.data_file.clone(),
        )))),
        inspector: Arc::new(HttpPageInspector::new(
            &cfg.http_user_agent,
            cfg.inspect_timeout,
        )?),
        screenshotter: Arc::new(ChromiumScreenshotter::new(ChromiumConfig::from_config(&cfg))),
        artifacts,
        messenger: Arc::new(TelegramMessenger::new(bot.clone())),
        sessions: Arc::new(ChatSessions::new()),
        timeouts: Timeouts::from_config(&cfg),
    };

    let state = AppState {
        cfg: cfg.clone(),
        controller: Arc::new(InteractionController::new(services.clone())),
        scheduler: SweepScheduler::new(services, cfg.sweep_interval),
    };

    run_polling(bot, state)
        .await
        .map_err(|e| sw_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
