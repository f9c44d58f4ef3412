use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use sw_core::{config::Config, controller::InteractionController, scheduler::SweepScheduler};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub controller: Arc<InteractionController>,
    pub scheduler: SweepScheduler,
}

/// Long-poll Telegram until Ctrl-C, then stop the sweep scheduler.
pub async fn run_polling(bot: Bot, state: AppState) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => tracing::info!(
            username = %me.username(),
            sweep_interval_secs = state.cfg.sweep_interval.as_secs(),
            "sitewatch started"
        ),
        Err(e) => tracing::warn!("get_me failed: {e}"),
    }

    state.scheduler.start().await;
    let scheduler = state.scheduler.clone();

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::new(state)])
        .default_handler(|upd| async move {
            tracing::debug!(update_id = upd.id, "unhandled update");
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    scheduler.stop().await;
    tracing::info!("sitewatch stopped");
    Ok(())
}
