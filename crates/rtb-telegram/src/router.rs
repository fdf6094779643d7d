use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::sync::Mutex;
use tracing::info;

use rtb_core::{
    config::Config,
    dispatch::AdminDispatcher,
    domain::{ChatId, UserId},
    messaging::port::MessagingPort,
    relay::RelayService,
    session::ReplySession,
    storage::port::StoragePort,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub relay: Arc<RelayService>,
    pub dispatcher: Arc<AdminDispatcher>,
    /// Sequentializes update processing: one inbound event runs to
    /// completion before the next starts.
    pub worker_lock: Arc<Mutex<()>>,
}

pub async fn run_polling(cfg: Arc<Config>, storage: Arc<dyn StoragePort>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!("relay bot started: @{}", me.username());
    }
    info!(admin = cfg.admin_user_id, "forwarding to administrator");

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let session = Arc::new(ReplySession::new());
    let relay = Arc::new(RelayService::new(
        ChatId(cfg.admin_user_id),
        storage.clone(),
        messenger.clone(),
        session.clone(),
    ));
    let dispatcher = Arc::new(AdminDispatcher::new(
        UserId(cfg.admin_user_id),
        cfg.history_limit,
        storage,
        messenger.clone(),
        session,
    ));

    let state = Arc::new(AppState {
        cfg,
        messenger,
        relay,
        dispatcher,
        worker_lock: Arc::new(Mutex::new(())),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
