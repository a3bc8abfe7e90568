use anyhow::{Context, Result};
use log::info;
use rusqlite::Connection;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use tokio::sync::Mutex;

use comprobantes::bot::{message_handler, AppContext};
use comprobantes::db;
use comprobantes::fonts::FontResolver;
use comprobantes::layout::LayoutVariant;
use comprobantes::templates::TemplateStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    info!("Starting Comprobantes Telegram Bot");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let bot_token = env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN must be set")?;
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    // Template paths, one per layout variant. A load failure here is fatal:
    // without templates no receipt can be generated.
    let mut template_paths = HashMap::new();
    template_paths.insert(
        LayoutVariant::Standard,
        PathBuf::from(env::var("TEMPLATE_STANDARD").unwrap_or_else(|_| "template.jpg".into())),
    );
    template_paths.insert(
        LayoutVariant::KeyedAlias,
        PathBuf::from(env::var("TEMPLATE_LLAVE").unwrap_or_else(|_| "template_llave.jpg".into())),
    );
    let templates = TemplateStore::load(&template_paths).context("Failed to load templates")?;

    let admin_chat_id = env::var("ADMIN_CHAT_ID")
        .ok()
        .and_then(|s| s.parse::<i64>().ok());
    if admin_chat_id.is_none() {
        info!("ADMIN_CHAT_ID not set, admin commands disabled");
    }

    info!("Initializing database at: {}", database_url);
    let conn = Connection::open(&database_url)?;
    db::init_schema(&conn)?;

    let ctx = Arc::new(AppContext {
        templates,
        fonts: FontResolver::new(),
        conn: Arc::new(Mutex::new(conn)),
        admin_chat_id,
    });

    let bot = Bot::new(bot_token);

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry().branch(Update::filter_message().endpoint({
        let ctx = Arc::clone(&ctx);
        move |bot: Bot, msg: Message| {
            let ctx = Arc::clone(&ctx);
            async move { message_handler(bot, msg, ctx).await }
        }
    }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
