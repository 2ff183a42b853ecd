use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

mod api;
mod commands;
mod config;
mod models;
mod services;
mod utils;

use api::QuoteSource;
use config::{ChartSize, Config};

struct Handler;

struct BotData;

impl TypeMapKey for BotData {
    type Value = Instant;
}

struct QuoteSourceKey;

impl TypeMapKey for QuoteSourceKey {
    type Value = QuoteSource;
}

struct ChartSizeKey;

impl TypeMapKey for ChartSizeKey {
    type Value = ChartSize;
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        commands::handle_message(&ctx, &msg).await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        debug!("Checking Discord rate limit status...");
        match ctx.http.get_current_user().await {
            Ok(_) => {
                info!("No rate limit detected - Bot is fully ready!");
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("429") || error_msg.contains("rate limit") || error_msg.contains("Ratelimited") {
                    warn!("Bot is being rate limited by Discord! Error: {}", error_msg);
                } else {
                    warn!("Failed to check rate limit status: {}", error_msg);
                }
            }
        }
    }
}

fn log_filter() -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    ["finboard=debug", "serenity=warn"]
        .into_iter()
        .filter_map(|d| d.parse::<Directive>().ok())
        .fold(filter, |f, directive| f.add_directive(directive))
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("📈 Starting FINBOARD v{}...", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let source = match QuoteSource::from_config(&config) {
        Ok(s) => {
            info!("Quote provider: {}", s.name());
            s
        }
        Err(e) => {
            error!("Failed to initialize quote provider: {}", e);
            return;
        }
    };
    debug!("Chart size: {}x{}", config.chart_size.width, config.chart_size.height);

    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MESSAGES;

    let mut client = match Client::builder(&config.discord_token, intents)
        .event_handler(Handler)
        .await
    {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create client: {}", e);
            return;
        }
    };

    // Store the start time, quote provider and chart size in client data
    {
        let mut data = client.data.write().await;
        data.insert::<BotData>(Instant::now());
        data.insert::<QuoteSourceKey>(source);
        data.insert::<ChartSizeKey>(config.chart_size);
    }

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }
}
