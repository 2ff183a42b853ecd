pub mod help;
pub mod ping;
pub mod stock;
pub mod tips;

use serenity::builder::{CreateEmbed, CreateMessage};
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::models::Notice;
use crate::utils::text::{truncate_chars, EMBED_DESCRIPTION_LIMIT};

pub async fn handle_message(ctx: &Context, msg: &Message) {
    if msg.author.bot {
        return;
    }

    // Parse command and arguments
    let parts: Vec<&str> = msg.content.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return;
    };

    let result = match command {
        "$ping" => ping::execute(ctx, msg).await,
        "$help" => help::execute(ctx, msg).await,
        "$stock" | "$quotes" => stock::execute(ctx, msg, args).await,
        "$tips" => tips::execute(ctx, msg).await,
        _ => return,
    };

    if let Err(e) = result {
        tracing::error!("❌ Error executing command {}: {}", command, e);

        let user_message = if e.contains("429") || e.contains("rate limit") {
            "⚠️ **Rate Limited**: Discord is rate limiting us. Please try again in a moment.".to_string()
        } else if e.is_empty() {
            "❌ An error occurred while executing the command.".to_string()
        } else {
            e
        };

        let embed = CreateEmbed::default()
            .title("Command Error")
            .description(truncate_chars(&user_message, EMBED_DESCRIPTION_LIMIT))
            .color(0xff0000);

        let _ = msg
            .channel_id
            .send_message(ctx, CreateMessage::default().embed(embed))
            .await;
    }
}

/// Embed for a warning or error notice
pub fn notice_embed(notice: &Notice) -> CreateEmbed {
    match notice {
        Notice::Warning(text) => CreateEmbed::default().description(text).color(0xffa500),
        Notice::Error(text) => CreateEmbed::default().description(text).color(0xff0000),
    }
}
