use serenity::builder::CreateEmbed;
use serenity::model::channel::Message;
use serenity::prelude::Context;

use crate::models::{Period, SYMBOL};

pub async fn execute(ctx: &Context, msg: &Message) -> Result<(), String> {
    let embed = CreateEmbed::default()
        .title("📖 FINBOARD Commands Help")
        .description("**FINBOARD** - stock quotes and tips statistics, recomputed on every command.")
        .color(0x00b0f4)
        .field(
            "🎯 General",
            "`$ping` - Check bot latency\n`$help` - Show this help message",
            false,
        )
        .field(
            "📈 Stock Quotes",
            format!(
                "`$stock [period]` - {} price and volume charts with CSV download\nPeriods: {} (default: {})",
                SYMBOL,
                Period::accepted_values(),
                Period::default()
            ),
            false,
        )
        .field(
            "💰 Tips Analysis",
            "`$tips` with a CSV attachment - five descriptive charts with PNG download\nRequired columns: total_bill, tip, sex, smoker, day, time, size",
            false,
        );

    msg.channel_id
        .send_message(ctx, serenity::builder::CreateMessage::default().embed(embed))
        .await
        .map_err(|e| format!("Failed to send help message: {}", e))?;

    Ok(())
}
