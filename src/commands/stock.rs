use serenity::builder::{CreateAttachment, CreateEmbed, CreateMessage};
use serenity::model::channel::Message;
use serenity::prelude::Context;
use tracing::{debug, info};

use crate::models::{Period, StockPanel};
use crate::services::dashboard_service::{self, StockOutcome};
use crate::{ChartSizeKey, QuoteSourceKey};

pub async fn execute(ctx: &Context, msg: &Message, args: &[&str]) -> Result<(), String> {
    let period = match args.first() {
        Some(arg) => arg.parse::<Period>()?,
        None => Period::default(),
    };
    info!("Stock panel requested by {} for period {}", msg.author.name, period);

    let (source, size) = {
        let data = ctx.data.read().await;
        let source = data
            .get::<QuoteSourceKey>()
            .cloned()
            .ok_or("Quote provider not initialized")?;
        let size = data.get::<ChartSizeKey>().copied().unwrap_or_default();
        (source, size)
    };

    let _ = msg.channel_id.broadcast_typing(&ctx.http).await;

    let outcome = dashboard_service::stock_panel(&source, period, size)
        .await
        .map_err(|e| format!("❌ Failed to build the stock panel: {}", e))?;

    let message = match outcome {
        StockOutcome::Unavailable(notices) => {
            debug!("Sending {} notices", notices.len());
            CreateMessage::default().embeds(notices.iter().map(super::notice_embed).collect())
        }
        StockOutcome::Ready(panel) => stock_message(&panel, period),
    };

    msg.channel_id
        .send_message(ctx, message)
        .await
        .map_err(|e| format!("Failed to send stock panel: {}", e))?;

    Ok(())
}

fn stock_message(panel: &StockPanel, period: Period) -> CreateMessage {
    let summary = CreateEmbed::default()
        .title(format!("📈 Apple ({}) quotes - {}", panel.table.symbol, period))
        .description(format!("**Loaded data**\n{}", panel.preview.render()))
        .field("Rows", panel.table.records.len().to_string(), true)
        .field("Download", format!("`{}`", panel.download.file_name), true)
        .color(0x00b0f4);

    let mut embeds = vec![summary];
    let mut files = Vec::with_capacity(panel.charts.len() + 1);
    for chart in &panel.charts {
        embeds.push(
            CreateEmbed::default()
                .title(&chart.title)
                .image(format!("attachment://{}", chart.file_name))
                .color(0x00b0f4),
        );
        files.push(CreateAttachment::bytes(chart.png.clone(), chart.file_name.clone()));
    }

    debug!(
        "Attaching {} ({}, {} bytes)",
        panel.download.file_name,
        panel.download.mime,
        panel.download.data.len()
    );
    files.push(CreateAttachment::bytes(
        panel.download.data.clone(),
        panel.download.file_name.clone(),
    ));

    CreateMessage::default().embeds(embeds).add_files(files)
}
