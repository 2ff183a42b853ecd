use serenity::builder::{CreateAttachment, CreateEmbed, CreateMessage};
use serenity::model::channel::Message;
use serenity::prelude::Context;
use tracing::{debug, info};

use crate::models::TipsPanel;
use crate::services::dashboard_service;
use crate::utils::table::MAX_CELL_CHARS;
use crate::utils::text::{join_lines_within, truncate_chars, EMBED_FIELD_LIMIT};
use crate::ChartSizeKey;

/// Largest upload accepted for analysis
const MAX_UPLOAD_BYTES: u64 = 8 * 1024 * 1024;

pub async fn execute(ctx: &Context, msg: &Message) -> Result<(), String> {
    let Some(attachment) = msg.attachments.first() else {
        // Panel stays inactive until a file is uploaded
        let embed = CreateEmbed::default()
            .title("💰 Tips analysis")
            .description("Attach a CSV file to `$tips` to analyse it.\nRequired columns: `total_bill, tip, sex, smoker, day, time, size`")
            .color(0x00b0f4);
        msg.channel_id
            .send_message(ctx, CreateMessage::default().embed(embed))
            .await
            .map_err(|e| format!("Failed to send message: {}", e))?;
        return Ok(());
    };

    if !attachment.filename.to_lowercase().ends_with(".csv") {
        return Err("❌ Please upload a `.csv` file.".to_string());
    }
    if attachment.size as u64 > MAX_UPLOAD_BYTES {
        return Err(format!(
            "❌ File too large ({} bytes). The limit is {} bytes.",
            attachment.size, MAX_UPLOAD_BYTES
        ));
    }
    info!("Tips panel requested by {} with {}", msg.author.name, attachment.filename);

    let size = {
        let data = ctx.data.read().await;
        data.get::<ChartSizeKey>().copied().unwrap_or_default()
    };

    let _ = msg.channel_id.broadcast_typing(&ctx.http).await;

    let upload = attachment
        .download()
        .await
        .map_err(|e| format!("Failed to download attachment: {}", e))?;

    // Chart rendering is CPU bound
    let panel = tokio::task::spawn_blocking(move || dashboard_service::tips_panel(Some(upload.as_slice()), size))
        .await
        .map_err(|e| format!("Tips analysis task failed: {}", e))?
        .map_err(|e| format!("❌ {}", e))?;

    let Some(panel) = panel else {
        return Ok(());
    };

    msg.channel_id
        .send_message(ctx, tips_message(&panel))
        .await
        .map_err(|e| format!("Failed to send tips panel: {}", e))?;

    Ok(())
}

fn tips_message(panel: &TipsPanel) -> CreateMessage {
    // code fence takes 8 of the field's characters
    let means = join_lines_within(
        panel
            .mean_tip_by_day
            .iter()
            .map(|(day, mean)| format!("{}: {:.2}", truncate_chars(day, MAX_CELL_CHARS), mean)),
        EMBED_FIELD_LIMIT - 8,
    );

    let summary = CreateEmbed::default()
        .title("💰 Tips analysis")
        .description(format!("**Loaded data**\n{}", panel.preview.render()))
        .field("Rows", panel.table.len().to_string(), true)
        .field("Average tip by day", format!("```\n{}\n```", means), true)
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
