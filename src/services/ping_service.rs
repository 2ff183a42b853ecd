use serenity::prelude::*;
use std::time::Instant;

use crate::models::PingMetrics;

pub async fn get_ping_metrics(ctx: &Context, start_time: Instant) -> PingMetrics {
    let response_latency = start_time.elapsed().as_millis() as u64;

    let data = ctx.data.read().await;
    let uptime = data
        .get::<crate::BotData>()
        .map(|started| format_uptime(started.elapsed().as_secs()))
        .unwrap_or_else(|| "Unknown".to_string());
    let quote_provider = data
        .get::<crate::QuoteSourceKey>()
        .map(|source| source.name().to_string())
        .unwrap_or_else(|| "Not configured".to_string());

    PingMetrics {
        response_latency,
        uptime,
        quote_provider,
    }
}

pub fn format_uptime(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

pub fn create_ping_embed(metrics: &PingMetrics) -> serenity::builder::CreateEmbed {
    serenity::builder::CreateEmbed::default()
        .title("Pong! 🏓")
        .field("Response Latency", format!("{}ms", metrics.response_latency), true)
        .field("Uptime", &metrics.uptime, true)
        .field("Quote Provider", &metrics.quote_provider, false)
        .color(0x00b0f4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0h 0m 0s");
        assert_eq!(format_uptime(3723), "1h 2m 3s");
        assert_eq!(format_uptime(90_000), "25h 0m 0s");
    }
}
