//! Data models for FINBOARD commands and services
//!
//! Quote and tips records, plus the panel structs that describe what a
//! command should post back.

pub mod quote;
pub mod tips;
pub mod panel;
pub mod ping;

pub use quote::{Period, QuoteRecord, QuoteTable, SYMBOL};
pub use tips::{TipRecord, TipsTable};
pub use panel::{ChartImage, Download, Notice, StockPanel, TipsPanel};
pub use ping::PingMetrics;
