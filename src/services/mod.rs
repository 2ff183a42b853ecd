pub mod chart_service;
pub mod dashboard_service;
pub mod ping_service;
pub mod quote_service;
pub mod stats_service;
pub mod tips_service;
