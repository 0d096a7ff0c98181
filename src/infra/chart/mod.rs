mod client;

pub use client::{ChartApiClient, DEFAULT_CHART_URL};
