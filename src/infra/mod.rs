pub mod chart;
pub mod feed;
