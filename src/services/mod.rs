pub mod chart_source;
pub mod ratings_feed;
