mod client;

pub use client::FeedApiClient;
