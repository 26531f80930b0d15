pub mod attribution_fetcher;
pub mod nats_feed;

pub use attribution_fetcher::*;
pub use nats_feed::*;
