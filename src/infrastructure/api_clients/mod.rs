//! HTTP clients for the upstream price sources

mod http_price_feed;

pub use http_price_feed::HttpPriceFeed;
