pub mod advisor;
pub mod data_feed;
pub mod store;
