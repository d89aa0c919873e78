pub mod activity;
pub mod client;
pub mod config;
pub mod context;
pub mod detail;
pub mod endpoint;
pub mod humanize;
pub mod observability;
pub mod response;
pub mod search;
pub mod store;
