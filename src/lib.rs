pub mod api;
pub mod cache;
pub mod config;
pub mod connections;
pub mod fetcher;
pub mod humanize;
pub mod observability;
pub mod registry;
pub mod scheduler;
pub mod service;
pub mod upstream;
