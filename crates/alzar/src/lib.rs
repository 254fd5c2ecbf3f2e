//! Alzar - a shared reading log with similar-work recommendations
//!
//! Readers submit the literary works they have read together with genre,
//! emotion tags and a short opinion. Stored works can be listed or searched
//! with comma separated mood terms; matches are ranked by embedding cosine
//! similarity, optionally blended with keyword overlap.

pub mod activity;
pub mod cache;
pub mod commands;
pub mod config;
pub mod display;
pub mod embedding;
pub mod error;
pub mod library;
pub mod ranker;
pub mod record;
pub mod server;
pub mod similarity;
pub mod store;
