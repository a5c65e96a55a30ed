pub mod add;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit;
pub mod entries;
pub mod recent;
pub mod stats;
pub mod transactions;
