pub mod catalog;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod executor;
pub mod gateway;
pub mod issuer;
pub mod orchestrator;
pub mod poll;
pub mod secure_fs;
pub mod vault;
