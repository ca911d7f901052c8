pub mod agent;
pub mod api;
pub mod config;
pub mod core;
pub mod db;
pub mod deck;
pub mod error;
pub mod llm;
pub mod logger;
pub mod mcp;
pub mod models;
pub mod repositories;
pub mod services;
pub mod tools;
