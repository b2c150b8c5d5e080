/// Database connection management and table creation
pub mod database;

/// Application settings loaded from config.toml and the environment
pub mod settings;
