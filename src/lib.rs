pub mod config;
pub mod connection;
pub mod db;
pub mod logger;
pub mod model;
pub mod seed;

pub use db::{find_or_create, open, Store};
pub use seed::{ensure_seeded, SeedReport};
