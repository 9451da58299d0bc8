pub mod constants;
pub mod engine;
pub mod highscore_store;
pub mod maze;
pub mod rng;
pub mod server_utils;
pub mod types;
