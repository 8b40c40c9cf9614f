pub mod config;
pub mod scene;
pub mod simulate;
