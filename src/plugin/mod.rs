pub mod activation;
pub mod manager;
pub mod manifest;

pub use manager::PluginManager;
