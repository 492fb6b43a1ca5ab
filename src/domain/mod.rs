pub mod device;
pub mod errors;
pub mod models;
pub mod platform;
pub mod registry;
pub mod report;
pub mod role;
pub mod settings;
