pub mod models;
pub mod oracle;
pub mod registry;
pub mod repositories;
pub mod services;

pub use services::evolution::Service;
