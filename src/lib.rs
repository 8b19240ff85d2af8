pub mod cache;
pub mod context;
pub mod controller;
pub mod marshal;
pub mod model;
pub mod rest;

pub use cache::EntityCache;
pub use context::ApplicationContext;
pub use rest::RestClient;
