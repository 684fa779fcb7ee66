pub mod api;
pub mod automation;
pub mod caching;
pub mod finance;
pub mod food;
pub mod view;
