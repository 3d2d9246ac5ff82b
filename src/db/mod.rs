pub mod enums;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;
