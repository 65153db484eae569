pub mod parts;
pub mod store;
