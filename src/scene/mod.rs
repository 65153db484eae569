pub mod keys;
pub mod model;
