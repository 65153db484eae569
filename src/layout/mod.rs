pub mod engine;
pub mod packer;
