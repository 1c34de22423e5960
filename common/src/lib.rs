pub mod data;
pub mod payloads;
pub mod validate;
