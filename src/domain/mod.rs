pub mod actor;
pub mod rules;
pub mod tile;
