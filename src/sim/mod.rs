pub mod event;
pub mod level;
pub mod oracle;
pub mod serializer;
pub mod world;
