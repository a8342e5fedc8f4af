pub mod app;
pub mod render;
pub mod settings;
pub mod settings_io;
pub mod transcript_io;
