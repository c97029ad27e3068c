pub mod commands;
pub mod engine;
pub mod globalsettings;
pub mod output;
