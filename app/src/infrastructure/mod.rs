pub mod command;
pub mod terminal;
