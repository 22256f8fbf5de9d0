pub mod actions;
pub mod terminal;
