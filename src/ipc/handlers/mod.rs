pub mod board;
pub mod core;
pub mod session;
pub mod sheet;
