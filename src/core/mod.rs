pub mod comic;
pub mod config;
pub mod error;
pub mod io;
pub mod session;
