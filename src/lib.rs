pub mod config;
pub mod conversation;
pub mod gateway;
pub mod guardian;
pub mod io_struct;
pub mod logging;
pub mod models;
pub mod persona;
pub mod race;
pub mod server;
pub mod session;
