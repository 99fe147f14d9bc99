mod handler;
pub mod model;

pub use handler::{check_setup, login, logout, me, register};
