pub mod config;
pub mod db;
pub mod error;
pub mod polar;
pub mod reports;
pub mod server;
pub mod utils;

pub use error::MeetmindError;
pub use server::{AppState, meetmind_router};
