pub mod config;
pub mod error;
pub mod output;
pub mod state;


pub use config::*;
pub use error::*;
pub use output::*;
pub use state::*;
