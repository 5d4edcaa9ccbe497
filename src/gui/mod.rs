pub mod app;
pub mod controller;


pub use app::*;
pub use controller::*;
