//! Core types: fire records and the dispersion window

pub mod fire;
pub mod window;

pub use fire::*;
pub use window::DispersionWindow;
