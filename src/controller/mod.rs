pub use error::*;
pub use facade::Controller;
pub use mode::*;
pub use points::*;
pub use ranking::*;

mod error;
mod facade;
mod mode;
mod points;
mod ranking;
