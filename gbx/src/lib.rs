pub use adapter::*;
pub use api::*;

mod adapter;
mod api;
