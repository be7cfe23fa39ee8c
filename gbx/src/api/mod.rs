pub use callbacks::*;
pub use calls::*;
pub use structs::*;

mod callbacks;
mod calls;
pub mod structs;
