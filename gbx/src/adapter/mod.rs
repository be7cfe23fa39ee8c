pub use callbacks::*;

mod callbacks;
