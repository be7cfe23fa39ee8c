pub use gbx::Calls as Server;
pub use gbx::{Callback as ServerEvent, *};
pub use replay::*;

mod replay;
