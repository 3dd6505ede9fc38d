mod arguments;
mod base;
mod commands;
mod completion;
mod context;
mod flags;
mod interface;
mod middleware;
mod printer;

pub use base::*;
pub use context::*;
pub(crate) use interface::*;
pub use middleware::*;

