mod config;
mod error;
mod generator;
mod id;
mod mutex;
mod status;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::status::*;
pub use crate::time::*;
