mod atomic;
mod interface;
mod lock;
mod snowflake;
mod state;
#[cfg(test)]
mod tests;
mod wait;

pub use atomic::*;
pub use interface::*;
pub use lock::*;
pub use snowflake::*;
pub use state::*;
pub use wait::*;
