mod decoder;
mod identity;
mod layout;
mod snowflake;

pub use decoder::*;
pub use identity::*;
pub use layout::*;
pub use snowflake::*;
