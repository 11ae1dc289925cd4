mod args;
mod helpers;

pub use self::args::*;
pub use self::helpers::*;
