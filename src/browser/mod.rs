mod chrome;
mod locator;
mod page;
mod session;
mod wait;

#[cfg(test)]
pub(crate) mod fake;

pub use self::chrome::*;
pub use self::locator::*;
pub use self::page::*;
pub use self::session::*;
pub use self::wait::*;
