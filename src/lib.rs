//! Page through a directory website in a browser, open each listing's detail
//! popup, and collect the unique listings found.
pub mod browser;
pub mod cli;
pub mod collections;
pub mod extract;
pub mod harvest;
pub mod output;

mod error;
mod shutdown;

pub use crate::error::Error;
pub use crate::shutdown::Shutdown;
