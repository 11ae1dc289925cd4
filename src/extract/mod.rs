mod extractor;
mod listing;

pub use self::extractor::*;
pub use self::listing::*;
