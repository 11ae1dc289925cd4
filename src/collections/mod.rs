mod listingdb;

pub use self::listingdb::*;
