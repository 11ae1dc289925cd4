mod harvester;
mod profile;

pub use self::harvester::*;
pub use self::profile::*;
