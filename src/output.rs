use csv::{ReaderBuilder, WriterBuilder};
use log::{info, warn};
use std::fs::File;
use std::io;
use std::path::Path;

use crate::collections::ListingDb;
use crate::error::Error;
use crate::extract::Listing;

/// Write all listings to a csv file (overwritten if it already exists);
/// returns the number of rows written. The header is written even when there
/// are no listings.
pub fn write_listings<P: AsRef<Path>>(path: P, listings: &ListingDb) -> Result<usize, Error> {
    let mut w = WriterBuilder::new()
        .has_headers(false)
        .from_path(path.as_ref())?;
    w.write_record(Listing::HEADERS)?;
    let mut rows = 0;
    for listing in listings.iter() {
        w.serialize(&listing)?;
        rows += 1;
    }
    w.flush()?;
    info!("wrote {} listings to {}", rows, path.as_ref().display());
    Ok(rows)
}

/// Read listings from a csv file previously written by `write_listings`;
/// rows that cannot be read are skipped.
pub fn read_listings<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>, Error> {
    let file = File::open(path.as_ref())?;
    let mut r = ReaderBuilder::new().from_reader(file);
    let mut listings: Vec<Listing> = Vec::new();
    for row in r.deserialize::<Listing>() {
        match row {
            Ok(listing) => listings.push(listing),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => warn!(
                "skipping unreadable row in {}: {}",
                path.as_ref().display(),
                e
            ),
        }
    }
    Ok(listings)
}

/// Populate the listing db from an existing output file; returns the number
/// of listings added. A missing file is not fatal, any other failure is since
/// the file would be overwritten at the end of the run.
pub fn fill_listingdb_from_file<P: AsRef<Path>>(
    db: &mut ListingDb,
    path: P,
) -> Result<usize, Error> {
    match read_listings(path.as_ref()) {
        Err(Error::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
            warn!("no previous listings at {}", path.as_ref().display());
            warn!("...continuing without previous listings");
            Ok(0)
        }
        Err(e) => Err(e),
        Ok(listings) => {
            let n = listings.into_iter().filter(|l| db.insert(l.clone())).count();
            info!("loaded {} previous listings", n);
            Ok(n)
        }
    }
}
