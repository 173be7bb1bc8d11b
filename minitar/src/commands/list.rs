use std::path::Path;

use minitar_format::{Entry, TarFileReader};

use crate::error::{Error, Result};
use crate::util::{format_mode, format_size, format_time};

pub fn run(archive: &Path, verbose: bool) -> Result<()> {
    let wrap = |source: minitar_format::Error| Error::ListArchive {
        path: archive.to_path_buf(),
        source,
    };

    if !verbose {
        // Names are collected first so a corrupt archive prints nothing
        for name in minitar_format::list(archive).map_err(wrap)? {
            println!("{}", name);
        }
        return Ok(());
    }

    let entries = TarFileReader::open(archive)
        .and_then(TarFileReader::entries)
        .map_err(wrap)?;
    list_long(&entries);
    Ok(())
}

fn list_long(entries: &[Entry]) {
    for entry in entries {
        let header = &entry.header;
        println!(
            "{}  {:<17}  {:>10}  {:<20}  {}",
            format_mode(header),
            format!("{}/{}", header.uname, header.gname),
            format_size(header.size),
            format_time(header.mtime),
            header.name,
        );
    }
}
