use std::io::{self, Write};

use anyhow::Error;

pub fn print_error(err: &Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "error: {}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  caused by: {}", cause);
        source = cause.source();
    }
    for hint in hints(err) {
        let _ = writeln!(stderr, "  hint: {}", hint);
    }
}

fn hints(err: &Error) -> Vec<&'static str> {
    use crystalnets::io::Error as IoError;
    use crystalnets::topology::Error as TopologyError;

    if let Some(io_err) = err.downcast_ref::<IoError>() {
        return match io_err {
            IoError::Io { source } if source.kind() == io::ErrorKind::NotFound => {
                vec!["check that the input path exists and is readable"]
            }
            IoError::Parse { .. } => {
                vec!["inspect the file near the reported line for malformed records"]
            }
            IoError::MissingAtomInformation(_) => {
                vec!["the CIF needs _atom_site_label and _atom_site_fract_x/y/z columns"]
            }
            IoError::ArchiveFormat { .. } | IoError::ArchiveVersion(_) => {
                vec!["archives are 'key <genome>' / 'id <name>' records; regenerate with a matching version"]
            }
            _ => Vec::new(),
        };
    }
    if let Some(crystalnets::Error::Topology(TopologyError::NonPeriodic)) =
        err.downcast_ref::<crystalnets::Error>()
    {
        return vec!["the structure is molecular; crystal-net identification needs a periodic framework"];
    }
    Vec::new()
}
