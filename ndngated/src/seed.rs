use std::fs;
use std::path::Path;

use log::{debug, warn};

use ndngate_core::{EntryStatus, Name};
use ndngate_engine::FibTable;

/// Apply a line-oriented FIB status seed file: `<uri> <status>` per line,
/// `#` comments and blank lines skipped. Lines naming unknown entries or
/// statuses are logged and skipped; a bad line never aborts the load.
/// Returns the number of entries updated.
pub fn apply_seed_file<P: AsRef<Path>>(
    table: &mut FibTable,
    path: P,
    now: u64,
) -> Result<usize, Box<dyn std::error::Error>> {
    let contents = fs::read_to_string(&path)?;
    Ok(apply_seed_lines(table, &contents, now))
}

fn apply_seed_lines(table: &mut FibTable, contents: &str, now: u64) -> usize {
    let mut applied = 0;

    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (uri, status_str) = match (fields.next(), fields.next()) {
            (Some(uri), Some(status)) => (uri, status),
            _ => {
                warn!("Seed file line {}: expected '<uri> <status>'", line_no + 1);
                continue;
            }
        };

        let status: EntryStatus = match status_str.parse() {
            Ok(status) => status,
            Err(_) => {
                warn!(
                    "Seed file line {}: unknown status '{}'",
                    line_no + 1,
                    status_str
                );
                continue;
            }
        };

        let name = match Name::from_uri(uri) {
            Ok(name) => name,
            Err(e) => {
                warn!("Seed file line {}: bad name '{}': {}", line_no + 1, uri, e);
                continue;
            }
        };

        match table.set_status(&name, status, now) {
            Ok(()) => {
                debug!("Seeded FIB entry {} to {}", uri, status);
                applied += 1;
            }
            Err(e) => {
                warn!("Seed file line {}: {}", line_no + 1, e);
            }
        }
    }

    applied
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    #[test]
    fn test_comments_blanks_and_bad_lines_are_skipped() {
        let mut table = FibTable::new();
        table.insert(name("/a"), 0, 0);
        table.insert(name("/b"), 0, 0);

        let contents = "\
# seed file
/a suspended

/b inactive
/a bogus-status
/missing active
just-one-field
";
        let applied = apply_seed_lines(&mut table, contents, 50);
        assert_eq!(applied, 2);
        assert_eq!(table.get_status(&name("/a")), EntryStatus::Suspended);
        assert_eq!(table.get_status(&name("/b")), EntryStatus::Inactive);
    }

    #[test]
    fn test_apply_seed_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "/a active").unwrap();
        writeln!(file, "/a suspended").unwrap();

        let mut table = FibTable::new();
        table.insert(name("/a"), 0, 0);

        let applied = apply_seed_file(&mut table, file.path(), 10).unwrap();
        // later lines win: both applied, last state sticks
        assert_eq!(applied, 2);
        assert_eq!(table.get_status(&name("/a")), EntryStatus::Suspended);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let mut table = FibTable::new();
        assert!(apply_seed_file(&mut table, "/no/such/file", 0).is_err());
    }
}
