use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};

/// Reads one class label per line. Blank lines are skipped, surrounding
/// whitespace trimmed. Line order is the model's output order.
pub fn load_labels(filepath: &Path) -> io::Result<Vec<String>> {
    let file = File::open(filepath)?;
    parse_labels(io::BufReader::new(file))
}

fn parse_labels(reader: impl BufRead) -> io::Result<Vec<String>> {
    let mut labels = Vec::new();
    for line_result in reader.lines() {
        let line = line_result?;
        let label = line.trim();
        if !label.is_empty() {
            labels.push(label.to_string());
        }
    }

    if labels.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "labels file contains no labels",
        ));
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_labels_skips_blank_lines() {
        let labels = parse_labels(Cursor::new("cat\n\n  dog  \r\nplant\n")).unwrap();
        assert_eq!(labels, vec!["cat", "dog", "plant"]);
    }

    #[test]
    fn test_parse_labels_rejects_empty_file() {
        let err = parse_labels(Cursor::new("\n  \n")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_load_labels_missing_file() {
        let err = load_labels(Path::new("./does/not/exist.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
