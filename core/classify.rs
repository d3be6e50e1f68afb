use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Number of leading bytes inspected when sniffing for binary content.
pub const SNIFF_LEN: u64 = 1024;

/// Heuristic text check: a regular file whose first [`SNIFF_LEN`] bytes hold
/// no NUL byte. Anything that cannot be opened or read counts as non-text.
pub fn is_text_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            log::trace!("Cannot open {} for sniffing: {}", path.display(), e);
            return false;
        }
    };
    let mut sample = Vec::with_capacity(SNIFF_LEN as usize);
    match file.take(SNIFF_LEN).read_to_end(&mut sample) {
        Ok(_) => !sample.contains(&0),
        Err(e) => {
            log::trace!("Cannot read {} for sniffing: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn plain_text_is_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.py");
        fs::write(&path, "print('hello')").unwrap();
        assert!(is_text_file(&path));
    }

    #[test]
    fn nul_byte_marks_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.txt");
        fs::write(&path, [0x00u8, 0x01, 0x02]).unwrap();
        assert!(!is_text_file(&path));
    }

    #[test]
    fn nul_beyond_sample_is_not_seen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.bin");
        let mut bytes = vec![b'a'; SNIFF_LEN as usize];
        bytes.push(0);
        fs::write(&path, bytes).unwrap();
        assert!(is_text_file(&path));
    }

    #[test]
    fn missing_and_directories_are_not_text() {
        let dir = TempDir::new().unwrap();
        assert!(!is_text_file(&dir.path().join("nope.c")));
        assert!(!is_text_file(dir.path()));
    }

    #[test]
    fn empty_file_is_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        fs::write(&path, "").unwrap();
        assert!(is_text_file(&path));
    }
}
