//! Line reader for operator input.

use std::io::{self, prelude::*, BufReader, Bytes};

use log::warn;

/// Operator input split into lines.
///
/// Carriage returns are ignored and a line feed ends the line. Lines longer
/// than the capacity are truncated. A last line without terminator is still
/// returned at end of input.
pub struct ConsoleLines<R> {
    bytes: Bytes<BufReader<R>>,
    capacity: usize,
}

impl<R: Read> ConsoleLines<R> {
    pub fn new(input: R, capacity: usize) -> Self {
        ConsoleLines {
            bytes: BufReader::new(input).bytes(),
            capacity: capacity.max(1),
        }
    }
}

impl<R: Read> Iterator for ConsoleLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        let mut seen = false;
        let mut dropped = 0usize;

        loop {
            match self.bytes.next() {
                None if !seen => return None,
                None => break,
                Some(Err(e)) => return Some(Err(e)),
                Some(Ok(byte)) => {
                    seen = true;
                    match byte {
                        b'\r' => {}
                        b'\n' => break,
                        _ if line.len() < self.capacity => line.push(byte),
                        _ => dropped += 1,
                    }
                }
            }
        }

        if dropped > 0 {
            warn!(
                "command line longer than {} bytes, {} bytes dropped",
                self.capacity, dropped
            );
        }
        Some(Ok(String::from_utf8_lossy(&line).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn lines(input: &str, capacity: usize) -> Vec<String> {
        ConsoleLines::new(Cursor::new(input.to_owned()), capacity)
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn splits_and_strips_carriage_returns() {
        assert_eq!(
            lines("LOAD fw.bin\r\nPING\nEXIT\n", 1024),
            vec!["LOAD fw.bin", "PING", "EXIT"]
        );
    }

    #[test]
    fn unterminated_last_line() {
        assert_eq!(lines("a\nb", 1024), vec!["a", "b"]);
    }

    #[test]
    fn empty_lines_are_kept() {
        assert_eq!(lines("\n\nx\n", 1024), vec!["", "", "x"]);
    }

    #[test]
    fn long_lines_are_truncated() {
        assert_eq!(lines("abcdef\ngh\n", 4), vec!["abcd", "gh"]);
    }

    #[test]
    fn no_input_no_lines() {
        assert!(lines("", 1024).is_empty());
    }
}
