//! Hex dump to binary image encoder.
//!
//! A hex dump is a text document where each line is a run of hex digit pairs.
//! Every pair is decoded into one byte, adjusted with a [`ByteTransform`] and
//! appended to the binary image. Lines are written out as soon as they are
//! decoded, so an image never needs to be held in memory as a whole.
//!
//! A trailing odd digit on a line is ignored. Any other character that is not
//! a hex digit fails the conversion of the whole document.
//!
//! **Example**
//! ```
//! use hexload::encoder::{self, ByteTransform};
//!
//! let (image, checksum) = encoder::convert("deadbeef", ByteTransform::Identity).unwrap();
//! assert_eq!(image, vec![0xDE, 0xAD, 0xBE, 0xEF]);
//! assert_eq!(checksum.to_string(), "C8");
//! ```

mod checksum;
mod transform;

use std::{
    fs::{self, File},
    io::{self, prelude::*, BufReader, BufWriter, Cursor},
    path::{Path, PathBuf},
};

use log::{debug, trace, warn};

pub use checksum::Checksum;
pub use transform::{invert, swap, ByteTransform};

use crate::{settings::IMAGE_SIZE, Error, Result};

/// Outcome of converting one hex dump file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Report {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Number of bytes written to the image.
    pub size: u64,
    pub checksum: Checksum,
}

/// Convert an in-memory hex document into its binary image.
pub fn convert(document: &str, transform: ByteTransform) -> Result<(Vec<u8>, Checksum)> {
    let mut image = Vec::with_capacity(document.len() / 2);
    let checksum = encode(Cursor::new(document), &mut image, transform)?;
    Ok((image, checksum))
}

/// Stream a hex document from `input` to `output`, one line at a time.
///
/// Returns the checksum diagnostic of everything written. On error, whatever
/// was written for the preceding lines stays in `output`.
pub fn encode<R: BufRead, W: Write>(
    input: R,
    mut output: W,
    transform: ByteTransform,
) -> Result<Checksum> {
    let mut checksum = Checksum::new();
    let mut data = Vec::new();

    for (index, line) in DumpLines::new(input).enumerate() {
        let line = line?;
        data.clear();
        decode_line(&line, index + 1, transform, &mut data)?;
        trace!("line {}: {} bytes", index + 1, data.len());

        output.write_all(&data)?;
        checksum.update(&data);
    }
    output.flush()?;

    Ok(checksum)
}

/// Convert the hex dump at `input` into a `.bin` image next to it.
pub fn convert_file(input: &Path, transform: ByteTransform) -> Result<Report> {
    if !input.is_file() {
        return Err(Error::FileMissing(input.to_path_buf()));
    }

    let output = output_path(input);
    if output == input {
        return Err(Error::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to overwrite input `{}`", input.display()),
        )));
    }
    debug!("{} => {} ({:?})", input.display(), output.display(), transform);

    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(&output)?);

    let checksum = match encode(reader, &mut writer, transform) {
        Ok(checksum) => checksum,
        Err(e) => {
            drop(writer);
            if let Err(rm) = fs::remove_file(&output) {
                debug!("could not remove `{}`: {}", output.display(), rm);
            }
            return Err(e);
        }
    };
    drop(writer);

    let size = fs::metadata(&output)?.len();
    if size != IMAGE_SIZE as u64 {
        warn!(
            "`{}` is {} bytes, LOAD only accepts images of exactly {} bytes",
            output.display(),
            size,
            IMAGE_SIZE
        );
    }

    Ok(Report {
        input: input.to_path_buf(),
        output,
        size,
        checksum,
    })
}

/// The image file name for a hex dump: everything from the last `.` of the
/// file name is replaced with `.bin`, or `.bin` is appended when there is no
/// `.` at all. A dotfile such as `.hex` therefore becomes `.bin`.
pub fn output_path(input: &Path) -> PathBuf {
    match input.file_name().and_then(|name| name.to_str()) {
        Some(name) => {
            let stem = name.rfind('.').map_or(name, |dot| &name[..dot]);
            input.with_file_name(format!("{}.bin", stem))
        }
        None => input.with_extension("bin"),
    }
}

/// Lines of a hex dump. A line ends at `\n`, `\r\n` or a lone `\r`; the
/// terminator is not part of the line.
struct DumpLines<R> {
    input: R,
    // The previous line ended with `\r`, a `\n` right after it belongs to it.
    after_cr: bool,
}

impl<R: BufRead> DumpLines<R> {
    fn new(input: R) -> Self {
        DumpLines {
            input,
            after_cr: false,
        }
    }
}

impl<R: BufRead> Iterator for DumpLines<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = Vec::new();
        let mut started = false;
        loop {
            let available = match self.input.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Some(Err(e)),
            };
            if available.is_empty() {
                return if started { Some(Ok(line)) } else { None };
            }

            if self.after_cr {
                self.after_cr = false;
                if available[0] == b'\n' {
                    self.input.consume(1);
                    continue;
                }
            }

            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    self.after_cr = available[end] == b'\r';
                    line.extend_from_slice(&available[..end]);
                    self.input.consume(end + 1);
                    return Some(Ok(line));
                }
                None => {
                    let used = available.len();
                    line.extend_from_slice(available);
                    self.input.consume(used);
                    started = true;
                }
            }
        }
    }
}

fn decode_line(
    line: &[u8],
    line_no: usize,
    transform: ByteTransform,
    data: &mut Vec<u8>,
) -> Result<()> {
    // floor(len / 2) pairs, a dangling last digit is not an error
    for pair in 0..line.len() / 2 {
        let column = pair * 2;
        let hi = nibble(line, line_no, column)?;
        let lo = nibble(line, line_no, column + 1)?;
        data.push(transform.apply(hi << 4 | lo));
    }
    Ok(())
}

fn nibble(line: &[u8], line_no: usize, index: usize) -> Result<u8> {
    match (line[index] as char).to_digit(16) {
        Some(value) => Ok(value as u8),
        None => Err(Error::Parse {
            line: line_no,
            // Every byte before `index` is an ASCII digit, so the byte offset
            // is also the character offset.
            column: index + 1,
            found: String::from_utf8_lossy(&line[index..])
                .chars()
                .next()
                .unwrap_or(char::REPLACEMENT_CHARACTER),
        }),
    }
}
