//! Firmware image transfer.
//!
//! The load sequence is fire-and-forget from the host side:
//!
//! ```text
//!   host                                   device
//!    |  "LOAD\n"                             |
//!    |-------------------------------------->|  switches to receive mode
//!    |        1000 ms settle delay           |
//!    |  8192 raw bytes, no framing           |
//!    |-------------------------------------->|  programs the flash sector
//! ```

use std::{
    fs::File,
    io::{self, Read},
    path::Path,
    thread,
};

use log::{debug, info};

use crate::{
    settings::{IMAGE_SIZE, SETTLE_DELAY},
    transport::Transmit,
    Error, Result,
};

/// Token announcing an image transfer to the device.
pub const LOAD_TOKEN: &str = "LOAD";

/// Read the image at `path` and push it through `tx`.
///
/// Blocks the caller for the settle delay. Nothing is sent if the image cannot
/// be read completely.
pub fn load<T: Transmit + ?Sized>(path: &Path, tx: &T) -> Result<()> {
    let image = read_image(path)?;
    info!("Loading {} ({} bytes)", path.display(), image.len());

    tx.send_text(LOAD_TOKEN)?;
    debug!("waiting {:?} for the device to settle", SETTLE_DELAY);
    thread::sleep(SETTLE_DELAY);
    tx.send_bytes(image)?;

    Ok(())
}

/// Read exactly one image from the file at `path`.
pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::FileMissing(path.to_path_buf()),
        _ => Error::Io(e),
    })?;
    read_image_from(file)
}

/// Read exactly one image from `reader`.
///
/// Keeps reading until the image is complete, so readers that hand out data in
/// small pieces are fine. Only a genuine end of stream before the image is
/// complete fails, with [`Error::ShortRead`].
pub fn read_image_from<R: Read>(mut reader: R) -> Result<Vec<u8>> {
    let mut image = vec![0; IMAGE_SIZE];
    let mut filled = 0;

    while filled < IMAGE_SIZE {
        match reader.read(&mut image[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    if filled < IMAGE_SIZE {
        return Err(Error::ShortRead {
            expected: IMAGE_SIZE,
            obtained: filled,
        });
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{channel, Payload};
    use std::{fs, io::Cursor, time::Instant};

    /// Hands out at most 100 bytes per read and is interrupted every third
    /// call.
    struct Trickle {
        data: Cursor<Vec<u8>>,
        calls: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            if self.calls % 3 == 0 {
                return Err(io::ErrorKind::Interrupted.into());
            }
            let n = buf.len().min(100);
            self.data.read(&mut buf[..n])
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn partial_reads_are_not_end_of_file() {
        let data = pattern(IMAGE_SIZE);
        let reader = Trickle {
            data: Cursor::new(data.clone()),
            calls: 0,
        };
        assert_eq!(read_image_from(reader).unwrap(), data);
    }

    #[test]
    fn short_file_is_detected() {
        match read_image_from(Cursor::new(pattern(100))) {
            Err(Error::ShortRead { expected, obtained }) => {
                assert_eq!((expected, obtained), (IMAGE_SIZE, 100));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn only_one_image_is_taken() {
        let image = read_image_from(Cursor::new(pattern(IMAGE_SIZE + 10))).unwrap();
        assert_eq!(image.len(), IMAGE_SIZE);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_image(&dir.path().join("gone.bin")),
            Err(Error::FileMissing(_))
        ));
    }

    #[test]
    fn load_announces_then_sends_after_settling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw.bin");
        let data = pattern(IMAGE_SIZE);
        fs::write(&path, &data).unwrap();

        let (outbox, inbox) = channel(4);
        let started = Instant::now();
        load(&path, &outbox).unwrap();
        assert!(started.elapsed() >= SETTLE_DELAY);

        assert_eq!(
            inbox.drain(),
            vec![Payload::Text(LOAD_TOKEN.into()), Payload::Bytes(data)]
        );
    }

    #[test]
    fn short_file_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw.bin");
        fs::write(&path, pattern(10)).unwrap();

        let (outbox, inbox) = channel(4);
        assert!(matches!(load(&path, &outbox), Err(Error::ShortRead { .. })));
        assert!(inbox.drain().is_empty());
    }
}
