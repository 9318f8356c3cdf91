//! Interpretation of operator command lines.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::debug;

use super::loader;
use crate::{settings::IMAGE_SIZE, transport::Transmit, Error, Result};

/// What one console line asks for.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    /// Close the session and terminate.
    Exit,
    /// Push the firmware image at the given path to the device.
    Load(PathBuf),
    /// Anything else goes to the device verbatim.
    Forward(String),
}

/// Whether the console should keep reading after a command.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Flow {
    Continue,
    Exit,
}

impl Command {
    /// Keywords are matched case-insensitively. `EXIT` must be the whole
    /// line; `LOAD` must be followed by whitespace and takes the rest of the
    /// line, trimmed, as the image path.
    pub fn parse(line: &str) -> Command {
        if line.eq_ignore_ascii_case("EXIT") {
            return Command::Exit;
        }

        let keyword = loader::LOAD_TOKEN.len();
        if let (Some(head), Some(rest)) = (line.get(..keyword), line.get(keyword..)) {
            if head.eq_ignore_ascii_case(loader::LOAD_TOKEN)
                && rest.starts_with(char::is_whitespace)
            {
                return Command::Load(PathBuf::from(rest.trim()));
            }
        }

        Command::Forward(line.to_owned())
    }

    /// Carry out the command. Errors are for the operator; none of them leave
    /// anything half-sent on the transport.
    pub fn execute<T: Transmit + ?Sized>(self, tx: &T) -> Result<Flow> {
        match self {
            Command::Exit => Ok(Flow::Exit),
            Command::Load(path) => {
                check_image(&path)?;
                loader::load(&path, tx)?;
                Ok(Flow::Continue)
            }
            Command::Forward(line) => {
                tx.send_text(&line)?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// An image is eligible for transfer only if it is exactly one flash sector.
pub fn check_image(path: &Path) -> Result<()> {
    let meta = match fs::metadata(path) {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Err(Error::FileMissing(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(Error::FileMissing(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };

    debug!("{}: {} bytes", path.display(), meta.len());
    if meta.len() != IMAGE_SIZE as u64 {
        return Err(Error::FileSizeMismatch {
            path: path.to_path_buf(),
            expected: IMAGE_SIZE as u64,
            actual: meta.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{channel, Payload};

    #[test]
    fn exit_in_any_case() {
        assert_eq!(Command::parse("EXIT"), Command::Exit);
        assert_eq!(Command::parse("exit"), Command::Exit);
    }

    #[test]
    fn padded_exit_is_forwarded() {
        assert_eq!(Command::parse("  Exit "), Command::Forward("  Exit ".into()));
        assert_eq!(Command::parse("EXIT "), Command::Forward("EXIT ".into()));
    }

    #[test]
    fn load_takes_a_path() {
        assert_eq!(
            Command::parse("LOAD fw.bin"),
            Command::Load(PathBuf::from("fw.bin"))
        );
        assert_eq!(
            Command::parse("load   out/fw.bin "),
            Command::Load(PathBuf::from("out/fw.bin"))
        );
        assert_eq!(
            Command::parse("LOAD my image.bin"),
            Command::Load(PathBuf::from("my image.bin"))
        );
    }

    #[test]
    fn load_without_path_is_forwarded() {
        assert_eq!(Command::parse("LOAD"), Command::Forward("LOAD".into()));
        assert_eq!(Command::parse("load"), Command::Forward("load".into()));
        assert_eq!(
            Command::parse(" LOAD fw.bin"),
            Command::Forward(" LOAD fw.bin".into())
        );

        let (outbox, inbox) = channel(2);
        let flow = Command::parse("LOAD").execute(&outbox).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(inbox.drain(), vec![Payload::Text("LOAD".into())]);
    }

    #[test]
    fn load_with_blank_path_is_missing() {
        assert_eq!(Command::parse("LOAD   "), Command::Load(PathBuf::new()));
    }

    #[test]
    fn everything_else_is_forwarded_verbatim() {
        assert_eq!(
            Command::parse(" status ?"),
            Command::Forward(" status ?".into())
        );
        assert_eq!(
            Command::parse("LOADER x"),
            Command::Forward("LOADER x".into())
        );
        assert_eq!(Command::parse("EXITS"), Command::Forward("EXITS".into()));
        assert_eq!(Command::parse(""), Command::Forward("".into()));
    }

    #[test]
    fn forward_sends_text() {
        let (outbox, inbox) = channel(2);
        let flow = Command::parse("PING").execute(&outbox).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(inbox.drain(), vec![Payload::Text("PING".into())]);
    }

    #[test]
    fn exit_sends_nothing() {
        let (outbox, inbox) = channel(2);
        assert_eq!(Command::Exit.execute(&outbox).unwrap(), Flow::Exit);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn wrong_size_is_rejected_without_transport_activity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fw.bin");
        fs::write(&path, vec![0u8; IMAGE_SIZE - 1]).unwrap();

        let (outbox, inbox) = channel(2);
        match Command::Load(path).execute(&outbox) {
            Err(Error::FileSizeMismatch {
                expected, actual, ..
            }) => assert_eq!((expected, actual), (8192, 8191)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn missing_file_is_rejected_without_transport_activity() {
        let dir = tempfile::tempdir().unwrap();
        let (outbox, inbox) = channel(2);

        let missing = Command::Load(dir.path().join("nope.bin")).execute(&outbox);
        assert!(matches!(missing, Err(Error::FileMissing(_))));

        let directory = Command::Load(dir.path().to_path_buf()).execute(&outbox);
        assert!(matches!(directory, Err(Error::FileMissing(_))));

        let empty = Command::parse("LOAD ").execute(&outbox);
        assert!(matches!(empty, Err(Error::FileMissing(_))));

        assert!(inbox.drain().is_empty());
    }
}
