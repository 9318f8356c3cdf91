//! Encode a hex dump, then push the resulting image through the console.

use std::{
    fs,
    io::{self, Read, Write},
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use hexload::{
    encoder::{self, ByteTransform},
    shell::{self, Command, ConsoleLines, Flow},
    transport::{channel, CancelToken, Payload, Session},
    SettingsBuilder, IMAGE_SIZE, SETTLE_DELAY,
};

fn hex_dump(image: &[u8]) -> String {
    image.iter().map(|b| format!("{:02x}", b)).collect()
}

fn sample_image() -> Vec<u8> {
    (0..IMAGE_SIZE).map(|i| (i * 31 % 256) as u8).collect()
}

#[test]
fn encoded_image_is_loaded_as_one_raw_payload() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("firmware.hex");
    let image = sample_image();
    let line = hex_dump(&image);
    assert_eq!(line.len(), 2 * IMAGE_SIZE);
    fs::write(&input, format!("{}\n", line)).unwrap();

    let report = encoder::convert_file(&input, ByteTransform::Identity).unwrap();
    assert_eq!(report.output, dir.path().join("firmware.bin"));
    assert_eq!(report.size, IMAGE_SIZE as u64);

    let (outbox, inbox) = channel(1);
    let consumer = thread::spawn(move || {
        let mut received = Vec::new();
        while let Ok(next) = inbox.recv_timeout(Duration::from_secs(5)) {
            match next {
                Some(payload) => received.push((Instant::now(), payload)),
                None => break,
            }
        }
        received
    });

    let command = Command::parse(&format!("LOAD {}", report.output.display()));
    assert_eq!(command.execute(&outbox).unwrap(), Flow::Continue);
    drop(outbox);

    let received = consumer.join().unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].1, Payload::Text("LOAD".into()));
    assert_eq!(received[1].1, Payload::Bytes(image));
    assert!(received[1].0 - received[0].0 >= SETTLE_DELAY - Duration::from_millis(100));
}

#[test]
fn transformed_image_checksum_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("flipped.txt");
    fs::write(&input, "01\r\n02\r\n").unwrap();

    let report = encoder::convert_file(&input, ByteTransform::InvertThenSwap).unwrap();
    // 0x01 -> 0x80 -> 0x08, 0x02 -> 0x40 -> 0x04
    assert_eq!(fs::read(&report.output).unwrap(), vec![0x08, 0x04]);
    assert_eq!(report.checksum.to_string(), "F4");
}

#[derive(Clone, Default)]
struct Wire(Arc<Mutex<Vec<u8>>>);

impl Write for Wire {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct QuietDevice;

impl Read for QuietDevice {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        thread::sleep(Duration::from_millis(2));
        Err(io::ErrorKind::TimedOut.into())
    }
}

#[test]
fn console_session_puts_the_load_sequence_on_the_wire() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fw.bin");
    let image = sample_image();
    fs::write(&path, &image).unwrap();

    let settings = SettingsBuilder::new()
        .poll_interval(Duration::from_millis(5))
        .finalize();
    let wire = Wire::default();
    let mut session =
        Session::start("wire", QuietDevice, wire.clone(), io::sink(), &settings).unwrap();

    let script = format!("hello\nload {}\nLOAD {}.missing\nEXIT\n", path.display(), path.display());
    let lines = ConsoleLines::new(io::Cursor::new(script.into_bytes()), 1024);
    let cancel: CancelToken = session.cancel_token();
    shell::run(lines, &session.outbox(), &cancel);
    assert!(cancel.is_cancelled());
    session.close();

    let mut expected = b"hello\nLOAD\n".to_vec();
    expected.extend_from_slice(&image);
    assert_eq!(*wire.0.lock().unwrap(), expected);
}
