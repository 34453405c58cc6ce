use std::{
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use tracing::debug;

use crate::TextBufferBuilder;
use crate::buffer::TextBuffer;

const READ_SIZE: usize = 64 * 1024;

pub fn load_from_path<P: AsRef<Path>>(path: P) -> io::Result<TextBuffer> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let buffer = load_from_reader(BufReader::new(file))?;
    debug!(
        path = %path.display(),
        len = buffer.get_length(),
        lines = buffer.get_line_count(),
        line_ending = ?buffer.line_ending(),
        "loaded text buffer"
    );
    Ok(buffer)
}

/// Stream UTF-8 text from `reader` into a new buffer.
///
/// Invalid byte sequences are replaced with U+FFFD.
pub fn load_from_reader<R: Read>(mut reader: R) -> io::Result<TextBuffer> {
    let mut builder = TextBufferBuilder::new();
    let mut buf = vec![0u8; READ_SIZE];
    let mut carry: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        carry.extend_from_slice(&buf[..n]);
        let consumed = accept_utf8(&mut builder, &carry);
        // Keep any partial codepoint for the next read
        carry.drain(..consumed);
    }

    // Flush any remaining carry
    if !carry.is_empty() {
        builder.accept_chunk(&String::from_utf8_lossy(&carry));
    }

    Ok(builder.finish().build())
}

/// Feed the decodable prefix of `bytes` to `builder` and return how many
/// bytes were used. An incomplete sequence at the very end is left over.
fn accept_utf8(builder: &mut TextBufferBuilder, bytes: &[u8]) -> usize {
    let mut start = 0;

    while start < bytes.len() {
        match std::str::from_utf8(&bytes[start..]) {
            Ok(s) => {
                builder.accept_chunk(s);
                return bytes.len();
            }
            Err(e) => {
                let valid = start + e.valid_up_to();
                if let Ok(s) = std::str::from_utf8(&bytes[start..valid]) {
                    builder.accept_chunk(s);
                }
                match e.error_len() {
                    Some(bad) => {
                        builder.accept_chunk(char::REPLACEMENT_CHARACTER.encode_utf8(&mut [0; 4]));
                        start = valid + bad;
                    }
                    None => return valid,
                }
            }
        }
    }

    start
}
