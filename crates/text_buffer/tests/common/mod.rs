#![allow(dead_code)]

use text_buffer::{Edit, TextBuffer, TextBufferBuilder, TreeConfig};

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Reference line splitter: every line keeps its terminator, and the text
/// after the last terminator is always a line, even when empty.
pub fn construct_lines(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                lines.push(text[start..i + 2].to_string());
                start = i + 2;
                i += 2;
            }
            b'\r' | b'\n' => {
                lines.push(text[start..i + 1].to_string());
                start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    lines.push(text[start..].to_string());
    lines
}

/// Reference splice: apply edits from the last to the first.
pub fn apply_edits(text: &str, edits: &[Edit]) -> String {
    let mut result = text.to_string();
    for edit in edits.iter().rev() {
        result.replace_range(edit.offset..edit.offset + edit.length, &edit.text);
    }
    result
}

/// Split `text` into chunks of about `chunk_len` bytes on char boundaries.
pub fn chunks_of(text: &str, chunk_len: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut end = chunk_len.max(1).min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

pub fn build(text: &str, chunk_len: usize) -> TextBuffer {
    let mut builder = TextBufferBuilder::new();
    for chunk in chunks_of(text, chunk_len) {
        builder.accept_chunk(chunk);
    }
    builder.finish().build()
}

pub fn build_with_config(text: &str, chunk_len: usize, config: TreeConfig) -> TextBuffer {
    let mut builder = TextBufferBuilder::with_config(config);
    for chunk in chunks_of(text, chunk_len) {
        builder.accept_chunk(chunk);
    }
    builder.finish().build()
}

/// A generated document with lines of varying length, every line ending
/// in `eol`, the last one included.
pub fn checker_document(line_count: usize, eol: &str) -> String {
    let mut text = String::new();
    for i in 0..line_count {
        let width = 20 + (i * 7) % 40;
        let line: String = (0..width)
            .map(|j| (b'a' + ((i + j * 3) % 26) as u8) as char)
            .collect();
        text.push_str(&line);
        text.push_str(eol);
    }
    text
}

pub fn assert_all_methods(buffer: &TextBuffer, text: &str) {
    assert_eq!(buffer.get_length(), text.len(), "length");

    let lines = construct_lines(text);
    assert_eq!(buffer.get_line_count(), lines.len(), "line count");
    for (i, expected) in lines.iter().enumerate() {
        let actual = buffer.get_line_content(i + 1).expect("line in range");
        assert_eq!(&actual, expected, "@ line number {}", i + 1);
    }
    assert_eq!(buffer.get_lines_content(), lines);
    assert_eq!(buffer.get_text(), text);

    if let Err(violation) = buffer.check_invariants() {
        panic!("invariant violated: {violation}");
    }
}
