/// Incremental UTF-8 decoder for streamed response bodies.
///
/// Chunk boundaries are arbitrary byte splits, so a multi-byte character can
/// arrive half in one chunk and half in the next. The decoder keeps the
/// incomplete tail between calls and prepends it to the following chunk.
/// Invalid sequences decode to U+FFFD and decoding continues.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, carrying incomplete sequences over.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;
        while !rest.is_empty() {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    out.push_str(std::str::from_utf8(valid).unwrap_or(""));
                    match err.error_len() {
                        // Garbage in the middle of the stream: replace and move on.
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &tail[len..];
                        }
                        // Incomplete sequence at the end: wait for the next chunk.
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush at end of stream. A sequence still incomplete when the stream
    /// closes becomes a single replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_chunks_unchanged() {
        let mut dec = StreamDecoder::new();
        assert_eq!(dec.decode(b"Hi"), "Hi");
        assert_eq!(dec.decode(b" there"), " there");
        assert_eq!(dec.finish(), "");
    }

    #[test]
    fn carries_split_multibyte_char_across_chunks() {
        // "chào" with the two-byte à split between chunks.
        let bytes = "chào".as_bytes();
        let mut dec = StreamDecoder::new();
        let first = dec.decode(&bytes[..3]);
        let second = dec.decode(&bytes[3..]);
        assert_eq!(format!("{first}{second}"), "chào");
    }

    #[test]
    fn any_split_of_multibyte_text_round_trips() {
        let text = "Tuần 1: 数据 👋";
        let bytes = text.as_bytes();
        for cut in 0..=bytes.len() {
            let mut dec = StreamDecoder::new();
            let mut out = dec.decode(&bytes[..cut]);
            out.push_str(&dec.decode(&bytes[cut..]));
            out.push_str(&dec.finish());
            assert_eq!(out, text, "failed at byte split {cut}");
        }
    }

    #[test]
    fn four_byte_char_split_three_ways() {
        let bytes = "👋".as_bytes();
        let mut dec = StreamDecoder::new();
        let mut out = String::new();
        for b in bytes {
            out.push_str(&dec.decode(std::slice::from_ref(b)));
        }
        assert_eq!(out, "👋");
        assert_eq!(dec.finish(), "");
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let mut dec = StreamDecoder::new();
        assert_eq!(dec.decode(b"ok\xFF\xFEok"), "ok\u{FFFD}\u{FFFD}ok");
    }

    #[test]
    fn truncated_sequence_at_stream_end_is_replaced() {
        let mut dec = StreamDecoder::new();
        // First two bytes of a three-byte character, then the stream closes.
        assert_eq!(dec.decode(&"ề".as_bytes()[..2]), "");
        assert_eq!(dec.finish(), "\u{FFFD}");
        // Decoder is reusable afterwards.
        assert_eq!(dec.decode(b"x"), "x");
    }
}
