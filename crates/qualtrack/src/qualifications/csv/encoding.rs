//! Character-encoding negotiation for the CSV surface.
//!
//! Exports prefer the legacy Shift_JIS codepage the partner back-offices
//! expect, falling back to BOM-prefixed UTF-8 when a field cannot be
//! represented. Imports accept either, UTF-8 first.

use encoding_rs::SHIFT_JIS;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Charset actually used for an encoded payload, for the MIME declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    ShiftJis,
    Utf8,
}

impl Charset {
    pub fn mime_name(self) -> &'static str {
        match self {
            Charset::ShiftJis => "Shift_JIS",
            Charset::Utf8 => "UTF-8",
        }
    }
}

/// Encoded bytes plus the charset they were produced with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    pub charset: Charset,
}

#[derive(Debug, Clone, Copy)]
enum EncodingAttempt {
    ShiftJis,
    Utf8Bom,
}

/// Ordered preference list; the final attempt never fails.
const EXPORT_ATTEMPTS: [EncodingAttempt; 2] = [EncodingAttempt::ShiftJis, EncodingAttempt::Utf8Bom];

fn try_encode(attempt: EncodingAttempt, text: &str) -> Option<EncodedText> {
    match attempt {
        EncodingAttempt::ShiftJis => {
            let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
            if had_errors {
                return None;
            }
            Some(EncodedText {
                bytes: bytes.into_owned(),
                charset: Charset::ShiftJis,
            })
        }
        EncodingAttempt::Utf8Bom => {
            let mut bytes = Vec::with_capacity(UTF8_BOM.len() + text.len());
            bytes.extend_from_slice(&UTF8_BOM);
            bytes.extend_from_slice(text.as_bytes());
            Some(EncodedText {
                bytes,
                charset: Charset::Utf8,
            })
        }
    }
}

/// Encodes export text, walking the preference list in order.
pub fn encode_for_export(text: &str) -> EncodedText {
    for attempt in EXPORT_ATTEMPTS {
        if let Some(encoded) = try_encode(attempt, text) {
            return encoded;
        }
    }
    // The UTF-8 attempt is total; this arm is unreachable by construction.
    EncodedText {
        bytes: text.as_bytes().to_vec(),
        charset: Charset::Utf8,
    }
}

#[derive(Debug, thiserror::Error)]
#[error("upload is neither valid UTF-8 nor Shift_JIS")]
pub struct DecodeError;

/// Decodes an uploaded byte stream: UTF-8 first (BOM tolerated), then
/// Shift_JIS. Lossy replacement counts as failure, not silent mangling.
pub fn decode_for_import(bytes: &[u8]) -> Result<String, DecodeError> {
    let stripped = bytes.strip_prefix(&UTF8_BOM).unwrap_or(bytes);

    if let Ok(text) = std::str::from_utf8(stripped) {
        return Ok(text.to_string());
    }

    let (text, _, had_errors) = SHIFT_JIS.decode(stripped);
    if had_errors {
        return Err(DecodeError);
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ascii_encodes_as_shift_jis() {
        let encoded = encode_for_export("Acme Corp,123\n");
        assert_eq!(encoded.charset, Charset::ShiftJis);
        assert_eq!(encoded.bytes, b"Acme Corp,123\n");
    }

    #[test]
    fn japanese_text_round_trips_through_shift_jis() {
        let source = "建設業許可";
        let encoded = encode_for_export(source);
        assert_eq!(encoded.charset, Charset::ShiftJis);
        assert_eq!(decode_for_import(&encoded.bytes).expect("decodes"), source);
    }

    #[test]
    fn unmappable_text_falls_back_to_utf8_with_bom() {
        // Emoji have no Shift_JIS representation.
        let encoded = encode_for_export("valid 🚧 row");
        assert_eq!(encoded.charset, Charset::Utf8);
        assert!(encoded.bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        assert_eq!(
            decode_for_import(&encoded.bytes).expect("decodes"),
            "valid 🚧 row"
        );
    }

    #[test]
    fn import_decodes_utf8_before_trying_shift_jis() {
        assert_eq!(
            decode_for_import("株式会社".as_bytes()).expect("decodes"),
            "株式会社"
        );
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(decode_for_import(&[0xFF, 0xFE, 0x00, 0x80, 0x80]).is_err());
    }
}
