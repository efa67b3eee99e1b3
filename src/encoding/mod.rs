use serde::Serialize;

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

// Only the head of a buffer is sampled for the ASCII check
const ASCII_SAMPLE_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    Utf16,
    Ascii,
}

/// Best-effort guess based on byte order marks and the first bytes of the buffer.
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(&UTF8_BOM) {
        return TextEncoding::Utf8;
    }

    if bytes.starts_with(&UTF16_LE_BOM) || bytes.starts_with(&UTF16_BE_BOM) {
        return TextEncoding::Utf16;
    }

    let sample = &bytes[..bytes.len().min(ASCII_SAMPLE_LEN)];
    if sample.is_ascii() {
        TextEncoding::Ascii
    } else {
        TextEncoding::Utf8
    }
}

/// Why a byte buffer is handed back untouched instead of being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingFallback {
    Utf16Unsupported,
    InvalidUtf8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText<'a> {
    pub bom: &'a [u8],
    pub text: &'a str,
    pub encoding: TextEncoding,
}

/// Borrow `bytes` as text without converting anything. A UTF-8 BOM is split off so it can
/// be written back verbatim.
pub fn decode(bytes: &[u8]) -> Result<DecodedText<'_>, EncodingFallback> {
    let encoding = detect_encoding(bytes);

    if encoding == TextEncoding::Utf16 {
        return Err(EncodingFallback::Utf16Unsupported);
    }

    let (bom, body) = match bytes.strip_prefix(&UTF8_BOM) {
        Some(body) => (&bytes[..UTF8_BOM.len()], body),
        None => (&bytes[..0], bytes),
    };

    let text = std::str::from_utf8(body).map_err(|_| EncodingFallback::InvalidUtf8)?;

    Ok(DecodedText {
        bom,
        text,
        encoding,
    })
}
