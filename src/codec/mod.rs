//! Byte Codec
//!
//! Stateless conversion between textual payload representations
//! (utf8 / base64 / hex) and raw byte sequences. The send path decodes
//! caller text into bytes; the read path renders received bytes back as
//! UTF-8 text, with non-UTF-8 data collapsing to an empty string rather
//! than an error (soft-failure contract of the read path).

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Supported payload encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Utf8,
    Base64,
    Hex,
}

impl Encoding {
    /// Wire tag for this encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Base64 => "base64",
            Encoding::Hex => "hex",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "utf8" => Ok(Encoding::Utf8),
            "base64" => Ok(Encoding::Base64),
            "hex" => Ok(Encoding::Hex),
            other => Err(anyhow!("unsupported data type: {}", other)),
        }
    }
}

/// Decode caller-supplied text into the byte payload it represents.
///
/// Fails without any side effect when the text is malformed for the
/// requested encoding.
pub fn decode(text: &str, encoding: Encoding) -> Result<Bytes> {
    match encoding {
        Encoding::Utf8 => Ok(Bytes::copy_from_slice(text.as_bytes())),
        Encoding::Base64 => {
            let bytes = general_purpose::STANDARD
                .decode(text)
                .map_err(|e| anyhow!("invalid base64 string: {}", e))?;
            Ok(Bytes::from(bytes))
        }
        Encoding::Hex => {
            if text.len() % 2 != 0 {
                bail!("invalid hex string length");
            }
            let bytes = hex::decode(text).map_err(|_| anyhow!("invalid hex string format"))?;
            Ok(Bytes::from(bytes))
        }
    }
}

/// Render received bytes as UTF-8 text.
///
/// Non-UTF-8 data yields an empty string, mirroring the read path's
/// soft-failure policy: a polling caller sees "" for garbage bytes the
/// same way it does for a timeout.
pub fn encode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_decode_is_identity_bytes() {
        let bytes = decode("ping", Encoding::Utf8).unwrap();
        assert_eq!(&bytes[..], b"ping");
    }

    #[test]
    fn hex_round_trip() {
        let bytes = decode("68656c6c6f", Encoding::Hex).unwrap();
        assert_eq!(&bytes[..], &[0x68, 0x65, 0x6c, 0x6c, 0x6f]);
        assert_eq!(encode(&bytes), "hello");
    }

    #[test]
    fn hex_is_case_insensitive() {
        let lower = decode("deadbeef", Encoding::Hex).unwrap();
        let upper = decode("DEADBEEF", Encoding::Hex).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn base64_decodes_standard_padding() {
        let bytes = decode("aGVsbG8=", Encoding::Base64).unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[test]
    fn base64_rejects_malformed_input() {
        let err = decode("not base64!!!", Encoding::Base64).unwrap_err();
        assert!(err.to_string().contains("invalid base64 string"));
    }

    #[test]
    fn hex_rejects_odd_length() {
        let err = decode("abc", Encoding::Hex).unwrap_err();
        assert!(err.to_string().contains("invalid hex string length"));
    }

    #[test]
    fn hex_rejects_non_hex_digits() {
        let err = decode("zz", Encoding::Hex).unwrap_err();
        assert!(err.to_string().contains("invalid hex string format"));
    }

    #[test]
    fn unknown_tag_is_unsupported() {
        let err = "bogus".parse::<Encoding>().unwrap_err();
        assert!(err.to_string().contains("unsupported data type"));
    }

    #[test]
    fn encode_soft_fails_on_invalid_utf8() {
        assert_eq!(encode(&[0xff, 0xfe]), "");
    }

    #[test]
    fn empty_inputs_are_fine() {
        assert_eq!(decode("", Encoding::Utf8).unwrap().len(), 0);
        assert_eq!(decode("", Encoding::Hex).unwrap().len(), 0);
        assert_eq!(encode(b""), "");
    }
}
