//! Response-side tokenization.

use std::iter::FusedIterator;

use crate::error::{Error, Result};

/// Smallest possible remaining token: `0:`.
const MIN_TOKEN_LEN: usize = 2;

/// One length-prefixed unit of a decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireToken<'a> {
    /// Position in the token stream (0-based).
    pub index: usize,
    /// Byte offset of the token's content within the input.
    pub offset: usize,
    value: &'a [u8],
}

impl<'a> WireToken<'a> {
    pub fn as_bytes(&self) -> &'a [u8] {
        self.value
    }

    pub fn to_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.value).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

/// Lazy cursor over the tokens of a wire payload.
///
/// Yields `Err` at most once; the stream ends after the first error.
#[derive(Debug, Clone)]
pub struct WireTokens<'a> {
    input: &'a [u8],
    cursor: usize,
    index: usize,
    failed: bool,
}

impl<'a> WireTokens<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            cursor: 0,
            index: 0,
            failed: false,
        }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.cursor
    }

    fn read_token(&mut self) -> Result<WireToken<'a>> {
        let input = self.input;
        let start = self.cursor;
        let rest = &input[start..];

        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 {
            return Err(Error::malformed(
                start,
                format!("expected length digits, found '{}'", rest[0].escape_ascii()),
            ));
        }

        let colon = start + digits;
        if input.get(colon) != Some(&b':') {
            return Err(Error::malformed(colon, "expected ':' after length digits"));
        }

        let len = std::str::from_utf8(&rest[..digits])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| Error::malformed(start, "length prefix does not fit in usize"))?;

        let value_start = colon + 1;
        let available = input.len() - value_start;
        if len > available {
            return Err(Error::malformed(
                value_start,
                format!("declared length {len} exceeds remaining {available} bytes"),
            ));
        }

        let value_end = value_start + len;
        let token = WireToken {
            index: self.index,
            offset: value_start,
            value: &input[value_start..value_end],
        };
        self.cursor = value_end;
        self.index += 1;
        Ok(token)
    }
}

impl<'a> Iterator for WireTokens<'a> {
    type Item = Result<WireToken<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining() < MIN_TOKEN_LEN {
            return None;
        }
        match self.read_token() {
            Ok(token) => Some(Ok(token)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for WireTokens<'_> {}

/// Tokenize a wire payload.
///
/// Scanning stops once fewer than two bytes remain, so a single trailing byte
/// (typically the agent's line terminator) is ignored.
pub fn decode<W: AsRef<[u8]> + ?Sized>(wire: &W) -> WireTokens<'_> {
    WireTokens::new(wire.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(wire: &str) -> Result<Vec<String>> {
        decode(wire)
            .map(|t| t.map(|t| t.to_str().unwrap().to_string()))
            .collect()
    }

    #[test]
    fn decodes_alternating_tokens() {
        let tokens = values("4:NAME3:abc6:RESULT2:OK").unwrap();
        assert_eq!(tokens, vec!["NAME", "abc", "RESULT", "OK"]);
    }

    #[test]
    fn tracks_index_and_offset() {
        let tokens: Vec<_> = decode("1:a10:0123456789")
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(tokens[0].index, 0);
        assert_eq!(tokens[0].offset, 2);
        assert_eq!(tokens[1].index, 1);
        assert_eq!(tokens[1].offset, 6);
        assert_eq!(tokens[1].as_bytes(), b"0123456789");
    }

    #[test]
    fn zero_length_token_advances() {
        let tokens = values("6:GENDER0:4:MODE1:M").unwrap();
        assert_eq!(tokens, vec!["GENDER", "", "MODE", "M"]);
    }

    #[test]
    fn trailing_zero_length_token() {
        let tokens = values("3:KEY0:").unwrap();
        assert_eq!(tokens, vec!["KEY", ""]);
    }

    #[test]
    fn value_may_contain_prefix_like_text() {
        let tokens = values("3:URL9:http:8:ab").unwrap();
        assert_eq!(tokens, vec!["URL", "http:8:ab"]);
    }

    #[test]
    fn single_trailing_byte_is_ignored() {
        let tokens = values("1:a1:b\n").unwrap();
        assert_eq!(tokens, vec!["a", "b"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(values("").unwrap().is_empty());
        assert!(values("7").unwrap().is_empty());
    }

    #[test]
    fn missing_digits_is_malformed() {
        let err = values("x:abc").unwrap_err();
        assert!(matches!(err, Error::MalformedWireFormat { offset: 0, .. }));
    }

    #[test]
    fn bare_colon_is_malformed() {
        let err = values(":abc").unwrap_err();
        assert!(matches!(err, Error::MalformedWireFormat { offset: 0, .. }));
    }

    #[test]
    fn digits_without_colon_is_malformed() {
        let err = values("12abc").unwrap_err();
        assert!(matches!(err, Error::MalformedWireFormat { offset: 2, .. }));
    }

    #[test]
    fn length_past_end_is_malformed() {
        let err = values("2:ab9:short").unwrap_err();
        match err {
            Error::MalformedWireFormat { offset, reason } => {
                assert_eq!(offset, 6);
                assert!(reason.contains("exceeds remaining 5 bytes"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn overflowing_length_is_malformed() {
        let err = values("99999999999999999999999:a").unwrap_err();
        assert!(matches!(err, Error::MalformedWireFormat { .. }));
    }

    #[test]
    fn stream_ends_after_error() {
        let mut tokens = decode("1:ax:zz1:b");
        assert!(tokens.next().unwrap().is_ok());
        assert!(tokens.next().unwrap().is_err());
        assert!(tokens.next().is_none());
    }

    #[test]
    fn non_utf8_content_is_preserved() {
        // "홍" in EUC-KR
        let wire: &[u8] = b"4:NAME2:\xc8\xab";
        let tokens: Vec<_> = decode(wire).collect::<Result<_>>().unwrap();
        assert_eq!(tokens[1].as_bytes(), &[0xc8u8, 0xab]);
        assert!(tokens[1].to_str().is_none());
    }

    #[test]
    fn decoding_is_repeatable() {
        let wire = "2:ID3:abc";
        assert_eq!(values(wire).unwrap(), values(wire).unwrap());
    }
}
