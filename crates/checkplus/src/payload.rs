//! Decrypted payload → field map.
//!
//! Tokens pair up as (name, value). Names are lower-cased; a repeated name
//! overwrites the earlier value. Two fields need text recovery beyond UTF-8:
//!
//! - `name`: raw bytes in the profile's national encoding (EUC-KR by default)
//! - `utf8_name`: percent-escaped UTF-8

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::NameEncoding;
use crate::error::{Error, Result};
use crate::wire::{self, WireToken};

pub const NAME_FIELD: &str = "name";
pub const UTF8_NAME_FIELD: &str = "utf8_name";

/// Fields recovered from one decrypted payload, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecodedRecord(IndexMap<String, String>);

impl DecodedRecord {
    /// Look up a field by its lower-cased name.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> IndexMap<String, String> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadParser {
    name_encoding: NameEncoding,
}

impl PayloadParser {
    pub fn new(name_encoding: NameEncoding) -> Self {
        Self { name_encoding }
    }

    pub fn parse<W: AsRef<[u8]> + ?Sized>(&self, wire: &W) -> Result<DecodedRecord> {
        let tokens = wire::decode(wire).collect::<Result<Vec<_>>>()?;
        if tokens.len() % 2 != 0 {
            return Err(Error::OddTokenCount {
                count: tokens.len(),
            });
        }

        let mut raw: IndexMap<String, &[u8]> = IndexMap::with_capacity(tokens.len() / 2);
        for pair in tokens.chunks_exact(2) {
            raw.insert(field_name(&pair[0])?, pair[1].as_bytes());
        }

        let mut fields = IndexMap::with_capacity(raw.len());
        for (field, bytes) in raw {
            let text = self.recover_text(&field, bytes)?;
            fields.insert(field, text);
        }

        tracing::debug!(fields = fields.len(), "Parsed decrypted payload");
        Ok(DecodedRecord(fields))
    }

    fn recover_text(&self, field: &str, bytes: &[u8]) -> Result<String> {
        let text = match field {
            NAME_FIELD => self
                .name_encoding
                .decode(bytes)
                .ok_or_else(|| Error::text_decode(field, self.name_encoding.label()))?,
            UTF8_NAME_FIELD => Cow::Owned(
                percent_decode(bytes)
                    .ok_or_else(|| Error::text_decode(field, "percent-encoded UTF-8"))?,
            ),
            _ => Cow::Borrowed(
                std::str::from_utf8(bytes).map_err(|_| Error::text_decode(field, "UTF-8"))?,
            ),
        };
        Ok(text.into_owned())
    }
}

fn field_name(token: &WireToken<'_>) -> Result<String> {
    token
        .to_str()
        .map(str::to_lowercase)
        .ok_or_else(|| Error::text_decode(format!("<name at byte {}>", token.offset), "UTF-8"))
}

/// Strict `%XX` decoding; `+` stays literal. `None` on a bad escape or non-UTF-8 result.
fn percent_decode(raw: &[u8]) -> Option<String> {
    fn hex(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }

    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        match raw[i] {
            b'%' => {
                let hi = hex(*raw.get(i + 1)?)?;
                let lo = hex(*raw.get(i + 2)?)?;
                out.push((hi << 4) | lo);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}
