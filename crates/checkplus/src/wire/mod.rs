//! Length-prefixed key/value wire format spoken by the CheckPlus agent.
//!
//! A payload is a flat, delimiter-free run of `<length>:<content>` tokens
//! alternating name and value:
//!
//! ```text
//! 7:REQ_SEQ32:5f0c...8:SITECODE5:AB123
//! ```
//!
//! Lengths count bytes of the content that follows. The agent returns some
//! fields in a legacy national encoding, so decoding works on raw bytes and
//! never assumes the payload is valid UTF-8.
//!
//! - **encoder**: [`FieldSet`] → wire string
//! - **decoder**: wire bytes → lazy stream of [`WireToken`]s

pub mod decoder;
pub mod encoder;

pub use decoder::{WireToken, WireTokens, decode};
pub use encoder::{FieldSet, encode};
