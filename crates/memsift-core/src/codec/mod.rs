//! Typed interpretation of raw memory bytes.
//!
//! A search session fixes a [`TypeSpec`] up front; every byte window read
//! during that session is decoded under it into a [`DecodedValue`]. Numeric
//! values are widened to 64 bits internally so comparisons work uniformly
//! across the 1/2/4-byte source widths; text values stay raw byte runs with
//! no charset translation (rendering is the presentation layer's concern).

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Byte width of a numeric search value.
///
/// Closed over the widths the scan engine supports, so an invalid width is
/// unrepresentable rather than a runtime error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Width {
    Byte = 1,
    Half = 2,
    Word = 4,
}

impl Width {
    /// Number of bytes occupied by a value of this width.
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Bit mask selecting the low `8 * bytes` bits of a 64-bit container.
    pub fn mask(self) -> u64 {
        u64::MAX >> (64 - 8 * self as u32)
    }

    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(Width::Byte),
            2 => Some(Width::Half),
            4 => Some(Width::Word),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signedness {
    Unsigned,
    Signed,
}

/// Numeral base used when rendering values and parsing operator literals.
///
/// Display-only: it never changes comparison semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumeralBase {
    Decimal,
    Hexadecimal,
}

/// The fixed interpretation applied to raw bytes for one search session.
///
/// Numeric and text interpretations are separate variants so that
/// signedness and base structurally cannot apply to a text run, and
/// unsupported combinations are caught at construction rather than at
/// runtime dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeSpec {
    Numeric {
        width: Width,
        signedness: Signedness,
        base: NumeralBase,
    },
    Text {
        /// Length in bytes of the run to compare.
        length: usize,
    },
}

impl TypeSpec {
    pub fn numeric(width: Width, signedness: Signedness, base: NumeralBase) -> Self {
        TypeSpec::Numeric {
            width,
            signedness,
            base,
        }
    }

    /// Text interpretation comparing runs of `length` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero-length run.
    pub fn text(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(Error::InvalidSpec(
                "text run length must be at least 1".to_string(),
            ));
        }
        Ok(TypeSpec::Text { length })
    }

    /// Number of bytes read per candidate address.
    pub fn window(&self) -> usize {
        match self {
            TypeSpec::Numeric { width, .. } => width.bytes(),
            TypeSpec::Text { length } => *length,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, TypeSpec::Text { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            TypeSpec::Numeric { .. } => "numeric",
            TypeSpec::Text { .. } => "text",
        }
    }
}

/// A value decoded from memory, widened for uniform comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodedValue {
    Signed(i64),
    Unsigned(u64),
    Bytes(Vec<u8>),
}

impl DecodedValue {
    /// The value's raw bit pattern in a 64-bit container.
    ///
    /// For signed values this is the two's-complement pattern; for byte
    /// runs there is no single pattern and `0` is returned (byte runs are
    /// never compared arithmetically).
    pub fn raw_bits(&self) -> u64 {
        match self {
            DecodedValue::Signed(v) => *v as u64,
            DecodedValue::Unsigned(v) => *v,
            DecodedValue::Bytes(_) => 0,
        }
    }
}

/// Decode a byte window under `spec`.
///
/// Numeric values are read little-endian, matching the host system's native
/// memory layout, and sign- or zero-extended to 64 bits.
///
/// # Errors
///
/// Returns [`Error::InsufficientBytes`] if `bytes` is shorter than the
/// spec's window, e.g. at the tail of a mapped region.
pub fn decode(bytes: &[u8], spec: &TypeSpec) -> Result<DecodedValue> {
    let window = spec.window();
    if bytes.len() < window {
        return Err(Error::InsufficientBytes {
            needed: window,
            available: bytes.len(),
        });
    }
    match spec {
        TypeSpec::Text { length } => Ok(DecodedValue::Bytes(bytes[..*length].to_vec())),
        TypeSpec::Numeric {
            width, signedness, ..
        } => {
            let raw = read_le(&bytes[..window]);
            match signedness {
                Signedness::Unsigned => Ok(DecodedValue::Unsigned(raw)),
                Signedness::Signed => Ok(DecodedValue::Signed(sign_extend(raw, *width))),
            }
        }
    }
}

/// Encode a value back into the byte representation `spec` describes.
///
/// # Errors
///
/// Returns an error if the value's kind does not match the spec, or if a
/// numeric value is not representable in the spec's width.
pub fn encode(value: &DecodedValue, spec: &TypeSpec) -> Result<Vec<u8>> {
    match (spec, value) {
        (TypeSpec::Text { length }, DecodedValue::Bytes(run)) => {
            if run.len() != *length {
                return Err(Error::OperandMismatch(format!(
                    "expected a {} byte run, got {} bytes",
                    length,
                    run.len()
                )));
            }
            Ok(run.clone())
        }
        (
            TypeSpec::Numeric {
                width,
                signedness: Signedness::Signed,
                ..
            },
            DecodedValue::Signed(v),
        ) => {
            let bits = 8 * width.bytes() as u32;
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << (bits - 1)) - 1;
            if *v < min || *v > max {
                return Err(Error::ValueOutOfRange {
                    value: v.to_string(),
                    width: width.bytes(),
                });
            }
            Ok(v.to_le_bytes()[..width.bytes()].to_vec())
        }
        (
            TypeSpec::Numeric {
                width,
                signedness: Signedness::Unsigned,
                ..
            },
            DecodedValue::Unsigned(v),
        ) => {
            if *v > width.mask() {
                return Err(Error::ValueOutOfRange {
                    value: v.to_string(),
                    width: width.bytes(),
                });
            }
            Ok(v.to_le_bytes()[..width.bytes()].to_vec())
        }
        _ => Err(Error::OperandMismatch(format!(
            "value kind does not match a {} search",
            spec.kind_name()
        ))),
    }
}

/// Difference `current - previous` reduced modulo the source width.
///
/// Deltas are computed on the type's own width, not the 64-bit container,
/// so an unsigned 8-bit value wrapping from 255 to 0 reports a delta of 1
/// rather than -255.
pub fn width_delta(current: &DecodedValue, previous: &DecodedValue, width: Width) -> u64 {
    current.raw_bits().wrapping_sub(previous.raw_bits()) & width.mask()
}

/// Order two values under the signedness they were decoded with.
///
/// Byte runs and mixed kinds have no ordering and return `None`; equality
/// on byte runs goes through `PartialEq` instead.
pub fn compare(lhs: &DecodedValue, rhs: &DecodedValue) -> Option<Ordering> {
    match (lhs, rhs) {
        (DecodedValue::Signed(a), DecodedValue::Signed(b)) => Some(a.cmp(b)),
        (DecodedValue::Unsigned(a), DecodedValue::Unsigned(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Parse an operator-supplied literal under `spec`.
///
/// Numeric literals honor the spec's numeral base (a `0x` prefix is
/// accepted and optional when the base is hexadecimal); a leading sign is
/// only accepted for signed specs. Text literals must be exactly the run
/// length.
pub fn parse_literal(text: &str, spec: &TypeSpec) -> Result<DecodedValue> {
    let parse_err = |message: String| Error::LiteralParse {
        text: text.to_string(),
        message,
    };

    match spec {
        TypeSpec::Text { length } => {
            let run = text.as_bytes();
            if run.len() != *length {
                return Err(parse_err(format!(
                    "text literal must be exactly {} bytes, got {}",
                    length,
                    run.len()
                )));
            }
            Ok(DecodedValue::Bytes(run.to_vec()))
        }
        TypeSpec::Numeric {
            width,
            signedness,
            base,
        } => {
            let trimmed = text.trim();
            let (negative, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, trimmed),
            };
            if negative && *signedness == Signedness::Unsigned {
                return Err(parse_err(
                    "negative literal for an unsigned search".to_string(),
                ));
            }
            let (radix, digits) = match base {
                NumeralBase::Decimal => (10, digits),
                NumeralBase::Hexadecimal => (
                    16,
                    digits
                        .strip_prefix("0x")
                        .or_else(|| digits.strip_prefix("0X"))
                        .unwrap_or(digits),
                ),
            };
            let magnitude = u64::from_str_radix(digits, radix)
                .map_err(|e| parse_err(e.to_string()))?;

            let value = match signedness {
                Signedness::Unsigned => DecodedValue::Unsigned(magnitude),
                Signedness::Signed => {
                    if magnitude > i64::MAX as u64 {
                        return Err(parse_err("literal exceeds 64-bit range".to_string()));
                    }
                    let signed = magnitude as i64;
                    DecodedValue::Signed(if negative { -signed } else { signed })
                }
            };
            // Reuse the encode range check so the literal is known to be
            // representable in the search width.
            encode(&value, &TypeSpec::numeric(*width, *signedness, *base))?;
            Ok(value)
        }
    }
}

/// Render a value for display under the spec's numeral base.
///
/// Hexadecimal output shows the raw bit pattern zero-padded to the width;
/// byte runs render printable ASCII with `.` placeholders, leaving real
/// charset mapping to the presentation layer.
pub fn format_value(value: &DecodedValue, spec: &TypeSpec) -> String {
    match (spec, value) {
        (
            TypeSpec::Numeric {
                base: NumeralBase::Hexadecimal,
                width,
                ..
            },
            v,
        ) => {
            let bits = v.raw_bits() & width.mask();
            format!("{:#0digits$x}", bits, digits = 2 + width.bytes() * 2)
        }
        (_, DecodedValue::Signed(v)) => v.to_string(),
        (_, DecodedValue::Unsigned(v)) => v.to_string(),
        (_, DecodedValue::Bytes(run)) => run
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect(),
    }
}

fn read_le(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

fn sign_extend(raw: u64, width: Width) -> i64 {
    let shift = 64 - 8 * width.bytes() as u32;
    ((raw << shift) as i64) >> shift
}
