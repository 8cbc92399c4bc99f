use crate::types::MarketTick;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Number of leading frames for which the fast scanner is cross-checked
/// against the reference decimal parse before it is trusted on its own.
const VALIDATION_FRAMES: u64 = 1_000;
const VALIDATION_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed book-ticker frame")]
    Malformed,
    #[error("invalid book: bid={bid} ask={ask}")]
    InvalidBook { bid: f64, ask: f64 },
}

#[derive(Debug, Deserialize)]
struct RawBookTicker {
    b: String,
    #[serde(rename = "B")]
    bid_qty: String,
    a: String,
    #[serde(rename = "A")]
    ask_qty: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ParsedNumbers {
    bid: f64,
    ask: f64,
    bid_qty: f64,
    ask_qty: f64,
}

/// Book-ticker frame parser.
///
/// The fast path scans for the literal key markers and reads plain signed
/// decimals in place. For the first [`VALIDATION_FRAMES`] frames a reference
/// parse (serde_json + `str::parse::<f64>`) runs in parallel and the fast
/// result must agree within [`VALIDATION_TOLERANCE`] on every field; only
/// then does the parser latch onto the fast path. Scientific-notation
/// values are rejected by the fast scanner, so a feed change would surface
/// as validation mismatches rather than silent misreads.
#[derive(Debug)]
pub struct FrameParser {
    latched: bool,
    validation_count: u64,
    validation_passed: u64,
    frames_parsed: u64,
    frames_rejected: u64,
}

impl FrameParser {
    #[inline]
    pub fn new() -> Self {
        Self {
            latched: false,
            validation_count: 0,
            validation_passed: 0,
            frames_parsed: 0,
            frames_rejected: 0,
        }
    }

    pub fn parse(&mut self, frame: &str) -> Result<MarketTick, ParseError> {
        let result = self.parse_inner(frame);
        match result {
            Ok(_) => self.frames_parsed += 1,
            Err(_) => self.frames_rejected += 1,
        }
        result
    }

    fn parse_inner(&mut self, frame: &str) -> Result<MarketTick, ParseError> {
        let symbol = scan_symbol(frame).ok_or(ParseError::Malformed)?;

        let numbers = if self.latched {
            match fast_parse(frame) {
                Some(numbers) => numbers,
                // Fast scan can fail on an unusual but well-formed frame;
                // the reference path stays available as a fallback.
                None => reference_parse(frame).ok_or(ParseError::Malformed)?,
            }
        } else {
            let reference = reference_parse(frame).ok_or(ParseError::Malformed)?;
            if self.validation_count < VALIDATION_FRAMES {
                self.validation_count += 1;
                if let Some(fast) = fast_parse(frame) {
                    if agrees(&fast, &reference) {
                        self.validation_passed += 1;
                    }
                }
                if self.validation_count == VALIDATION_FRAMES {
                    if self.validation_passed == self.validation_count {
                        self.latched = true;
                        info!(
                            frames = self.validation_count,
                            "fast frame parser validated, switching over"
                        );
                    } else {
                        warn!(
                            passed = self.validation_passed,
                            total = self.validation_count,
                            "fast frame parser failed validation, keeping reference path"
                        );
                    }
                }
            }
            reference
        };

        if !(numbers.bid > 0.0 && numbers.ask > 0.0 && numbers.ask > numbers.bid) {
            return Err(ParseError::InvalidBook {
                bid: numbers.bid,
                ask: numbers.ask,
            });
        }
        if !(numbers.bid.is_finite()
            && numbers.ask.is_finite()
            && numbers.bid_qty.is_finite()
            && numbers.ask_qty.is_finite())
        {
            return Err(ParseError::Malformed);
        }

        Ok(MarketTick::new(
            symbol,
            numbers.bid,
            numbers.ask,
            numbers.bid_qty,
            numbers.ask_qty,
        ))
    }

    #[inline]
    pub fn is_latched(&self) -> bool {
        self.latched
    }

    #[inline]
    pub fn frames_parsed(&self) -> u64 {
        self.frames_parsed
    }

    #[inline]
    pub fn frames_rejected(&self) -> u64 {
        self.frames_rejected
    }
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn agrees(fast: &ParsedNumbers, reference: &ParsedNumbers) -> bool {
    (fast.bid - reference.bid).abs() < VALIDATION_TOLERANCE
        && (fast.ask - reference.ask).abs() < VALIDATION_TOLERANCE
        && (fast.bid_qty - reference.bid_qty).abs() < VALIDATION_TOLERANCE
        && (fast.ask_qty - reference.ask_qty).abs() < VALIDATION_TOLERANCE
}

/// Offset of the value following a `"x":"` key marker, or None.
#[inline]
fn field_offset(frame: &str, marker: &str) -> Option<usize> {
    frame.find(marker).map(|pos| pos + marker.len())
}

#[inline]
fn scan_symbol(frame: &str) -> Option<String> {
    let start = field_offset(frame, "\"s\":\"")?;
    let rest = &frame[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn fast_parse(frame: &str) -> Option<ParsedNumbers> {
    let bid = fast_decimal(&frame[field_offset(frame, "\"b\":\"")?..])?;
    let bid_qty = fast_decimal(&frame[field_offset(frame, "\"B\":\"")?..])?;
    let ask = fast_decimal(&frame[field_offset(frame, "\"a\":\"")?..])?;
    let ask_qty = fast_decimal(&frame[field_offset(frame, "\"A\":\"")?..])?;
    Some(ParsedNumbers {
        bid,
        ask,
        bid_qty,
        ask_qty,
    })
}

/// Reads a signed decimal with an optional fractional part, stopping at the
/// first non-digit. Exponents are rejected: the upstream book-ticker feed
/// emits plain decimals only.
fn fast_decimal(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut sign = 1.0;

    if bytes.first() == Some(&b'-') {
        sign = -1.0;
        i = 1;
    }

    let mut value = 0.0;
    let mut digits = 0;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        value = value * 10.0 + f64::from(bytes[i] - b'0');
        i += 1;
        digits += 1;
    }

    let mut scale = 1.0;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            value = value * 10.0 + f64::from(bytes[i] - b'0');
            scale *= 10.0;
            i += 1;
            digits += 1;
        }
    }

    if digits == 0 {
        return None;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        return None;
    }

    Some(sign * value / scale)
}

fn reference_parse(frame: &str) -> Option<ParsedNumbers> {
    let raw: RawBookTicker = serde_json::from_str(frame).ok()?;
    Some(ParsedNumbers {
        bid: raw.b.parse().ok()?,
        ask: raw.a.parse().ok()?,
        bid_qty: raw.bid_qty.parse().ok()?,
        ask_qty: raw.ask_qty.parse().ok()?,
    })
}
