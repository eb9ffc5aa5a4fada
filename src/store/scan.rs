//! A streaming tokenizer for the delimited numeric text files.
//!
//! Fields end at a space, comma, semicolon, newline, or at a period when no decimal point
//! is expected. Carriage returns are skipped, so `\r\n` and `\n` line endings read the same.
//! Any other byte that is not part of a number is ignored.

use std::io::BufRead;

use crate::error::Result;

/// The byte, or end of stream, that ended a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `' '`
    Space,
    /// `','`
    Comma,
    /// `'.'`
    Period,
    /// `';'`
    Semicolon,
    /// `'\n'`
    Newline,
    /// The stream ended inside the field.
    Eof,
}

impl Terminator {
    fn from_byte(c: u8) -> Option<Self> {
        match c {
            b' ' => Some(Self::Space),
            b',' => Some(Self::Comma),
            b'.' => Some(Self::Period),
            b';' => Some(Self::Semicolon),
            b'\n' => Some(Self::Newline),
            _ => None,
        }
    }

    /// Whether this terminator ends a record.
    pub fn ends_line(self) -> bool {
        matches!(self, Self::Newline | Self::Eof)
    }
}

/// A value read from the stream together with what ended it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field<T> {
    /// The parsed value. Zero if the field held no digits.
    pub value: T,
    /// What ended the field.
    pub terminator: Terminator,
    /// Whether the field held no digits at all, as on a blank line.
    pub empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Sign,
    IntegerDigits,
    FractionDigits,
    Terminated(Terminator),
}

/// Fraction digits past this count are dropped; they are below single precision anyway.
const MAX_FRACTION_DIGITS: u32 = 9;

/// Reads numeric fields one byte at a time from a buffered reader.
#[derive(Debug)]
pub struct Scanner<R> {
    reader: R,
}

impl<R: BufRead> Scanner<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Return the wrapped reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        let c = match self.reader.fill_buf()?.first() {
            Some(c) => *c,
            None => return Ok(None),
        };
        self.reader.consume(1);
        Ok(Some(c))
    }

    /// Read an integer field. A period ends the field.
    ///
    /// Returns `None` if the stream is already exhausted.
    pub fn read_int(&mut self) -> Result<Option<Field<i64>>> {
        let Some(number) = self.read_number(false)? else {
            return Ok(None);
        };
        Ok(Some(Field {
            value: number.sign * number.integer.min(i64::MAX as u64) as i64,
            terminator: number.terminator,
            empty: !number.has_digits,
        }))
    }

    /// Read a decimal field. The first period is the decimal point, a second one ends the
    /// field.
    ///
    /// Returns `None` if the stream is already exhausted.
    pub fn read_float(&mut self) -> Result<Option<Field<f32>>> {
        let Some(number) = self.read_number(true)? else {
            return Ok(None);
        };
        let fraction = if number.digits == 0 {
            0.0
        } else {
            number.fraction as f64 / 10f64.powi(number.digits as i32)
        };
        let value = number.sign as f64 * (number.integer as f64 + fraction);
        Ok(Some(Field {
            value: value as f32,
            terminator: number.terminator,
            empty: !number.has_digits,
        }))
    }

    fn read_number(&mut self, decimal: bool) -> Result<Option<Number>> {
        let mut number = Number::default();
        let mut state = State::Sign;
        let mut consumed = false;
        while !matches!(state, State::Terminated(_)) {
            let Some(c) = self.next_byte()? else {
                if !consumed {
                    return Ok(None);
                }
                state = State::Terminated(Terminator::Eof);
                break;
            };
            consumed = true;
            state = match (state, c) {
                (_, b'\r') => state,
                (State::Sign, b'-') => {
                    number.sign = -1;
                    State::IntegerDigits
                }
                (State::Sign | State::IntegerDigits, b'0'..=b'9') => {
                    number.integer = number
                        .integer
                        .saturating_mul(10)
                        .saturating_add(u64::from(c - b'0'));
                    number.has_digits = true;
                    State::IntegerDigits
                }
                (State::Sign | State::IntegerDigits, b'.') if decimal => State::FractionDigits,
                (State::FractionDigits, b'0'..=b'9') => {
                    if number.digits < MAX_FRACTION_DIGITS {
                        number.fraction = number.fraction * 10 + u64::from(c - b'0');
                        number.digits += 1;
                    }
                    number.has_digits = true;
                    State::FractionDigits
                }
                (_, c) => match Terminator::from_byte(c) {
                    Some(t) => State::Terminated(t),
                    None => state,
                },
            };
        }
        if let State::Terminated(t) = state {
            number.terminator = t;
        }
        Ok(Some(number))
    }
}

#[derive(Debug)]
struct Number {
    sign: i64,
    integer: u64,
    fraction: u64,
    digits: u32,
    has_digits: bool,
    terminator: Terminator,
}

impl Default for Number {
    fn default() -> Self {
        Self {
            sign: 1,
            integer: 0,
            fraction: 0,
            digits: 0,
            has_digits: false,
            terminator: Terminator::Eof,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn scanner(text: &str) -> Scanner<Cursor<&[u8]>> {
        Scanner::new(Cursor::new(text.as_bytes()))
    }

    fn ints(text: &str) -> Vec<(i64, Terminator)> {
        let mut s = scanner(text);
        let mut out = Vec::new();
        while let Some(f) = s.read_int().unwrap() {
            out.push((f.value, f.terminator));
        }
        out
    }

    #[test]
    fn every_delimiter_ends_an_integer() {
        assert_eq!(
            ints("1 22,333.4;5\n6"),
            vec![
                (1, Terminator::Space),
                (22, Terminator::Comma),
                (333, Terminator::Period),
                (4, Terminator::Semicolon),
                (5, Terminator::Newline),
                (6, Terminator::Eof),
            ]
        );
    }

    #[test]
    fn carriage_return_is_skipped() {
        assert_eq!(
            ints("12\r\n7\r\n"),
            vec![(12, Terminator::Newline), (7, Terminator::Newline)]
        );
    }

    #[test]
    fn exhausted_stream_reads_nothing() {
        assert_eq!(scanner("").read_int().unwrap(), None);
        assert_eq!(scanner("").read_float().unwrap(), None);
    }

    #[test]
    fn float_keeps_leading_fraction_zeros() {
        let mut s = scanner("0.012345\n-3.500000\n");
        let a = s.read_float().unwrap().unwrap();
        assert!((a.value - 0.012345).abs() < 1e-7);
        assert_eq!(a.terminator, Terminator::Newline);
        let b = s.read_float().unwrap().unwrap();
        assert!((b.value + 3.5).abs() < 1e-7);
    }

    #[test]
    fn second_period_ends_a_float() {
        let mut s = scanner("1.5.2");
        let a = s.read_float().unwrap().unwrap();
        assert_eq!(a.value, 1.5);
        assert_eq!(a.terminator, Terminator::Period);
        let b = s.read_float().unwrap().unwrap();
        assert_eq!(b.value, 2.0);
        assert_eq!(b.terminator, Terminator::Eof);
    }

    #[test]
    fn negative_zero_fraction() {
        let mut s = scanner("-0.000000\n");
        let f = s.read_float().unwrap().unwrap();
        assert_eq!(f.value, 0.0);
    }

    #[test]
    fn blank_line_is_an_empty_field() {
        let mut s = scanner("\r\n5\n");
        let blank = s.read_int().unwrap().unwrap();
        assert!(blank.empty);
        assert_eq!(blank.terminator, Terminator::Newline);
        assert!(!s.read_int().unwrap().unwrap().empty);
    }

    #[test]
    fn unknown_bytes_are_ignored() {
        assert_eq!(ints("4x2 "), vec![(42, Terminator::Space)]);
    }

    #[test]
    fn states_progress_in_order() {
        let mut s = scanner("-12.5 ");
        let n = s.read_number(true).unwrap().unwrap();
        assert_eq!(n.sign, -1);
        assert_eq!(n.integer, 12);
        assert_eq!((n.fraction, n.digits), (5, 1));
        assert_eq!(n.terminator, Terminator::Space);
    }
}
