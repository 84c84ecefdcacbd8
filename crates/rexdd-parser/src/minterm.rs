//! PLA-like minterm files
//!
//! ```text
//! .type f
//! .i 4
//! .o 1
//! .p 3
//! 0110 1
//! 1-01 2
//! 0--- 1
//! .end
//! ```
//!
//! Header lines declare the function type, the input bit count, the output
//! bit count and the number of minterms. Body lines pair an assignment
//! string over `0`, `1` and `-` (don't-care) with an integer outcome code.
//! The leftmost assignment character is the variable at level 1.

use std::fmt;

use bitvec::vec::BitVec;
use derive_builder::Builder;
use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{digit1, space0, space1},
    combinator::map_res,
    sequence::preceded,
    IResult,
};
use rexdd::{ExplicitFunc, Value};

/// Options of the minterm reader
#[derive(Clone, Debug, Builder)]
pub struct MintermOptions {
    /// Fail when the body length disagrees with the `.p` header
    #[builder(default = "true")]
    pub strict_count: bool,
    /// Outcome for assignments no minterm covers
    #[builder(default = "0")]
    pub default_outcome: i64,
    /// Upper bound on accepted minterms (guards against corrupt headers)
    #[builder(default = "None")]
    pub max_minterms: Option<usize>,
}

impl Default for MintermOptions {
    fn default() -> MintermOptions {
        MintermOptionsBuilder::default().build().unwrap()
    }
}

/// A parsed minterm file
#[derive(Debug)]
pub struct MintermFile {
    /// Number of input bits (`.i`)
    pub num_inputs: u16,
    /// Number of output bits (`.o`)
    pub num_outputs: u32,
    /// The rows, ready for [`ExplicitFunc::build`]
    pub func: ExplicitFunc,
}

/// Parse failure with its 1-based line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line of the offending input
    pub line: usize,
    /// What went wrong
    pub message: String,
}

impl ParseError {
    fn new(line: usize, message: impl Into<String>) -> ParseError {
        ParseError {
            line,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}

fn header_u64<'a>(key: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, u64> {
    preceded(
        preceded(tag(key), space1),
        map_res(digit1, |s: &str| s.parse::<u64>()),
    )
}

fn minterm_line(input: &str) -> IResult<&str, (&str, i64)> {
    let (rest, pattern) = take_while1(|c| c == '0' || c == '1' || c == '-')(input)?;
    let (rest, outcome) = preceded(
        space1,
        map_res(
            take_while1(|c: char| c.is_ascii_digit() || c == '-'),
            |s: &str| s.parse::<i64>(),
        ),
    )(rest)?;
    let (rest, _) = space0(rest)?;
    Ok((rest, (pattern, outcome)))
}

/// Does the line hold anything besides whitespace and `#` comments?
fn content_of(line: &str) -> Option<&str> {
    let line = match memchr::memchr(b'#', line.as_bytes()) {
        Some(pos) => &line[..pos],
        None => line,
    };
    let line = line.trim();
    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Parse a complete minterm file into rows for the explicit-function
/// bridge.
pub fn parse_minterms(input: &str, options: &MintermOptions) -> Result<MintermFile, ParseError> {
    let mut lines = input.lines().enumerate();

    let mut num_inputs: Option<u64> = None;
    let mut num_outputs: u64 = 1;
    let mut declared: Option<u64> = None;

    // header section
    let mut body_start: Option<(usize, &str)> = None;
    for (no, raw) in lines.by_ref() {
        let Some(line) = content_of(raw) else { continue };
        if line.starts_with(".type") {
            continue;
        }
        if let Ok((_, v)) = header_u64(".i")(line) {
            num_inputs = Some(v);
            continue;
        }
        if let Ok((_, v)) = header_u64(".o")(line) {
            num_outputs = v;
            continue;
        }
        if let Ok((_, v)) = header_u64(".p")(line) {
            declared = Some(v);
            continue;
        }
        body_start = Some((no, line));
        break;
    }

    let num_inputs = num_inputs
        .ok_or_else(|| ParseError::new(1, "missing .i header"))?;
    if num_inputs == 0 || num_inputs > u16::MAX as u64 {
        return Err(ParseError::new(1, "unreasonable input bit count"));
    }

    let mut func = ExplicitFunc::new_set(num_inputs as u16, Value::Int(options.default_outcome));
    let mut count: u64 = 0;
    let mut ended = false;

    let mut handle_line = |no: usize, line: &str, func: &mut ExplicitFunc, count: &mut u64| -> Result<bool, ParseError> {
        if line == ".end" {
            return Ok(true);
        }
        let (rest, (pattern, outcome)) = minterm_line(line)
            .map_err(|_| ParseError::new(no + 1, "malformed minterm line"))?;
        if !rest.is_empty() {
            return Err(ParseError::new(no + 1, "trailing characters after the outcome"));
        }
        if pattern.len() != num_inputs as usize {
            return Err(ParseError::new(
                no + 1,
                format!("assignment has {} characters, expected {num_inputs}", pattern.len()),
            ));
        }
        func.add_minterm(pattern, Value::Int(outcome))
            .map_err(|e| ParseError::new(no + 1, e.to_string()))?;
        *count += 1;
        if let Some(max) = options.max_minterms {
            if *count as usize > max {
                return Err(ParseError::new(no + 1, "minterm buffer limit exceeded"));
            }
        }
        Ok(false)
    };

    if let Some((no, line)) = body_start {
        ended = handle_line(no, line, &mut func, &mut count)?;
    }
    let mut last_no = 0;
    if !ended {
        for (no, raw) in lines {
            last_no = no;
            let Some(line) = content_of(raw) else { continue };
            if handle_line(no, line, &mut func, &mut count)? {
                ended = true;
                break;
            }
        }
    }
    if !ended {
        return Err(ParseError::new(last_no + 1, "missing .end terminator"));
    }
    if options.strict_count {
        if let Some(d) = declared {
            if d != count {
                return Err(ParseError::new(
                    last_no + 1,
                    format!("header declared {d} minterms, found {count}"),
                ));
            }
        }
    }

    Ok(MintermFile {
        num_inputs: num_inputs as u16,
        num_outputs: num_outputs as u32,
        func,
    })
}

/// Bit-vector view of a fully specified pattern, for callers that index
/// assignments directly
pub fn pattern_bits(pattern: &str) -> Option<BitVec> {
    let mut bits = BitVec::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '0' => bits.push(false),
            '1' => bits.push(true),
            _ => return None,
        }
    }
    Some(bits)
}
