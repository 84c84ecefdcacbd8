//! The text exchange format
//!
//! ```text
//! BDD | EVBDD | BMXD
//! L <vars>
//! T <terminals>
//! N <nodes>
//! R <roots>
//! S <swapped-flag>
//! V <shift-flag>
//! M <modulus>          (modular edge-valued diagrams only)
//! ; level k
//! n <count>
//! <low> [<low-val>] <high> [<high-val>] ; <node-id>
//! ; roots
//! r <target> [v <edge-val>]
//! ```
//!
//! Node ids are assigned sequentially starting at the terminal count,
//! level by level from the bottom, so every referenced id is defined
//! before use. BMXD node lines carry four targets in (from, to) order
//! (0,0) (0,1) (1,0) (1,1).
//!
//! The writer expands reduction rules, complement bits and swap bits into
//! explicit per-level nodes; the reader rebuilds every node through the
//! destination forest's reduction algebra. Because edges are canonical,
//! a write/read cycle into a forest with the same configuration yields the
//! identical edge. Round-trip is only guaranteed for shift flag 0; the
//! writer always emits `V 0` and the reader rejects anything else.

use std::fmt;
use std::io::{self, BufRead, Write};

use rustc_hash::FxHashMap;

use rexdd::{DdError, Edge, EdgeLabel, Encoding, Forest, Level, Special, Value};

/// Errors raised while writing a diagram
#[derive(Debug)]
pub enum ExportError {
    /// Underlying I/O failure
    Io(io::Error),
    /// The diagram uses a value the format cannot carry
    Unsupported(&'static str),
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> ExportError {
        ExportError::Io(e)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "export failed: {e}"),
            ExportError::Unsupported(what) => write!(f, "export unsupported: {what}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// Errors raised while reading a diagram
#[derive(Debug)]
pub enum ImportError {
    /// Underlying I/O failure
    Io(io::Error),
    /// Malformed input, with the 1-based line number
    Syntax(usize, String),
    /// The file does not fit the destination forest
    Mismatch(&'static str),
    /// The destination forest rejected an edge
    Forest(DdError),
}

impl From<io::Error> for ImportError {
    fn from(e: io::Error) -> ImportError {
        ImportError::Io(e)
    }
}

impl From<DdError> for ImportError {
    fn from(e: DdError) -> ImportError {
        ImportError::Forest(e)
    }
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Io(e) => write!(f, "import failed: {e}"),
            ImportError::Syntax(line, msg) => write!(f, "line {line}: {msg}"),
            ImportError::Mismatch(what) => write!(f, "file does not fit the forest: {what}"),
            ImportError::Forest(e) => write!(f, "import failed: {e}"),
        }
    }
}

impl std::error::Error for ImportError {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Family {
    Bdd,
    Evbdd,
    Bmxd,
}

impl Family {
    fn of(forest: &Forest) -> Family {
        if forest.is_relation() {
            Family::Bmxd
        } else if forest.config().encoding != Encoding::Terminal {
            Family::Evbdd
        } else {
            Family::Bdd
        }
    }

    fn name(self) -> &'static str {
        match self {
            Family::Bdd => "BDD",
            Family::Evbdd => "EVBDD",
            Family::Bmxd => "BMXD",
        }
    }
}

fn terminal_count(forest: &Forest) -> Result<u32, ExportError> {
    match Family::of(forest) {
        Family::Evbdd => Ok(1),
        _ => {
            let max = forest.config().max_value();
            if !(0..=u32::MAX as i64 - 1).contains(&max) {
                return Err(ExportError::Unsupported(
                    "terminal range too large for sequential ids",
                ));
            }
            Ok(max as u32 + 1)
        }
    }
}

/// A quasi-expanded node: child references (level, per-level index) plus
/// edge values; final ids are assigned once all levels are complete
struct FlatNode {
    children: Vec<((Level, u32), i64)>,
}

struct Expander<'a> {
    forest: &'a Forest,
    family: Family,
    terminals: u32,
    /// per level (index `level - 1`), in creation order
    levels: Vec<Vec<FlatNode>>,
    memo: FxHashMap<(Level, Edge), (Level, u32)>,
}

impl Expander<'_> {
    /// Expand `e`, viewed at `k`, into the quasi graph; returns a level
    /// plus per-level index, or the terminal id for `k == 0`.
    fn expand(&mut self, k: Level, e: Edge) -> Result<(Level, u32), ExportError> {
        let e = e.with_value(0);
        if k == 0 {
            let id = match self.forest.terminal_value_of(e) {
                Some(Value::Int(v)) if self.family != Family::Evbdd => {
                    if v < 0 || v as u32 >= self.terminals {
                        return Err(ExportError::Unsupported("terminal outside the range"));
                    }
                    v as u32
                }
                Some(Value::Special(Special::Omega)) | Some(Value::Int(_)) => 0,
                _ => return Err(ExportError::Unsupported("special terminal value")),
            };
            return Ok((0, id));
        }
        if let Some(r) = self.memo.get(&(k, e)) {
            return Ok(*r);
        }
        let arity = if self.family == Family::Bmxd { 4 } else { 2 };
        let mut children = Vec::with_capacity(arity);
        for i in 0..arity {
            let c = if self.family == Family::Bmxd {
                self.forest.cofactor_rel(k, e, i)
            } else {
                self.forest.cofactor(k, e, i)
            };
            let target = self.expand(k - 1, c)?;
            children.push((target, c.value()));
        }
        let idx = self.levels[k as usize - 1].len() as u32;
        self.levels[k as usize - 1].push(FlatNode { children });
        self.memo.insert((k, e), (k, idx));
        Ok((k, idx))
    }
}

/// Write `roots` (edges of `forest`) in the exchange format.
pub fn export<W: Write>(
    out: &mut W,
    forest: &Forest,
    roots: &[Edge],
) -> Result<(), ExportError> {
    let family = Family::of(forest);
    let terminals = terminal_count(forest)?;
    let num_vars = forest.num_vars();

    let mut ex = Expander {
        forest,
        family,
        terminals,
        levels: (0..num_vars).map(|_| Vec::new()).collect(),
        memo: FxHashMap::default(),
    };
    let mut root_refs = Vec::with_capacity(roots.len());
    for &r in roots {
        let target = ex.expand(num_vars, r)?;
        root_refs.push((target, r.value()));
    }

    // final ids: terminals, then level 1 upwards in creation order
    let mut level_offset = vec![0u32; num_vars as usize + 1];
    let mut next = terminals;
    for k in 1..=num_vars as usize {
        level_offset[k] = next;
        next += ex.levels[k - 1].len() as u32;
    }
    let final_id = |(lvl, idx): (Level, u32)| -> u32 {
        if lvl == 0 {
            idx
        } else {
            level_offset[lvl as usize] + idx
        }
    };
    let num_nodes: usize = ex.levels.iter().map(Vec::len).sum();

    writeln!(out, "{}", family.name())?;
    writeln!(out, "L {num_vars}")?;
    writeln!(out, "T {terminals}")?;
    writeln!(out, "N {num_nodes}")?;
    writeln!(out, "R {}", roots.len())?;
    writeln!(out, "S 0")?;
    writeln!(out, "V 0")?;
    if let Some(m) = forest.config().modulus() {
        if forest.config().encoding == Encoding::EdgePlusMod {
            writeln!(out, "M {m}")?;
        }
    }

    for k in 1..=num_vars as usize {
        writeln!(out, "; level {k}")?;
        writeln!(out, "n {}", ex.levels[k - 1].len())?;
        for (idx, node) in ex.levels[k - 1].iter().enumerate() {
            let mut first = true;
            for &(target, value) in &node.children {
                if !first {
                    write!(out, "\t")?;
                }
                first = false;
                write!(out, "{}", final_id(target))?;
                if family == Family::Evbdd {
                    write!(out, " {value}")?;
                }
            }
            writeln!(out, "\t; {}", level_offset[k] + idx as u32)?;
        }
    }

    writeln!(out, "; roots")?;
    for (target, value) in root_refs {
        write!(out, "r {}", final_id(target))?;
        if family == Family::Evbdd {
            write!(out, " v {value}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Strip a trailing `; …` comment.
fn strip_comment(line: &str) -> &str {
    match memchr::memchr(b';', line.as_bytes()) {
        Some(pos) => &line[..pos],
        None => line,
    }
    .trim()
}

struct HeaderField(u64);

fn parse_header_line(line: &str, key: &str) -> Option<HeaderField> {
    let rest = line.strip_prefix(key)?.trim();
    rest.parse().ok().map(HeaderField)
}

/// Read a diagram in the exchange format into `forest`; returns the root
/// edges in file order.
pub fn import<R: BufRead>(input: R, forest: &mut Forest) -> Result<Vec<Edge>, ImportError> {
    let family = Family::of(forest);
    let mut lines = input.lines().enumerate();

    let mut next_line = |expect: &str| -> Result<(usize, String), ImportError> {
        for (no, line) in lines.by_ref() {
            let line = line?;
            let stripped = strip_comment(&line);
            if !stripped.is_empty() {
                return Ok((no + 1, stripped.to_string()));
            }
        }
        Err(ImportError::Syntax(0, format!("unexpected end of file, expected {expect}")))
    };

    let (no, fam_line) = next_line("family header")?;
    if fam_line != family.name() {
        return Err(ImportError::Syntax(
            no,
            format!("family {fam_line} does not match the forest"),
        ));
    }

    let mut num_vars = 0u64;
    let mut terminals = 0u64;
    let mut num_nodes = 0u64;
    let mut num_roots = 0u64;
    let mut modulus: Option<u64> = None;

    // header fields until the first `n` block
    let mut pending: Option<(usize, String)> = None;
    loop {
        let (no, line) = next_line("header field")?;
        if let Some(f) = parse_header_line(&line, "L ") {
            num_vars = f.0;
        } else if let Some(f) = parse_header_line(&line, "T ") {
            terminals = f.0;
        } else if let Some(f) = parse_header_line(&line, "N ") {
            num_nodes = f.0;
        } else if let Some(f) = parse_header_line(&line, "R ") {
            num_roots = f.0;
        } else if let Some(f) = parse_header_line(&line, "S ") {
            if f.0 != 0 {
                return Err(ImportError::Mismatch("swapped files are not supported"));
            }
        } else if let Some(f) = parse_header_line(&line, "V ") {
            if f.0 != 0 {
                // level renumbering under nonzero shifts is not defined
                // well enough to round-trip
                return Err(ImportError::Mismatch("shift flag must be 0"));
            }
        } else if let Some(f) = parse_header_line(&line, "M ") {
            modulus = Some(f.0);
        } else {
            pending = Some((no, line));
            break;
        }
    }

    if num_vars != forest.num_vars() as u64 {
        return Err(ImportError::Mismatch("variable count differs"));
    }
    if let Some(m) = modulus {
        if forest.config().modulus() != Some(m) {
            return Err(ImportError::Mismatch("modulus differs"));
        }
    }

    if terminals > 1 << 24 {
        return Err(ImportError::Mismatch("unreasonable terminal count"));
    }

    // terminal edges by id; the vector grows with the node lines actually
    // present rather than trusting the header
    let mut edges: Vec<Edge> = Vec::with_capacity(terminals as usize);
    for t in 0..terminals {
        let e = match family {
            Family::Evbdd => Edge::omega(0),
            _ => forest.terminal(Value::Int(t as i64))?,
        };
        edges.push(e);
    }

    let arity = if family == Family::Bmxd { 4 } else { 2 };
    let mut k: Level = 0;
    let mut remaining_in_level = 0u64;
    let mut seen_nodes = 0u64;
    while seen_nodes < num_nodes {
        let (no, line) = match pending.take() {
            Some(p) => p,
            None => next_line("node line")?,
        };
        if let Some(f) = parse_header_line(&line, "n ") {
            k += 1;
            remaining_in_level = f.0;
            continue;
        }
        if remaining_in_level == 0 {
            return Err(ImportError::Syntax(no, "node line outside a level block".into()));
        }
        let mut fields = line.split_whitespace();
        let mut children = Vec::with_capacity(arity);
        for _ in 0..arity {
            let id: u64 = fields
                .next()
                .ok_or_else(|| ImportError::Syntax(no, "missing child target".into()))?
                .parse()
                .map_err(|_| ImportError::Syntax(no, "malformed child target".into()))?;
            let mut child = *edges
                .get(id as usize)
                .ok_or_else(|| ImportError::Syntax(no, "forward reference".into()))?;
            if family == Family::Evbdd {
                let v: i64 = fields
                    .next()
                    .ok_or_else(|| ImportError::Syntax(no, "missing edge value".into()))?
                    .parse()
                    .map_err(|_| ImportError::Syntax(no, "malformed edge value".into()))?;
                child = child.with_value(v);
            }
            children.push(child);
        }
        let e = forest.reduce_edge(k, EdgeLabel::default(), k, &children, 0)?;
        edges.push(e);
        remaining_in_level -= 1;
        seen_nodes += 1;
    }

    let mut roots = Vec::with_capacity(num_roots as usize);
    for _ in 0..num_roots {
        // empty trailing level blocks may sit between the nodes and the
        // roots; skip their `n 0` markers
        let (no, line) = loop {
            let (no, line) = match pending.take() {
                Some(p) => p,
                None => next_line("root line")?,
            };
            match parse_header_line(&line, "n ") {
                Some(f) if f.0 == 0 => continue,
                Some(_) => {
                    return Err(ImportError::Syntax(no, "node block after the node count".into()))
                }
                None => break (no, line),
            }
        };
        let rest = line
            .strip_prefix('r')
            .ok_or_else(|| ImportError::Syntax(no, "expected a root line".into()))?
            .trim();
        let mut fields = rest.split_whitespace();
        let id: u64 = fields
            .next()
            .ok_or_else(|| ImportError::Syntax(no, "missing root target".into()))?
            .parse()
            .map_err(|_| ImportError::Syntax(no, "malformed root target".into()))?;
        let mut e = *edges
            .get(id as usize)
            .ok_or_else(|| ImportError::Syntax(no, "dangling root target".into()))?;
        if let Some(v_key) = fields.next() {
            if v_key == "v" {
                let v: i64 = fields
                    .next()
                    .ok_or_else(|| ImportError::Syntax(no, "missing root value".into()))?
                    .parse()
                    .map_err(|_| ImportError::Syntax(no, "malformed root value".into()))?;
                e = e.with_value(v);
            }
        }
        let top = forest.num_vars();
        roots.push(forest.normalize_edge(top, e)?);
    }
    Ok(roots)
}
