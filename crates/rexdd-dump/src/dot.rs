//! Graphviz DOT output
//!
//! Nodes are clustered by level and labelled `level:handle`; terminals are
//! drawn as rectangles. Edge styling encodes the stored labels: the child
//! index selects solid (high / pair 11) versus dashed (low / pair 00)
//! strokes, the reduction rule selects the colour, a complement flag turns
//! the arrowhead into a dot, and a swap flag into a diamond.

use std::io::{self, Write};

use rustc_hash::FxHashSet;

use rexdd::{Edge, Forest, ReductionRule};

fn rule_color(rule: ReductionRule) -> &'static str {
    match rule {
        ReductionRule::X => "black",
        r if r.is_el() => "blue",
        r if r.is_eh() => "red",
        r if r.is_al() => "darkgreen",
        r if r.is_ah() => "darkorange",
        _ => "purple",
    }
}

fn edge_attrs(e: Edge, solid: bool) -> String {
    let mut attrs = vec![format!("color={}", rule_color(e.rule()))];
    if !solid {
        attrs.push("style=dashed".into());
    }
    let head = match (e.complement(), e.swap() || e.swap_to()) {
        (true, true) => Some("dotodiamond"),
        (true, false) => Some("dot"),
        (false, true) => Some("odiamond"),
        (false, false) => None,
    };
    if let Some(h) = head {
        attrs.push(format!("arrowhead={h}"));
    }
    if e.value() != 0 {
        attrs.push(format!("label=\"{}\"", e.value()));
    }
    attrs.join(", ")
}

fn node_name(e: Edge) -> String {
    if e.is_terminal() {
        format!("t_{:x}", e.target().bits())
    } else {
        format!("n{}_{}", e.target_level(), e.node())
    }
}

/// Write the subgraphs reachable from `roots` as a DOT digraph.
///
/// `names` labels the root arrows; missing names fall back to `f<i>`.
pub fn dump_dot<W: Write>(
    out: &mut W,
    forest: &Forest,
    roots: &[Edge],
    names: &[&str],
) -> io::Result<()> {
    writeln!(out, "digraph \"{}\" {{", forest.config().name)?;
    writeln!(out, "  node [shape=circle];")?;
    writeln!(out, "  edge [arrowsize=0.8];")?;

    // collect reachable nodes per level and the referenced terminals
    let mut seen: FxHashSet<(u16, u32)> = FxHashSet::default();
    let mut terminal_bits: FxHashSet<u64> = FxHashSet::default();
    let mut terminals: Vec<Edge> = Vec::new();
    let mut stack: Vec<Edge> = roots.to_vec();
    let mut per_level: Vec<Vec<Edge>> = vec![Vec::new(); forest.num_vars() as usize + 1];
    while let Some(e) = stack.pop() {
        if e.is_terminal() {
            if terminal_bits.insert(e.target().bits()) {
                terminals.push(e);
            }
            continue;
        }
        if seen.insert((e.target_level(), e.node())) {
            per_level[e.target_level() as usize].push(e);
            stack.extend(forest.node_edges(e));
        }
    }

    for k in (1..=forest.num_vars() as usize).rev() {
        if per_level[k].is_empty() {
            continue;
        }
        writeln!(out, "  subgraph cluster_level_{k} {{")?;
        writeln!(out, "    rank=same; label=\"x{k}\"; style=dotted;")?;
        for e in &per_level[k] {
            writeln!(
                out,
                "    {} [label=\"{}:{}\"];",
                node_name(*e),
                e.target_level(),
                e.node()
            )?;
        }
        writeln!(out, "  }}")?;
    }

    for t in &terminals {
        writeln!(
            out,
            "  {} [shape=rectangle, label=\"{}\"];",
            node_name(*t),
            t.target().terminal_value()
        )?;
    }

    for k in 1..=forest.num_vars() as usize {
        for e in &per_level[k] {
            let children = forest.node_edges(*e);
            let last = children.len() - 1;
            for (i, c) in children.into_iter().enumerate() {
                writeln!(
                    out,
                    "  {} -> {} [{}];",
                    node_name(*e),
                    node_name(c),
                    edge_attrs(c, i == last)
                )?;
            }
        }
    }

    for (i, r) in roots.iter().enumerate() {
        let label = names.get(i).copied().unwrap_or("");
        let label = if label.is_empty() {
            format!("f{i}")
        } else {
            label.to_string()
        };
        writeln!(out, "  root_{i} [shape=none, label=\"{label}\"];")?;
        writeln!(out, "  root_{i} -> {} [{}];", node_name(*r), edge_attrs(*r, true))?;
    }

    writeln!(out, "}}")
}
