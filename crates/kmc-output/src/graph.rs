//! Directed-graph dumps: tab-separated edge list, GEXF, and GraphML.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use kmc_core::AgentId;
use kmc_network::Network;

use crate::error::{OutputError, OutputResult};

// ── network.dat ───────────────────────────────────────────────────────────────

/// Tab-separated `followee \t follower` edge list.
pub fn write_edge_list(dir: &Path, net: &Network) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(dir.join("network.dat"))?);
    writeln!(out, "# Agent ID\tFollower ID\n")?;
    for id in 0..net.size() {
        for follower in net.follower_ids(AgentId(id)) {
            writeln!(out, "{id}\t{follower}")?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Parse an edge list written by [`write_edge_list`] back into
/// `(followee, follower)` pairs.
pub fn read_edge_list(path: &Path) -> OutputResult<Vec<(u32, u32)>> {
    let reader = BufReader::new(File::open(path)?);
    let mut edges = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mut parts = text.split_whitespace();
        let parse = |field: Option<&str>| {
            field
                .and_then(|f| f.parse::<u32>().ok())
                .ok_or_else(|| OutputError::MalformedEdgeList {
                    line: line_no + 1,
                    text: text.to_string(),
                })
        };
        let followee = parse(parts.next())?;
        let follower = parse(parts.next())?;
        edges.push((followee, follower));
    }
    Ok(edges)
}

// ── network.gexf ──────────────────────────────────────────────────────────────

pub fn write_gexf(dir: &Path, net: &Network) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(dir.join("network.gexf"))?);
    writeln!(out, "<gexf version=\"1.2\">")?;
    writeln!(out, "<meta>")?;
    writeln!(out, "<creator>kmc</creator>")?;
    writeln!(out, "<description>social network simulator</description>")?;
    writeln!(out, "</meta>")?;
    writeln!(out, "<graph mode=\"static\" defaultedgetype=\"directed\">")?;
    writeln!(out, "<nodes>")?;
    for id in 0..net.size() {
        let ty = net.agent_type(AgentId(id));
        writeln!(out, "<node id=\"{id}\" label=\"{}\" />", ty.0)?;
    }
    writeln!(out, "</nodes>")?;
    writeln!(out, "<edges>")?;
    let mut count = 0usize;
    for id in 0..net.size() {
        for followee in net.followee_ids(AgentId(id)) {
            writeln!(out, "<edge id=\"{count}\" source=\"{id}\" target=\"{followee}\"/>")?;
            count += 1;
        }
    }
    writeln!(out, "</edges>")?;
    writeln!(out, "</graph>")?;
    write!(out, "</gexf>")?;
    out.flush()?;
    Ok(())
}

// ── network.graphml ───────────────────────────────────────────────────────────

pub fn write_graphml(dir: &Path, net: &Network) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(dir.join("network.graphml"))?);
    writeln!(out, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
    writeln!(out, "<graphml>")?;
    writeln!(out, "\t<graph id=\"G\" edgedefault=\"directed\">")?;
    for id in 0..net.size() {
        let ty = net.agent_type(AgentId(id));
        writeln!(out, "\t\t<node id=\"{id}\" label=\"{}\" />", ty.0)?;
    }
    let mut count = 0usize;
    for id in 0..net.size() {
        for followee in net.followee_ids(AgentId(id)) {
            writeln!(
                out,
                "\t\t<edge id=\"{count}\" source=\"{id}\" target=\"{followee}\"/>"
            )?;
            count += 1;
        }
    }
    writeln!(out, "\t</graph>")?;
    write!(out, "</graphml>")?;
    out.flush()?;
    Ok(())
}
