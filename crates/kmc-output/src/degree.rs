//! Per-month degree-distribution snapshots.
//!
//! Written once per simulated month (at rollover) and once at the end of a
//! run: `out-degree_distribution_month_NNN.dat`, `in-…`, and `cumulative-…`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use kmc_core::AgentId;
use kmc_network::Network;

use crate::error::OutputResult;

const HEADER_TAIL: &str = "degree distribution. The data order is:\n\
                           # degree, normalized probability, log of degree, log of normalized probability\n";

/// Write the out-, in-, and cumulative-degree distributions for `month`.
pub fn write_degree_distributions(dir: &Path, net: &Network, month: usize) -> OutputResult<()> {
    let n = net.size() as usize;

    let mut max_out = 0;
    let mut max_in = 0;
    for i in 0..n {
        let id = AgentId(i as u32);
        max_out = max_out.max(net.followees_size(id));
        max_in = max_in.max(net.followers_size(id));
    }

    let mut out_distro = vec![0u64; max_out + 1];
    let mut in_distro = vec![0u64; max_in + 1];
    let mut cum_distro = vec![0u64; max_out + max_in + 1];
    for i in 0..n {
        let id = AgentId(i as u32);
        let out_degree = net.followees_size(id);
        let in_degree = net.followers_size(id);
        out_distro[out_degree] += 1;
        in_distro[in_degree] += 1;
        cum_distro[out_degree + in_degree] += 1;
    }

    write_one(dir, "out", month, n, &out_distro)?;
    write_one(dir, "in", month, n, &in_distro)?;
    write_one(dir, "cumulative", month, n, &cum_distro)?;
    Ok(())
}

fn write_one(dir: &Path, kind: &str, month: usize, n: usize, distro: &[u64]) -> OutputResult<()> {
    let path = dir.join(format!("{kind}-degree_distribution_month_{month:03}.dat"));
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "# This is the {kind}-{HEADER_TAIL}")?;
    let denominator = n.max(1) as f64;
    for (degree, count) in distro.iter().enumerate() {
        let p = *count as f64 / denominator;
        writeln!(out, "{degree}\t{p}\t{}\t{}", (degree as f64).ln(), p.ln())?;
    }
    out.flush()?;
    Ok(())
}
