//! Aggregate statistics writers: `main_stats.dat`, `Categories_Distro.dat`,
//! `dd_by_follow_model.dat`, and the per-type `<name>_info.dat` files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use kmc_core::{AgentId, TypeId};
use kmc_network::Network;

use crate::error::OutputResult;
use crate::views::{FollowStats, METHOD_LABELS};

/// Percentage of `part` in `whole`; 0 when the denominator is empty.
fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 { 0.0 } else { 100.0 * part as f64 / whole as f64 }
}

// ── main_stats.dat ────────────────────────────────────────────────────────────

/// Totals per agent type plus per-model follow counts.
pub fn write_main_stats(dir: &Path, net: &Network, stats: &FollowStats) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(dir.join("main_stats.dat"))?);

    writeln!(out, "+--------------------+")?;
    writeln!(out, "| MAIN NETWORK STATS |")?;
    writeln!(out, "+--------------------+")?;
    writeln!(out)?;
    writeln!(out, "USERS")?;
    writeln!(out, "_____")?;
    writeln!(out)?;
    let total = net.size() as u64;
    writeln!(out, "Total: {total}")?;
    for t in 0..net.type_count() {
        let ty = TypeId(t as u16);
        let count = net.count(ty) as u64;
        writeln!(
            out,
            "{}: {count}\t({:.6}% of total agents)",
            net.type_name(ty),
            pct(count, total)
        )?;
    }
    writeln!(out)?;

    writeln!(out, "FOLLOWS")?;
    writeln!(out, "_______")?;
    writeln!(out)?;
    writeln!(out, "Total follows: {}", stats.total_follows)?;
    let attempts: u64 = stats.model_attempts.iter().sum();
    writeln!(out, "Total follow attempts: {attempts}")?;
    for (label, count) in METHOD_LABELS.iter().zip(stats.model_attempts) {
        writeln!(
            out,
            "{label}: {count}\t({:.6}% of total follow attempts)",
            pct(count, attempts)
        )?;
    }
    for (t, follows) in stats.per_type_follows.iter().enumerate() {
        writeln!(
            out,
            "{}: {follows}\t({:.6}% of total follows)",
            net.type_name(TypeId(t as u16)),
            pct(*follows, stats.total_follows)
        )?;
    }

    out.flush()?;
    Ok(())
}

// ── Categories_Distro.dat ─────────────────────────────────────────────────────

/// Per-bin populations of the preferential-attachment structure.
pub fn write_categories_distro(dir: &Path, bin_sizes: &[usize]) -> OutputResult<()> {
    let mut out = BufWriter::new(File::create(dir.join("Categories_Distro.dat"))?);
    write!(out, "Following | ")?;
    for (i, size) in bin_sizes.iter().enumerate() {
        write!(out, "{size} at {i}|\t")?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

// ── dd_by_follow_model.dat ────────────────────────────────────────────────────

/// Degree distribution partitioned over the seven follow methods.
///
/// `followee_methods[i]` / `follower_methods[i]` are agent `i`'s per-method
/// edge counts on the in- and out-side; the two sum to the agent's
/// method-attributed degree.
pub fn write_dd_by_follow_model(
    dir: &Path,
    net: &Network,
    followee_methods: &[[u64; 7]],
    follower_methods: &[[u64; 7]],
) -> OutputResult<()> {
    let n = net.size() as usize;
    debug_assert!(followee_methods.len() >= n && follower_methods.len() >= n);

    let max_degree = (0..n)
        .map(|i| {
            let id = AgentId(i as u32);
            net.followers_size(id) + net.followees_size(id)
        })
        .max()
        .map_or(1, |d| d + 1);

    // histogram[degree][method]
    let mut histogram = vec![[0u64; 7]; max_degree];
    for i in 0..n {
        for m in 0..7 {
            let degree = (followee_methods[i][m] + follower_methods[i][m]) as usize;
            histogram[degree.min(max_degree - 1)][m] += 1;
        }
    }

    let mut out = BufWriter::new(File::create(dir.join("dd_by_follow_model.dat"))?);
    write!(
        out,
        "# Degree distribution by follow model. The data order is:\n# degree\tlog_of_degree"
    )?;
    for label in METHOD_LABELS {
        write!(
            out,
            "\t{label}-normalized_probability\t{label}-log_of_normalized_probability"
        )?;
    }
    writeln!(out, "\n")?;

    for (degree, row) in histogram.iter().enumerate() {
        write!(out, "{degree}\t{}", (degree as f64).ln())?;
        for count in row {
            let p = *count as f64 / n as f64;
            write!(out, "\t{p}\t{}", p.ln())?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}

// ── <type>_info.dat ───────────────────────────────────────────────────────────

/// Per-type degree distributions and who-follows-whom percentages.
pub fn write_agent_type_info(dir: &Path, net: &Network) -> OutputResult<()> {
    for t in 0..net.type_count() {
        write_one_type(dir, net, TypeId(t as u16))?;
    }
    Ok(())
}

fn write_one_type(dir: &Path, net: &Network, ty: TypeId) -> OutputResult<()> {
    let count = net.count(ty);
    let max_degree = (0..count)
        .map(|k| {
            let id = net.agent_by_type(ty, k);
            net.followers_size(id) + net.followees_size(id)
        })
        .max()
        .unwrap_or(0);

    let mut in_distro = vec![0u64; max_degree + 1];
    let mut out_distro = vec![0u64; max_degree + 1];
    let mut cum_distro = vec![0u64; max_degree + 1];
    // types of the agents following / followed by this type
    let mut follower_types = vec![0u64; net.type_count()];
    let mut followee_types = vec![0u64; net.type_count()];

    for k in 0..count {
        let id = net.agent_by_type(ty, k);
        let in_degree = net.followers_size(id);
        let out_degree = net.followees_size(id);
        in_distro[in_degree] += 1;
        out_distro[out_degree] += 1;
        cum_distro[in_degree + out_degree] += 1;
        for f in net.follower_ids(id) {
            follower_types[net.agent_type(AgentId(f)).index()] += 1;
        }
        for f in net.followee_ids(id) {
            followee_types[net.agent_type(AgentId(f)).index()] += 1;
        }
    }
    let follower_sum: u64 = follower_types.iter().sum();
    let followee_sum: u64 = followee_types.iter().sum();

    let name = net.type_name(ty);
    let mut out = BufWriter::new(File::create(dir.join(format!("{name}_info.dat")))?);

    write!(out, "# Agent percentages following agent type '{name}'\n# ")?;
    for (t, n) in follower_types.iter().enumerate() {
        write!(out, "{}: {:.6}   ", net.type_name(TypeId(t as u16)), pct(*n, follower_sum))?;
    }
    write!(out, "\n# Agent percentages that agent type '{name}' follows\n# ")?;
    for (t, n) in followee_types.iter().enumerate() {
        write!(out, "{}: {:.6}   ", net.type_name(TypeId(t as u16)), pct(*n, followee_sum))?;
    }
    writeln!(
        out,
        "\n# degree\tin_degree\tout_degree\tcumulative\tlog(degree)\tlog(in_degree)\tlog(out_degree)\tlog(cumulative)\n"
    )?;

    let denominator = count.max(1) as f64;
    for degree in 0..=max_degree {
        let p_in = in_distro[degree] as f64 / denominator;
        let p_out = out_distro[degree] as f64 / denominator;
        let p_cum = cum_distro[degree] as f64 / denominator;
        writeln!(
            out,
            "{degree}\t{p_in}\t{p_out}\t{p_cum}\t{}\t{}\t{}\t{}",
            (degree as f64).ln(),
            p_in.ln(),
            p_out.ln(),
            p_cum.ln()
        )?;
    }
    out.flush()?;
    Ok(())
}
