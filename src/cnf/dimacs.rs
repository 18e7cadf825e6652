use std::fmt::Write as _;
use std::io::BufRead;

use anyhow::{Context, Result, bail};

use super::cnf::{Assignment, Formula, Lit};

/// Parsed DIMACS text plus the header counts, when a header was present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimacsCnf {
    pub formula: Formula<u32>,
    pub declared_vars: Option<u32>,
    pub declared_clauses: Option<usize>,
}

pub fn parse_dimacs_str(s: &str) -> Result<DimacsCnf> {
    parse_dimacs_reader(std::io::Cursor::new(s.as_bytes()))
}

pub fn parse_dimacs_reader<R: BufRead>(r: R) -> Result<DimacsCnf> {
    let mut clauses = Vec::<Vec<Lit<u32>>>::new();
    let mut current = Vec::<Lit<u32>>::new();
    let mut header: Option<(u32, usize)> = None;

    for (idx, line) in r.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.context("failed to read dimacs line")?;
        let clean = line.trim();
        if clean.is_empty() || clean.starts_with('c') {
            continue;
        }
        // some benchmark sets end with a lone '%' line
        if clean.starts_with('%') {
            break;
        }
        if let Some(rest) = clean.strip_prefix('p') {
            if header.is_some() {
                bail!("line {}: duplicate problem line", line_no);
            }
            let parsed = parse_header(rest)
                .with_context(|| format!("line {}: invalid problem line", line_no))?;
            header = Some(parsed);
            continue;
        }

        for tok in clean.split_whitespace() {
            let value = tok
                .parse::<i64>()
                .with_context(|| format!("line {}: invalid literal '{}'", line_no, tok))?;
            if value == 0 {
                clauses.push(std::mem::take(&mut current));
                continue;
            }
            let var = u32::try_from(value.unsigned_abs())
                .with_context(|| format!("line {}: variable {} out of range", line_no, value))?;
            if let Some((num_vars, _)) = header {
                if var > num_vars {
                    bail!(
                        "line {}: variable {} exceeds declared count {}",
                        line_no,
                        var,
                        num_vars
                    );
                }
            }
            current.push(Lit::new(var, value > 0));
        }
    }

    // tolerate a missing terminator on the last clause
    if !current.is_empty() {
        clauses.push(current);
    }

    if let Some((_, num_clauses)) = header {
        if clauses.len() != num_clauses {
            log::warn!(
                target: crate::log::targets::DIMACS,
                "header declares {} clauses, found {}",
                num_clauses,
                clauses.len()
            );
        }
    }

    Ok(DimacsCnf {
        formula: Formula::new(clauses),
        declared_vars: header.map(|h| h.0),
        declared_clauses: header.map(|h| h.1),
    })
}

fn parse_header(rest: &str) -> Result<(u32, usize)> {
    let mut parts = rest.split_whitespace();
    match parts.next() {
        Some("cnf") => {}
        Some(other) => bail!("unsupported format '{}'", other),
        None => bail!("missing format"),
    }
    let vars = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("missing variable count"))?
        .parse::<u32>()
        .context("bad variable count")?;
    let clauses = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("missing clause count"))?
        .parse::<usize>()
        .context("bad clause count")?;
    if parts.next().is_some() {
        bail!("trailing tokens");
    }
    Ok((vars, clauses))
}

pub fn to_dimacs(formula: &Formula<u32>) -> String {
    let num_vars = formula
        .clauses()
        .iter()
        .flatten()
        .map(|l| l.var)
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    out.push_str(&format!("p cnf {} {}\n", num_vars, formula.len()));
    for clause in formula.clauses() {
        for &lit in clause {
            out.push_str(&format!("{} ", lit_to_dimacs_int(lit)));
        }
        out.push_str("0\n");
    }
    out
}

/// Renders a model as a `v ... 0` line, variables in ascending order.
pub fn model_to_dimacs(model: &Assignment<u32>) -> String {
    let mut vars = model.iter().map(|(&v, &b)| (v, b)).collect::<Vec<_>>();
    vars.sort_unstable_by_key(|&(v, _)| v);
    let mut out = String::from("v");
    for (var, value) in vars {
        let _ = write!(out, " {}", lit_to_dimacs_int(Lit::new(var, value)));
    }
    out.push_str(" 0");
    out
}

fn lit_to_dimacs_int(lit: Lit<u32>) -> i64 {
    let v = lit.var as i64;
    if lit.sign { v } else { -v }
}
