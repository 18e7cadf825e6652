use anyhow::{Result, bail};
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cnf::cnf::{Assignment, Formula, Lit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenOptions {
    pub vars: u32,
    pub clauses: usize,
    pub width: usize,
    pub seed: u64,
    /// Append `x1` and `¬x1` so the result is unsatisfiable.
    pub make_unsat: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            vars: 20,
            clauses: 80,
            width: 3,
            seed: 1,
            make_unsat: false,
        }
    }
}

/// Random k-CNF over `1..=vars` with a hidden witness. Each clause draws
/// distinct variables and random signs, then has one literal flipped to
/// agree with the witness if none did.
pub fn generate_planted_ksat(opts: &GenOptions) -> Result<(Formula<u32>, Assignment<u32>)> {
    if opts.vars == 0 {
        bail!("vars must be >= 1");
    }
    if opts.width == 0 || opts.width > opts.vars as usize {
        bail!(
            "clause width must be in 1..={}, got {}",
            opts.vars,
            opts.width
        );
    }

    let mut rng = ChaCha8Rng::seed_from_u64(opts.seed);
    let witness = (1..=opts.vars)
        .map(|v| (v, rng.random::<bool>()))
        .collect::<Assignment<u32>>();

    let mut clauses = Vec::with_capacity(opts.clauses + 2);
    for _ in 0..opts.clauses {
        let picked = sample(&mut rng, opts.vars as usize, opts.width);
        let mut clause = picked
            .iter()
            .map(|i| Lit::new(i as u32 + 1, rng.random::<bool>()))
            .collect::<Vec<_>>();
        let satisfied = clause.iter().any(|l| witness.get(&l.var) == Some(&l.sign));
        if !satisfied {
            let idx = rng.random_range(0..clause.len());
            clause[idx] = clause[idx].neg();
        }
        clauses.push(clause);
    }

    if opts.make_unsat {
        clauses.push(vec![Lit::new(1, true)]);
        clauses.push(vec![Lit::new(1, false)]);
    }
    Ok((Formula::new(clauses), witness))
}
