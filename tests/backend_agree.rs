use proptest::prelude::*;

use gridsat::cnf::cnf::{Formula, Lit, collect_variables};
use gridsat::generate::{GenOptions, generate_planted_ksat};
use gridsat::sat::dpll::{SatResult, SolveOptions, solve, solve_with};
use gridsat::solver::dpll_backend::DpllBackend;
use gridsat::solver::varisat::VarisatBackend;
use gridsat::solver::{BackendKind, FormulaSolver};

fn formula_strategy() -> impl Strategy<Value = Formula<u32>> {
    let lit = (1u32..=6, any::<bool>()).prop_map(|(v, s)| Lit::new(v, s));
    let clause = prop::collection::vec(lit, 1..=3);
    prop::collection::vec(clause, 0..=18).prop_map(Formula::new)
}

proptest! {
    #[test]
    fn dpll_agrees_with_varisat(formula in formula_strategy()) {
        let ours = solve(&formula);
        let theirs = VarisatBackend::new().solve(&formula).expect("varisat");
        prop_assert_eq!(ours.is_sat(), theirs.is_sat());
        if let SatResult::Sat(model) = &ours {
            prop_assert!(formula.is_satisfied_by(model));
            prop_assert_eq!(model.len(), collect_variables(&formula).len());
        }
        if let SatResult::Sat(model) = &theirs {
            prop_assert!(formula.is_satisfied_by(model));
        }
    }

    #[test]
    fn planted_instances_are_sat(seed in 0u64..500) {
        let opts = GenOptions { vars: 12, clauses: 50, width: 3, seed, make_unsat: false };
        let (formula, witness) = generate_planted_ksat(&opts).expect("gen");
        prop_assert!(formula.is_satisfied_by(&witness));
        let model = solve(&formula).into_model();
        prop_assert!(model.is_some());
    }
}

#[test]
fn planted_unsat_variant_is_unsat() {
    let opts = GenOptions {
        make_unsat: true,
        ..GenOptions::default()
    };
    let (formula, _) = generate_planted_ksat(&opts).expect("gen");
    assert_eq!(solve(&formula), SatResult::Unsat);
    assert!(!VarisatBackend::new().solve(&formula).expect("varisat").is_sat());
}

#[test]
fn backends_count_calls() {
    let formula = Formula::new(vec![vec![Lit::new(1u32, true), Lit::new(2, true)]]);
    let mut dpll = DpllBackend::new();
    let mut sat = VarisatBackend::new();
    for _ in 0..3 {
        assert!(dpll.solve(&formula).expect("dpll").is_sat());
        assert!(sat.solve(&formula).expect("varisat").is_sat());
    }
    assert_eq!(dpll.stats().solve_calls, 3);
    assert_eq!(sat.stats().solve_calls, 3);
    assert_eq!(dpll.backend_name(), "dpll");
    assert_eq!(sat.backend_name(), "varisat");
}

#[test]
fn dpll_backend_honours_depth_limit() {
    let clauses = (1..=10u32)
        .map(|v| vec![Lit::new(v, true), Lit::new(v + 1, true)])
        .collect::<Vec<_>>();
    let formula = Formula::new(clauses);
    let mut limited = DpllBackend::with_options(SolveOptions { max_depth: Some(0) });
    assert!(limited.solve(&formula).is_err());
    assert!(solve_with(&formula, &SolveOptions::default()).is_ok());
}

#[test]
fn backend_names_parse() {
    assert_eq!(BackendKind::parse("dpll").expect("known"), BackendKind::Dpll);
    assert_eq!(BackendKind::parse("varisat").expect("known"), BackendKind::Varisat);
    assert!(BackendKind::parse("minisat").is_err());
}
