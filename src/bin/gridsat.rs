use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use gridsat::cnf::cnf::{Formula, Variable};
use gridsat::cnf::dimacs::{model_to_dimacs, parse_dimacs_reader, to_dimacs};
use gridsat::generate::{GenOptions, generate_planted_ksat};
use gridsat::grid::{Grid, decode_grid, encode_grid, number_cells};
use gridsat::sat::dpll::{SatResult, SolveOptions};
use gridsat::solver::dpll_backend::DpllBackend;
use gridsat::solver::varisat::VarisatBackend;
use gridsat::solver::{BackendKind, FormulaSolver, SolverStats};

#[derive(Debug, Parser)]
#[command(name = "gridsat")]
#[command(about = "Reference DPLL solver with a grid puzzle front end")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace). GRIDSAT_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Solve a DIMACS CNF file.
    Solve {
        path: String,
        #[arg(long, default_value = "dpll")]
        backend: String,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Solve a grid puzzle given as text.
    Grid {
        path: String,
        #[arg(long, default_value = "dpll")]
        backend: String,
        #[arg(long)]
        max_depth: Option<usize>,
    },
    /// Write the CNF encoding of a grid puzzle as DIMACS.
    Encode {
        path: String,
        #[arg(long)]
        emit: String,
    },
    /// Write a planted random k-SAT instance and its witness.
    GenRandom {
        #[arg(long)]
        vars: u32,
        #[arg(long)]
        clauses: usize,
        #[arg(long, default_value_t = 3)]
        width: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
        #[arg(long)]
        cnf_out: String,
        #[arg(long)]
        witness_out: Option<String>,
        #[arg(long)]
        make_unsat: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logger(cli.verbose)?;
    match cli.command {
        Cmd::Solve {
            path,
            backend,
            max_depth,
        } => solve_cmd(&path, &backend, max_depth)?,
        Cmd::Grid {
            path,
            backend,
            max_depth,
        } => grid_cmd(&path, &backend, max_depth)?,
        Cmd::Encode { path, emit } => encode_cmd(&path, &emit)?,
        Cmd::GenRandom {
            vars,
            clauses,
            width,
            seed,
            cnf_out,
            witness_out,
            make_unsat,
        } => gen_cmd(
            GenOptions {
                vars,
                clauses,
                width,
                seed,
                make_unsat,
            },
            &cnf_out,
            witness_out.as_deref(),
        )?,
    }
    Ok(())
}

fn setup_logger(verbose: u8) -> Result<()> {
    let level = match std::env::var("GRIDSAT_LOG") {
        Ok(s) => s
            .parse::<log::LevelFilter>()
            .with_context(|| format!("bad GRIDSAT_LOG value '{}'", s))?,
        Err(_) => match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        },
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn run_backend<V: Variable>(
    backend: &str,
    max_depth: Option<usize>,
    formula: &Formula<V>,
) -> Result<(SatResult<V>, SolverStats, &'static str)> {
    match BackendKind::parse(backend)? {
        BackendKind::Dpll => {
            let mut solver = DpllBackend::with_options(SolveOptions { max_depth });
            let result = solver.solve(formula)?;
            Ok((result, solver.stats(), solver.backend_name()))
        }
        BackendKind::Varisat => {
            if max_depth.is_some() {
                log::warn!("--max-depth is ignored by the varisat backend");
            }
            let mut solver = VarisatBackend::new();
            let result = solver.solve(formula)?;
            Ok((result, solver.stats(), solver.backend_name()))
        }
    }
}

fn solve_cmd(path: &str, backend: &str, max_depth: Option<usize>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
    let cnf = parse_dimacs_reader(BufReader::new(file))?;
    let start = Instant::now();
    let (result, stats, name) = run_backend(backend, max_depth, &cnf.formula)?;
    let elapsed = start.elapsed();

    println!(
        "c backend={} clauses={} decisions={} conflicts={} time={:?}",
        name,
        cnf.formula.len(),
        stats.decisions,
        stats.conflicts,
        elapsed
    );
    match result {
        SatResult::Sat(model) => {
            if !cnf.formula.is_satisfied_by(&model) {
                bail!("internal error: model does not satisfy the formula");
            }
            println!("s SATISFIABLE");
            println!("{}", model_to_dimacs(&model));
        }
        SatResult::Unsat => println!("s UNSATISFIABLE"),
    }
    Ok(())
}

fn grid_cmd(path: &str, backend: &str, max_depth: Option<usize>) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
    let grid = Grid::parse_reader(BufReader::new(file))?;
    let formula = encode_grid(&grid);
    let (result, stats, name) = run_backend(backend, max_depth, &formula)?;
    println!(
        "size={} open={} clauses={} backend={} decisions={}",
        grid.size(),
        grid.num_open(),
        formula.len(),
        name,
        stats.decisions
    );
    match decode_grid(&result, grid.size())? {
        Some(solved) => print!("{}", solved),
        None => println!("no solution"),
    }
    Ok(())
}

fn encode_cmd(path: &str, emit: &str) -> Result<()> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path))?;
    let grid = Grid::parse_reader(BufReader::new(file))?;
    let n = grid.size();
    let formula = number_cells(&encode_grid(&grid), n)?;
    std::fs::write(emit, to_dimacs(&formula))?;
    println!(
        "vars={} clauses={} open={}",
        n * n * n,
        formula.len(),
        grid.num_open()
    );
    Ok(())
}

fn gen_cmd(opts: GenOptions, cnf_out: &str, witness_out: Option<&str>) -> Result<()> {
    let (formula, witness) = generate_planted_ksat(&opts)?;
    std::fs::write(cnf_out, to_dimacs(&formula))?;
    if let Some(path) = witness_out {
        std::fs::write(path, format!("{}\n", model_to_dimacs(&witness)))?;
    }
    println!(
        "GEN: wrote {} | vars={} clauses={} unsat={}",
        cnf_out,
        opts.vars,
        formula.len(),
        opts.make_unsat
    );
    Ok(())
}
