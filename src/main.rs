//! Land-use operators CLI - Sample a population and run one offspring pass.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use landuse_evo::{
    compute::{Grid, SpatialOperators},
    schema::{LandUse, OptimizationConfig},
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && args[1] == "--example" {
        print_example_config();
        return;
    }

    if args.len() < 3 {
        eprintln!("Usage: {} <config.json> <base_grid.json> [population]", args[0]);
        eprintln!();
        eprintln!("Sample a population around a base land-use grid, apply one round of");
        eprintln!("spatial crossover and mutation, and report per-individual objectives.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json     Path to operator configuration file");
        eprintln!("  base_grid.json  Path to base grid ({{\"rows\", \"cols\", \"data\"}})");
        eprintln!("  population      Number of individuals (default: 10)");
        eprintln!();
        eprintln!("Example files are printed with the --example flag.");
        std::process::exit(1);
    }

    let config_path = PathBuf::from(&args[1]);
    let grid_path = PathBuf::from(&args[2]);
    let size: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(10);

    let config = OptimizationConfig::from_json_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Error loading config: {}", e);
        std::process::exit(1);
    });

    let grid_str = fs::read_to_string(&grid_path).unwrap_or_else(|e| {
        eprintln!("Error reading grid file: {}", e);
        std::process::exit(1);
    });
    let base: Grid = serde_json::from_str(&grid_str).unwrap_or_else(|e| {
        eprintln!("Error parsing grid: {}", e);
        std::process::exit(1);
    });

    let operators = SpatialOperators::new(config).unwrap_or_else(|e| {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    });
    let mut rng = operators.rng();
    let labeler = operators.labeler();
    let densities = operators.config().objectives.biomass.to_lookup();
    let cell_area = operators.config().objectives.cell_area;

    println!("Spatial land-use operators");
    println!("==========================");
    println!("Grid: {}x{}", base.rows(), base.cols());
    println!("Base patches: {}", labeler.patch_count(&base));
    println!("Population: {}", size);
    println!();

    let start = Instant::now();
    let population = operators.sample_population(&base, size, &mut rng);
    let matings: Vec<(&Grid, &Grid)> = population
        .chunks_exact(2)
        .map(|pair| (&pair[0], &pair[1]))
        .collect();
    let children = operators.offspring(&matings, &mut rng).unwrap_or_else(|e| {
        eprintln!("Error producing offspring: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    println!("Offspring:");
    for (i, child) in children.iter().enumerate() {
        let biomass = landuse_evo::compute::total_biomass(child, &densities, cell_area);
        let sugarcane = child
            .data()
            .iter()
            .filter(|&&c| c == LandUse::Sugarcane.code())
            .count();
        println!(
            "  #{:<3} patches={:<6} biomass={:<14.1} sugarcane cells={}",
            i,
            labeler.patch_count(child),
            biomass,
            sugarcane
        );
    }
    println!();
    println!(
        "Time: {:.3}s ({} matings)",
        elapsed.as_secs_f32(),
        matings.len()
    );
}

fn print_example_config() {
    let config = OptimizationConfig::default();
    let grid = Grid::filled(4, 4, LandUse::Pasture.code());

    println!("Example configuration (config.json):");
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_default()
    );
    println!();
    println!("Example base grid (grid.json):");
    println!("{}", serde_json::to_string(&grid).unwrap_or_default());
}
