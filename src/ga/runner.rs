//! GA evolutionary loop execution.
//!
//! [`GaRunner`] orchestrates the complete evolutionary process:
//! seeding → evaluation → selection → crossover → mutation → repeat.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use super::config::GaConfig;
use super::operators::{common_station_crossover, mutate};
use super::types::RouteIndividual;
use crate::cost::{CostModel, NoSolutionReason, Route, RouteOutcome};
use crate::error::Result;
use crate::plan::{seed_walk, RunClock, SearchContext};

/// Result of a GA run.
#[derive(Debug, Clone)]
pub struct GaResult {
    /// The best feasible route seen in any generation.
    pub outcome: RouteOutcome,

    /// Lowest fitness reached; the route cost when a feasible route exists.
    pub best_fitness: f64,

    /// Total number of generations executed.
    pub generations: usize,

    /// Whether the run was terminated due to stagnation.
    pub stagnated: bool,

    /// Whether the run was cancelled externally.
    pub cancelled: bool,

    /// Best fitness at the end of each generation, initial population first.
    pub fitness_history: Vec<f64>,
}

impl GaResult {
    fn unsolved(outcome: RouteOutcome) -> Self {
        Self {
            outcome,
            best_fitness: f64::INFINITY,
            generations: 0,
            stagnated: false,
            cancelled: false,
            fitness_history: Vec::new(),
        }
    }
}

/// Executes the GA evolutionary loop over waypoint encodings.
///
/// # Usage
///
/// ```ignore
/// let ctx = SearchContext::new(&model, start, goal);
/// let mut rng = StdRng::seed_from_u64(42);
/// let result = GaRunner::run(&ctx, &GaConfig::fast(), &mut rng)?;
/// ```
pub struct GaRunner;

impl GaRunner {
    pub fn run<R: Rng>(
        ctx: &SearchContext<'_>,
        config: &GaConfig,
        rng: &mut R,
    ) -> Result<GaResult> {
        Self::run_with_cancel(ctx, config, rng, None)
    }

    /// Runs the GA with an optional cancellation token.
    ///
    /// If `cancel` is set to `true`, the GA stops before the next generation
    /// and returns the best route found so far.
    pub fn run_with_cancel<R: Rng>(
        ctx: &SearchContext<'_>,
        config: &GaConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<GaResult> {
        config.validate()?;

        if let Some(outcome) = ctx.precheck() {
            return Ok(GaResult::unsolved(outcome));
        }

        let clock = RunClock::new(config.time_limit_ms, cancel);
        let model = ctx.model();

        // 1. Seed the population with guided walks
        let mut population = match seed_population(ctx, config, rng) {
            Some(population) => population,
            None => {
                warn!(
                    attempts = config.init_attempts * config.population_size,
                    "ga could not seed any route"
                );
                return Ok(GaResult::unsolved(RouteOutcome::NoSolution(
                    NoSolutionReason::BudgetExhausted,
                )));
            }
        };
        evaluate_all(model, &mut population, config.parallel);

        // 2. Track best
        let mut best_route: Option<Route> = None;
        update_best(model, &population, &mut best_route);
        let mut best_fitness = min_fitness(&population);
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(best_fitness);

        let elite_count = (config.population_size as f64 * config.elite_ratio) as usize;
        let mut stagnation_counter = 0usize;
        let mut generations = 0usize;
        let mut stagnated = false;
        let mut cancelled = false;

        // 3. Evolutionary loop
        for gen in 0..config.max_generations {
            if clock.cancelled() {
                cancelled = true;
                break;
            }
            if clock.timed_out() {
                break;
            }

            population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
            let mut next_gen: Vec<RouteIndividual> = population[..elite_count].to_vec();

            while next_gen.len() < config.population_size {
                let p1 = &population[config.selection.select(&population, rng)];
                let p2 = &population[config.selection.select(&population, rng)];

                let children = if rng.random_bool(config.crossover_rate) {
                    match common_station_crossover(ctx, &p1.waypoints, &p2.waypoints, rng) {
                        Some((c1, c2)) => vec![c1, c2],
                        None => vec![p1.waypoints.clone()],
                    }
                } else {
                    vec![p1.waypoints.clone()]
                };

                for child in children {
                    if next_gen.len() >= config.population_size {
                        break;
                    }
                    let child = if rng.random_bool(config.mutation_rate) {
                        mutate(ctx, &child, config.rcl_alpha, rng)
                    } else {
                        child
                    };
                    next_gen.push(RouteIndividual::new(child));
                }
            }

            // Elites keep their fitness; only offspring are scored.
            evaluate_all(model, &mut next_gen[elite_count..], config.parallel);
            population = next_gen;
            generations = gen + 1;

            update_best(model, &population, &mut best_route);
            let gen_best = min_fitness(&population);
            if gen_best < best_fitness {
                let improvement = if best_fitness.is_finite() {
                    (best_fitness - gen_best) / best_fitness.abs().max(f64::EPSILON)
                } else {
                    f64::INFINITY
                };
                best_fitness = gen_best;
                if improvement >= config.convergence_threshold {
                    stagnation_counter = 0;
                } else {
                    stagnation_counter += 1;
                }
            } else {
                stagnation_counter += 1;
            }
            fitness_history.push(best_fitness);

            debug!(
                generation = generations,
                best_fitness,
                feasible = population.iter().filter(|ind| ind.feasible).count(),
                "ga generation"
            );

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        Ok(GaResult {
            outcome: RouteOutcome::from_best(best_route, NoSolutionReason::BudgetExhausted),
            best_fitness,
            generations,
            stagnated,
            cancelled,
            fitness_history,
        })
    }
}

/// Builds the initial population from guided walks.
///
/// Slots whose walks all dead-end are filled with mutated copies of the
/// routes that were found. Returns `None` when no walk reached the goal.
fn seed_population<R: Rng>(
    ctx: &SearchContext<'_>,
    config: &GaConfig,
    rng: &mut R,
) -> Option<Vec<RouteIndividual>> {
    let mut seeds: Vec<RouteIndividual> = (0..config.population_size)
        .filter_map(|_| seed_walk(ctx, config.rcl_alpha, config.init_attempts, rng))
        .map(RouteIndividual::new)
        .collect();
    if seeds.is_empty() {
        return None;
    }

    let found = seeds.len();
    while seeds.len() < config.population_size {
        let source = &seeds[rng.random_range(0..found)];
        let copy = mutate(ctx, &source.waypoints, config.rcl_alpha, rng);
        seeds.push(RouteIndividual::new(copy));
    }
    Some(seeds)
}

fn evaluate_all(model: &CostModel, population: &mut [RouteIndividual], parallel: bool) {
    #[cfg(feature = "parallel")]
    {
        if parallel {
            use rayon::prelude::*;
            population.par_iter_mut().for_each(|ind| {
                ind.evaluate(model);
            });
            return;
        }
    }
    #[cfg(not(feature = "parallel"))]
    let _ = parallel;

    for ind in population.iter_mut() {
        ind.evaluate(model);
    }
}

fn min_fitness(population: &[RouteIndividual]) -> f64 {
    population
        .iter()
        .map(|ind| ind.fitness)
        .fold(f64::INFINITY, f64::min)
}

/// Replaces `best` with the population's cheapest feasible route if it is
/// cheaper.
fn update_best(model: &CostModel, population: &[RouteIndividual], best: &mut Option<Route>) {
    let Some(candidate) = population
        .iter()
        .filter(|ind| ind.feasible)
        .min_by(|a, b| a.fitness.total_cmp(&b.fitness))
    else {
        return;
    };
    if best.as_ref().map_or(true, |route| candidate.fitness < route.cost) {
        if let Some(route) = candidate.route(model) {
            *best = Some(route);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
