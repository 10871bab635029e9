//! ACO iteration loop.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::config::AcoConfig;
use super::pheromone::PheromoneMatrix;
use crate::cost::{NoSolutionReason, Route, RouteOutcome};
use crate::error::Result;
use crate::plan::{extend_walk, Candidate, RunClock, SearchContext};

/// Smallest step cost used in the heuristic term.
const MIN_STEP_COST: f64 = 1e-9;

/// Result of an Ant-Colony run.
#[derive(Debug, Clone)]
pub struct AcoResult {
    /// The best feasible route any ant built.
    pub outcome: RouteOutcome,

    /// Iterations completed.
    pub iterations: usize,

    /// Ants that reached the goal, over all iterations.
    pub completed_ants: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,

    /// Best cost so far after each iteration (infinite until an ant arrives).
    pub cost_history: Vec<f64>,

    /// Trails at the end of the run.
    pub pheromone: Option<PheromoneMatrix>,
}

impl AcoResult {
    fn unsolved(outcome: RouteOutcome) -> Self {
        Self {
            outcome,
            iterations: 0,
            completed_ants: 0,
            cancelled: false,
            cost_history: Vec::new(),
            pheromone: None,
        }
    }
}

/// Pheromone-guided stochastic route construction.
///
/// Every iteration, `ant_count` ants walk from the start using the same
/// battery-safe hop filter as the other constructive optimizers. Each ant
/// owns an RNG seeded from the run RNG, so the colony builds the same
/// routes whether ants run in parallel or not.
pub struct AcoRunner;

impl AcoRunner {
    pub fn run<R: Rng>(
        ctx: &SearchContext<'_>,
        config: &AcoConfig,
        rng: &mut R,
    ) -> Result<AcoResult> {
        Self::run_with_cancel(ctx, config, rng, None)
    }

    /// Runs the colony with an optional cancellation token, checked before
    /// each iteration.
    pub fn run_with_cancel<R: Rng>(
        ctx: &SearchContext<'_>,
        config: &AcoConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<AcoResult> {
        config.validate()?;

        if let Some(outcome) = ctx.precheck() {
            return Ok(AcoResult::unsolved(outcome));
        }

        let clock = RunClock::new(config.time_limit_ms, cancel);
        let mut trails = PheromoneMatrix::new(
            ctx.graph().segment_count(),
            config.initial_pheromone,
            config.min_pheromone,
            config.max_pheromone,
        );

        let mut best: Option<Route> = None;
        let mut iterations = 0usize;
        let mut completed_ants = 0usize;
        let mut cancelled = false;
        let mut cost_history = Vec::with_capacity(config.iterations);

        for iter in 0..config.iterations {
            if clock.cancelled() {
                cancelled = true;
                break;
            }
            if clock.timed_out() {
                break;
            }

            let seeds: Vec<u64> = (0..config.ant_count).map(|_| rng.random::<u64>()).collect();
            let routes = build_colony(ctx, &trails, config, &seeds);
            completed_ants += routes.len();

            // Ties keep the earlier ant.
            let iteration_best = routes
                .into_iter()
                .reduce(|a, b| if b.cost < a.cost { b } else { a });

            trails.evaporate(config.evaporation_rate);
            if let Some(route) = iteration_best {
                trails.deposit(&route, config.deposit / route.cost.max(MIN_STEP_COST));
                if best.as_ref().map_or(true, |b| route.cost < b.cost) {
                    best = Some(route);
                }
            }
            if config.elitist_weight > 0.0 {
                if let Some(elite) = &best {
                    let amount =
                        config.elitist_weight * config.deposit / elite.cost.max(MIN_STEP_COST);
                    trails.deposit(elite, amount);
                }
            }
            trails.clamp();

            iterations = iter + 1;
            let best_cost = best.as_ref().map_or(f64::INFINITY, |r| r.cost);
            cost_history.push(best_cost);
            debug!(iteration = iter, best_cost, completed_ants, "aco iteration");
        }

        Ok(AcoResult {
            outcome: RouteOutcome::from_best(best, NoSolutionReason::BudgetExhausted),
            iterations,
            completed_ants,
            cancelled,
            cost_history,
            pheromone: Some(trails),
        })
    }
}

/// Builds one ant per seed and keeps the routes that reached the goal, in
/// seed order.
fn build_colony(
    ctx: &SearchContext<'_>,
    trails: &PheromoneMatrix,
    config: &AcoConfig,
    seeds: &[u64],
) -> Vec<Route> {
    #[cfg(feature = "parallel")]
    {
        if config.parallel {
            use rayon::prelude::*;
            return seeds
                .par_iter()
                .filter_map(|&seed| build_ant(ctx, trails, config, seed))
                .collect();
        }
    }

    seeds
        .iter()
        .filter_map(|&seed| build_ant(ctx, trails, config, seed))
        .collect()
}

/// One ant's walk; `None` when it dead-ends.
fn build_ant(
    ctx: &SearchContext<'_>,
    trails: &PheromoneMatrix,
    config: &AcoConfig,
    seed: u64,
) -> Option<Route> {
    let mut rng = StdRng::seed_from_u64(seed);
    let model = ctx.model();
    let state = model.initial_state(ctx.start());
    let arrived = extend_walk(
        ctx,
        state,
        ctx.graph().station_count(),
        &mut rng,
        |options, rng| roulette_choice(trails, config, options, rng),
        |_| false,
    )?;
    model.evaluate(arrived.waypoints()).into_route()
}

/// Picks a candidate with probability proportional to
/// `tau^alpha * (1 / step_cost)^beta`.
fn roulette_choice<R: Rng>(
    trails: &PheromoneMatrix,
    config: &AcoConfig,
    options: &[Candidate],
    rng: &mut R,
) -> Option<usize> {
    if options.is_empty() {
        return None;
    }
    let weights: Vec<f64> = options
        .iter()
        .map(|c| {
            let tau = trails.level(c.segment).powf(config.alpha);
            let eta = (1.0 / c.step_cost.max(MIN_STEP_COST)).powf(config.beta);
            tau * eta
        })
        .collect();
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return Some(rng.random_range(0..options.len()));
    }

    let mut pick = rng.random_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        if pick < *w {
            return Some(i);
        }
        pick -= w;
    }
    Some(options.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint::{Charge, Pass};
    use crate::csp::{CspConfig, CspSolver};
    use crate::test_utils::{grid_model, line_graph, model_for, rng};

    fn small() -> AcoConfig {
        AcoConfig::default()
            .with_ant_count(10)
            .with_iterations(30)
            .with_parallel(false)
    }

    #[test]
    fn test_line_route() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let result = AcoRunner::run(&ctx, &small(), &mut rng(42)).unwrap();
        let route = result.outcome.route().unwrap();
        assert_eq!(route.waypoints(), vec![Pass(0), Charge(1), Pass(2)]);
        assert_eq!(route.charge_stop_count(), 1);
        assert_eq!(result.completed_ants, 10 * 30);
    }

    #[test]
    fn test_no_solution_without_charger() {
        let model = model_for(line_graph(false), 40.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let result = AcoRunner::run(&ctx, &small(), &mut rng(42)).unwrap();
        assert_eq!(
            result.outcome.reason(),
            Some(NoSolutionReason::EnergyInfeasible)
        );
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_zero_iterations_exhausts_budget() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let config = small().with_iterations(0);
        let result = AcoRunner::run(&ctx, &config, &mut rng(1)).unwrap();
        assert_eq!(
            result.outcome.reason(),
            Some(NoSolutionReason::BudgetExhausted)
        );
        assert!(result.cost_history.is_empty());
    }

    #[test]
    fn test_grid_route_not_better_than_exact() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let exact = CspSolver::solve(&ctx, &CspConfig::default())
            .unwrap()
            .outcome
            .cost()
            .unwrap();

        let result = AcoRunner::run(&ctx, &small(), &mut rng(5)).unwrap();
        let route = result.outcome.route().expect("ants reach the goal");
        assert!(route.cost + 1e-9 >= exact);
        assert!(route.min_soc_kwh() >= -1e-9);
        for window in result.cost_history.windows(2) {
            assert!(window[1] <= window[0]);
        }
    }

    #[test]
    fn test_trails_stay_within_bounds() {
        let model = grid_model(4, 4, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let config = small().with_pheromone_bounds(1.0, 0.2, 3.0);
        let result = AcoRunner::run(&ctx, &config, &mut rng(9)).unwrap();
        let trails = result.pheromone.unwrap();
        assert!(trails.levels().iter().all(|&l| (0.2..=3.0).contains(&l)));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let seq = AcoRunner::run(&ctx, &small(), &mut rng(21)).unwrap();
        let par = AcoRunner::run(&ctx, &small().with_parallel(true), &mut rng(21)).unwrap();
        assert_eq!(seq.outcome, par.outcome);
        assert_eq!(seq.cost_history, par.cost_history);
    }

    #[test]
    fn test_cancellation() {
        let model = grid_model(4, 4, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let cancel = Arc::new(AtomicBool::new(true));
        let result =
            AcoRunner::run_with_cancel(&ctx, &small(), &mut rng(3), Some(cancel)).unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
        assert_eq!(
            result.outcome.reason(),
            Some(NoSolutionReason::BudgetExhausted)
        );
    }

    #[test]
    fn test_roulette_weights() {
        let mut trails = PheromoneMatrix::new(2, 1.0, 0.01, 100.0);
        let options = [
            Candidate { segment: 0, to: 1, needs_charge: false, step_cost: 1.0 },
            Candidate { segment: 1, to: 2, needs_charge: false, step_cost: 0.1 },
        ];
        let config = AcoConfig::default().with_alpha(1.0).with_beta(2.0);
        let mut r = rng(4);
        let cheap = (0..1000)
            .filter(|_| roulette_choice(&trails, &config, &options, &mut r) == Some(1))
            .count();
        assert!(cheap > 950, "cheap hop chosen {cheap} times");

        // A uniform trail washes out under evaporation and clamping.
        trails.evaporate(1.0);
        trails.clamp();
        let blind = AcoConfig::default().with_beta(0.0);
        let first = (0..1000)
            .filter(|_| roulette_choice(&trails, &blind, &options, &mut r) == Some(0))
            .count();
        assert!((350..650).contains(&first), "uniform pick chose 0 {first} times");
    }
}
