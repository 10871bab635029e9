//! SA execution loop.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use super::config::{CoolingSchedule, SaConfig};
use super::types::RouteMove;
use crate::cost::{NoSolutionReason, Route, RouteOutcome};
use crate::error::Result;
use crate::plan::{seed_walk, RunClock, SearchContext};

/// Result of a Simulated Annealing run.
#[derive(Debug, Clone)]
pub struct SaResult {
    /// The best feasible route seen during the run.
    pub outcome: RouteOutcome,

    /// Penalized cost of the best encoding seen.
    pub best_cost: f64,

    /// Total number of moves tried.
    pub iterations: usize,

    /// Final temperature when the algorithm stopped.
    pub final_temperature: f64,

    /// Number of accepted moves (including improvements).
    pub accepted_moves: usize,

    /// Number of improving moves.
    pub improving_moves: usize,

    /// Whether cancelled externally.
    pub cancelled: bool,

    /// Best cost sampled once per temperature level.
    pub cost_history: Vec<f64>,
}

impl SaResult {
    fn unsolved(outcome: RouteOutcome) -> Self {
        Self {
            outcome,
            best_cost: f64::INFINITY,
            iterations: 0,
            final_temperature: 0.0,
            accepted_moves: 0,
            improving_moves: 0,
            cancelled: false,
            cost_history: Vec::new(),
        }
    }
}

/// Anneals a single route with swap, charge-toggle and detour moves.
pub struct SaRunner;

impl SaRunner {
    pub fn run<R: Rng>(
        ctx: &SearchContext<'_>,
        config: &SaConfig,
        rng: &mut R,
    ) -> Result<SaResult> {
        Self::run_with_cancel(ctx, config, rng, None)
    }

    /// Runs SA with an optional cancellation token, checked once per
    /// temperature level.
    pub fn run_with_cancel<R: Rng>(
        ctx: &SearchContext<'_>,
        config: &SaConfig,
        rng: &mut R,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SaResult> {
        config.validate()?;

        if let Some(outcome) = ctx.precheck() {
            return Ok(SaResult::unsolved(outcome));
        }

        let clock = RunClock::new(config.time_limit_ms, cancel);
        let model = ctx.model();

        let Some(mut current) = seed_walk(ctx, config.rcl_alpha, config.init_attempts, rng) else {
            warn!(attempts = config.init_attempts, "sa could not seed an initial route");
            return Ok(SaResult::unsolved(RouteOutcome::NoSolution(
                NoSolutionReason::BudgetExhausted,
            )));
        };
        let evaluation = model.evaluate(&current);
        let mut current_cost = evaluation.fitness();
        let mut best_cost = current_cost;
        let mut best_route: Option<Route> = evaluation.into_route();

        let mut temperature = config.initial_temperature;
        let mut total_iterations = 0usize;
        let mut accepted_moves = 0usize;
        let mut improving_moves = 0usize;
        let mut cancelled = false;

        let linear_max_steps = compute_linear_steps(config);
        let mut cost_history = vec![best_cost];
        let mut step = 0usize;

        while temperature > config.min_temperature {
            if clock.cancelled() {
                cancelled = true;
                break;
            }
            if clock.timed_out() {
                break;
            }

            let inner_iters = match config.cooling {
                CoolingSchedule::LundyMees { .. } => 1,
                _ => config.iterations_per_temperature,
            };

            for _ in 0..inner_iters {
                if config.max_iterations > 0 && total_iterations >= config.max_iterations {
                    break;
                }
                total_iterations += 1;

                let Some((_, neighbor)) =
                    RouteMove::propose(ctx, &current, config.rcl_alpha, rng)
                else {
                    continue;
                };
                let evaluation = model.evaluate(&neighbor);
                let neighbor_cost = evaluation.fitness();
                let delta = neighbor_cost - current_cost;

                // Metropolis acceptance criterion
                let accept = if delta < 0.0 {
                    improving_moves += 1;
                    true
                } else {
                    rng.random_range(0.0..1.0) < (-delta / temperature).exp()
                };
                if !accept {
                    continue;
                }

                accepted_moves += 1;
                current = neighbor;
                current_cost = neighbor_cost;
                if current_cost < best_cost {
                    best_cost = current_cost;
                }
                if let Some(route) = evaluation.into_route() {
                    if best_route.as_ref().map_or(true, |best| route.cost < best.cost) {
                        best_route = Some(route);
                    }
                }
            }

            cost_history.push(best_cost);
            debug!(step, temperature, best_cost, current_cost, "sa temperature step");

            if config.max_iterations > 0 && total_iterations >= config.max_iterations {
                break;
            }

            temperature = cool(temperature, config, step, linear_max_steps);
            step += 1;
        }

        Ok(SaResult {
            outcome: RouteOutcome::from_best(best_route, NoSolutionReason::BudgetExhausted),
            best_cost,
            iterations: total_iterations,
            final_temperature: temperature,
            accepted_moves,
            improving_moves,
            cancelled,
            cost_history,
        })
    }
}

/// Next temperature under the configured schedule.
fn cool(temperature: f64, config: &SaConfig, step: usize, linear_max_steps: usize) -> f64 {
    match config.cooling {
        CoolingSchedule::Geometric { alpha } => temperature * alpha,

        CoolingSchedule::Linear => {
            let t = config.initial_temperature
                - (step + 1) as f64 * (config.initial_temperature - config.min_temperature)
                    / linear_max_steps as f64;
            t.max(config.min_temperature)
        }

        CoolingSchedule::LundyMees { beta } => temperature / (1.0 + beta * temperature),
    }
}

/// Temperature levels for linear cooling.
fn compute_linear_steps(config: &SaConfig) -> usize {
    if config.max_iterations > 0 {
        (config.max_iterations / config.iterations_per_temperature).max(1)
    } else {
        1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint::{Charge, Pass};
    use crate::csp::{CspConfig, CspSolver};
    use crate::test_utils::{fork_graph, grid_model, line_graph, model_for, rng};

    #[test]
    fn test_line_route() {
        let model = model_for(line_graph(true), 60.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let config = SaConfig::default().with_max_iterations(200);
        let result = SaRunner::run(&ctx, &config, &mut rng(42)).unwrap();
        assert_eq!(
            result.outcome.route().map(Route::waypoints),
            Some(vec![Pass(0), Charge(1), Pass(2)])
        );
    }

    #[test]
    fn test_seeds_through_poorly_scored_branch() {
        // The greedy first hop leads into a dead end; only A-Y-X-W-G works.
        let model = model_for(fork_graph(), 20.0);
        let ctx = SearchContext::new(&model, 0, 4);
        let result = SaRunner::run(&ctx, &SaConfig::default(), &mut rng(42)).unwrap();
        let route = result.outcome.route().expect("slow branch is feasible");
        assert_eq!(route.station_ids(), vec!["A", "Y", "X", "W", "G"]);
    }

    #[test]
    fn test_no_solution_without_charger() {
        let model = model_for(line_graph(false), 40.0);
        let ctx = SearchContext::new(&model, 0, 2);
        let result = SaRunner::run(&ctx, &SaConfig::default(), &mut rng(42)).unwrap();
        assert_eq!(
            result.outcome.reason(),
            Some(NoSolutionReason::EnergyInfeasible)
        );
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_all_schedules_find_grid_route() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let exact = CspSolver::solve(&ctx, &CspConfig::default())
            .unwrap()
            .outcome
            .cost()
            .unwrap();

        let max_iter = 3_000;
        let (t0, t_min) = (1.0, 1e-3);
        let beta = (t0 - t_min) / (max_iter as f64 * t0 * t_min);
        for cooling in [
            CoolingSchedule::Geometric { alpha: 0.95 },
            CoolingSchedule::Linear,
            CoolingSchedule::LundyMees { beta },
        ] {
            let config = SaConfig::default()
                .with_cooling(cooling)
                .with_max_iterations(max_iter);
            let result = SaRunner::run(&ctx, &config, &mut rng(8)).unwrap();
            let route = result.outcome.route().expect("sa finds a grid route");
            assert!(route.cost + 1e-9 >= exact, "{cooling:?} beat the exact solver");
            assert!(route.min_soc_kwh() >= -1e-9);
            assert!(result.iterations <= max_iter);
        }
    }

    #[test]
    fn test_cost_history_non_increasing() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let result = SaRunner::run(&ctx, &SaConfig::default(), &mut rng(4)).unwrap();
        for window in result.cost_history.windows(2) {
            assert!(
                window[1] <= window[0] + 1e-10,
                "best cost history should be non-increasing: {} > {}",
                window[1],
                window[0]
            );
        }
    }

    #[test]
    fn test_metropolis_accepts_uphill_when_hot() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let config = SaConfig::default()
            .with_initial_temperature(1e3)
            .with_min_temperature(5e2)
            .with_iterations_per_temperature(200);
        let result = SaRunner::run(&ctx, &config, &mut rng(2)).unwrap();
        assert!(
            result.accepted_moves > result.improving_moves,
            "hot annealing should accept uphill moves"
        );
    }

    #[test]
    fn test_cancellation() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let cancel = Arc::new(AtomicBool::new(true));
        let result =
            SaRunner::run_with_cancel(&ctx, &SaConfig::default(), &mut rng(3), Some(cancel))
                .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_same_seed_same_route() {
        let model = grid_model(5, 5, 45.0);
        let goal = model.graph().station_count() - 1;
        let ctx = SearchContext::new(&model, 0, goal);
        let config = SaConfig::default().with_max_iterations(1_000);
        let a = SaRunner::run(&ctx, &config, &mut rng(17)).unwrap();
        let b = SaRunner::run(&ctx, &config, &mut rng(17)).unwrap();
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.cost_history, b.cost_history);
    }
}
