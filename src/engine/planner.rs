//! The routing facade.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use super::request::{AlgorithmConfig, RunReport, RunRequest};
use crate::aco::AcoRunner;
use crate::compare::{aggregate, ComparisonTable};
use crate::cost::{ChargePolicy, CostModel, CostWeights, RouteOutcome, VehicleProfile};
use crate::csp::CspSolver;
use crate::error::Result;
use crate::ga::GaRunner;
use crate::graph::{Graph, SegmentRecord, StationRecord};
use crate::plan::SearchContext;
use crate::rl::RoutingAgent;
use crate::sa::SaRunner;

/// Owns a validated network and cost model and runs routing requests
/// against it.
///
/// Runs only read the model, so one planner serves any number of
/// concurrent requests.
///
/// # Examples
///
/// ```
/// use u_ecoroute::cost::{ChargePolicy, CostWeights, VehicleProfile};
/// use u_ecoroute::csp::CspConfig;
/// use u_ecoroute::engine::{Planner, RunRequest};
/// use u_ecoroute::graph::{SegmentRecord, StationRecord};
///
/// let stations = [
///     StationRecord::waypoint("A", 0.0, 0.0),
///     StationRecord::charger("B", 0.0, 0.5, 50.0, 0.3),
///     StationRecord::waypoint("C", 0.0, 1.0),
/// ];
/// let segments = [
///     SegmentRecord::new("A", "B", 50.0).with_travel_time(40.0),
///     SegmentRecord::new("B", "C", 50.0).with_travel_time(40.0),
/// ];
/// let planner = Planner::new(
///     &stations,
///     &segments,
///     VehicleProfile::new(60.0, 1.0),
///     CostWeights::balanced(),
///     ChargePolicy::full(),
/// )
/// .unwrap();
///
/// let report = planner.run(&RunRequest::new("A", "C", CspConfig::default())).unwrap();
/// let route = report.outcome.route().unwrap();
/// assert_eq!(route.station_ids(), vec!["A", "B", "C"]);
/// assert_eq!(route.charge_stop_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Planner {
    model: CostModel,
    parallel: bool,
}

impl Planner {
    /// Builds the graph and cost model from raw records.
    ///
    /// # Errors
    ///
    /// `InvalidGraph` for malformed records, `InvalidConfiguration` for an
    /// invalid profile, weights or charge policy.
    pub fn new(
        stations: &[StationRecord],
        segments: &[SegmentRecord],
        profile: VehicleProfile,
        weights: CostWeights,
        policy: ChargePolicy,
    ) -> Result<Self> {
        let graph = Arc::new(Graph::build(stations, segments)?);
        let model = CostModel::new(graph, profile, weights, policy)?;
        Ok(Self::from_model(model))
    }

    pub fn from_model(model: CostModel) -> Self {
        Self {
            model,
            parallel: true,
        }
    }

    /// Runs the requests of [`compare`](Self::compare) in parallel
    /// (requires the `parallel` feature).
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn model(&self) -> &CostModel {
        &self.model
    }

    pub fn graph(&self) -> &Graph {
        self.model.graph()
    }

    pub fn run(&self, request: &RunRequest) -> Result<RunReport> {
        self.run_with_cancel(request, None)
    }

    /// Resolves the endpoints, seeds the run's RNG from `request.seed`
    /// and dispatches to the configured strategy.
    ///
    /// # Errors
    ///
    /// `UnknownStation` for an unknown endpoint id, `InvalidConfiguration`
    /// for invalid strategy parameters. A run that finds no route is an
    /// `Ok` report with a `NoSolution` outcome.
    pub fn run_with_cancel(
        &self,
        request: &RunRequest,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<RunReport> {
        let graph = self.model.graph();
        let start = graph.require(&request.start)?;
        let goal = graph.require(&request.goal)?;
        request.algorithm.validate()?;

        let ctx = SearchContext::new(&self.model, start, goal);
        let mut rng = StdRng::seed_from_u64(request.seed);
        let started = Instant::now();

        let (outcome, iterations) = match &request.algorithm {
            AlgorithmConfig::Csp(config) => {
                let result = CspSolver::solve_with_cancel(&ctx, config, cancel)?;
                (result.outcome, result.expansions)
            }
            AlgorithmConfig::Ga(config) => {
                let result = GaRunner::run_with_cancel(&ctx, config, &mut rng, cancel)?;
                (result.outcome, result.generations)
            }
            AlgorithmConfig::Aco(config) => {
                let result = AcoRunner::run_with_cancel(&ctx, config, &mut rng, cancel)?;
                (result.outcome, result.iterations)
            }
            AlgorithmConfig::Sa(config) => {
                let result = SaRunner::run_with_cancel(&ctx, config, &mut rng, cancel)?;
                (result.outcome, result.iterations)
            }
            AlgorithmConfig::Rl(config) => {
                let mut agent = RoutingAgent::new(&ctx, config.clone())?;
                let stats = agent.train_with_cancel(&mut rng, cancel);
                (agent.derive_route(), stats.episodes)
            }
        };

        let elapsed = started.elapsed();
        let algorithm = request.algorithm.algorithm();
        match &outcome {
            RouteOutcome::Found(route) => info!(
                %algorithm,
                start = %request.start,
                goal = %request.goal,
                cost = route.cost,
                charge_stops = route.charge_stop_count(),
                iterations,
                elapsed_ms = elapsed.as_millis() as u64,
                "route found"
            ),
            RouteOutcome::NoSolution(reason) => info!(
                %algorithm,
                start = %request.start,
                goal = %request.goal,
                %reason,
                iterations,
                elapsed_ms = elapsed.as_millis() as u64,
                "no route"
            ),
        }

        Ok(RunReport {
            algorithm,
            outcome,
            iterations,
            elapsed,
        })
    }

    /// Runs every request and aggregates the reports in request order.
    ///
    /// Fails with the first error in request order.
    pub fn compare(&self, requests: &[RunRequest]) -> Result<ComparisonTable> {
        let reports = self.run_all(requests)?;
        Ok(aggregate(&reports))
    }

    /// Runs every request, in parallel when enabled.
    pub fn run_all(&self, requests: &[RunRequest]) -> Result<Vec<RunReport>> {
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                use rayon::prelude::*;
                let reports: Vec<Result<RunReport>> =
                    requests.par_iter().map(|r| self.run(r)).collect();
                return reports.into_iter().collect();
            }
        }
        #[cfg(not(feature = "parallel"))]
        let _ = self.parallel;

        requests.iter().map(|r| self.run(r)).collect()
    }
}
