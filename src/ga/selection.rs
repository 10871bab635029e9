//! Parent selection for the route GA.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Baker (1985), "Adaptive Selection Methods for Genetic Algorithms"

use super::types::Individual;
use rand::Rng;

/// Selection strategy for choosing parents.
///
/// All strategies minimize: lower fitness wins. Infeasible routes carry a
/// penalized fitness, so every strategy leans towards feasible parents.
///
/// # Examples
///
/// ```
/// use u_ecoroute::ga::Selection;
///
/// let sel = Selection::Tournament(3);
/// assert_eq!(sel, Selection::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Selection {
    /// Best of `k` individuals drawn with replacement.
    ///
    /// Larger `k` means stronger pressure; 2 keeps diversity, 3 to 5 is
    /// typical.
    Tournament(usize),

    /// Fitness-proportionate selection on inverted fitness
    /// (`worst - f + ε`).
    Roulette,

    /// Linear ranking: the i-th best of `n` gets weight `n - i`.
    Rank,
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Tournament(3)
    }
}

impl Selection {
    /// Picks a parent index from `population`.
    ///
    /// # Panics
    /// Panics if `population` is empty.
    pub fn select<I: Individual, R: Rng>(&self, population: &[I], rng: &mut R) -> usize {
        assert!(!population.is_empty(), "cannot select from empty population");

        match self {
            Selection::Tournament(k) => tournament(population, *k, rng),
            Selection::Roulette => roulette(population, rng),
            Selection::Rank => rank(population, rng),
        }
    }
}

fn tournament<I: Individual, R: Rng>(population: &[I], k: usize, rng: &mut R) -> usize {
    let n = population.len();
    let mut winner = rng.random_range(0..n);
    for _ in 1..k.max(1) {
        let challenger = rng.random_range(0..n);
        if population[challenger].fitness() < population[winner].fitness() {
            winner = challenger;
        }
    }
    winner
}

fn roulette<I: Individual, R: Rng>(population: &[I], rng: &mut R) -> usize {
    const EPSILON: f64 = 1e-10;

    let n = population.len();
    if n == 1 {
        return 0;
    }

    // Unevaluated individuals have infinite fitness and get the minimum weight.
    let worst = population
        .iter()
        .map(Individual::fitness)
        .filter(|f| f.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let weights: Vec<f64> = population
        .iter()
        .map(|ind| {
            let f = ind.fitness();
            if f.is_finite() {
                (worst - f).max(0.0) + EPSILON
            } else {
                EPSILON
            }
        })
        .collect();

    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return rng.random_range(0..n);
    }

    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative > threshold {
            return i;
        }
    }
    n - 1
}

fn rank<I: Individual, R: Rng>(population: &[I], rng: &mut R) -> usize {
    let n = population.len();
    if n == 1 {
        return 0;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| population[a].fitness().total_cmp(&population[b].fitness()));

    let total = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.random_range(0.0..total);
    let mut cumulative = 0.0;
    for (position, &idx) in order.iter().enumerate() {
        cumulative += (n - position) as f64;
        if cumulative > threshold {
            return idx;
        }
    }
    order[n - 1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::Waypoint;
    use crate::ga::RouteIndividual;
    use crate::test_utils::rng;

    fn make_population(fitnesses: &[f64]) -> Vec<RouteIndividual> {
        fitnesses
            .iter()
            .map(|&f| RouteIndividual {
                waypoints: vec![Waypoint::Pass(0)],
                fitness: f,
                feasible: f < 1e6,
            })
            .collect()
    }

    fn counts(selection: Selection, pop: &[RouteIndividual], draws: usize) -> Vec<usize> {
        let mut r = rng(42);
        let mut counts = vec![0; pop.len()];
        for _ in 0..draws {
            counts[selection.select(pop, &mut r)] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_best() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let c = counts(Selection::Tournament(4), &pop, 10_000);
        assert!(c[2] > 6000, "expected best >60% of draws, got {c:?}");
    }

    #[test]
    fn test_tournament_size_1_is_uniform() {
        let pop = make_population(&[10.0, 5.0, 1.0, 8.0]);
        let c = counts(Selection::Tournament(1), &pop, 10_000);
        assert!(c.iter().all(|&x| x > 1500), "expected uniform, got {c:?}");
    }

    #[test]
    fn test_roulette_prefers_feasible() {
        let pop = make_population(&[2.0e6, 3.0, 1.0, 2.5e6]);
        let c = counts(Selection::Roulette, &pop, 10_000);
        assert!(c[1] + c[2] > 8500, "feasible parents should dominate: {c:?}");
        assert!(c[3] < 10, "worst gets only epsilon weight: {c:?}");
    }

    #[test]
    fn test_rank_favors_best() {
        let pop = make_population(&[100.0, 50.0, 1.0, 80.0]);
        let c = counts(Selection::Rank, &pop, 10_000);
        assert!(c[2] > c[0], "best should beat worst: {c:?}");
    }

    #[test]
    fn test_unevaluated_individuals() {
        let pop = make_population(&[f64::INFINITY, f64::INFINITY]);
        let mut r = rng(7);
        for sel in [Selection::Tournament(2), Selection::Roulette, Selection::Rank] {
            assert!(sel.select(&pop, &mut r) < 2);
        }
    }

    #[test]
    fn test_single_individual() {
        let pop = make_population(&[5.0]);
        let mut r = rng(42);
        assert_eq!(Selection::Tournament(3).select(&pop, &mut r), 0);
        assert_eq!(Selection::Roulette.select(&pop, &mut r), 0);
        assert_eq!(Selection::Rank.select(&pop, &mut r), 0);
    }

    #[test]
    #[should_panic(expected = "cannot select from empty population")]
    fn test_empty_population_panics() {
        let pop: Vec<RouteIndividual> = vec![];
        Selection::Rank.select(&pop, &mut rng(1));
    }
}
