//! Differential evolution — seeded, derivative-free global maximizer over a box.
//!
//! Strategy is best/1/bin:
//! - population of `population_multiplier × dims`, Latin-hypercube initialized
//! - mutant = best + F·(r1 − r2), with F dithered once per generation
//! - binomial crossover at rate CR with one forced gene per trial
//! - genes leaving the unit box are re-drawn uniformly
//!
//! All random draws for a generation happen on one `StdRng` before any trial is
//! evaluated, and selection runs after evaluation in population order. Parallel
//! and sequential evaluation therefore give bit-identical results for a seed.
//!
//! Infeasible points return `f64::NEG_INFINITY` from the fitness function. The
//! convergence test only runs once every individual is feasible.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::metrics::{mean, population_std};
use crate::settings::EvolutionSettings;

/// Smallest population that leaves two distinct donors besides the target.
const MIN_POPULATION: usize = 5;

/// Result of one maximization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionOutcome {
    /// Best point found, in the caller's coordinates.
    pub best: Vec<f64>,
    pub best_fitness: f64,
    pub generations: usize,
    pub evaluations: usize,
    /// True when the population's spread fell under tolerance before the generation cap.
    pub converged: bool,
}

impl EvolutionOutcome {
    pub fn is_feasible(&self) -> bool {
        self.best_fitness.is_finite()
    }
}

#[derive(Debug, Clone)]
pub struct DifferentialEvolution {
    settings: EvolutionSettings,
    parallel: bool,
}

impl DifferentialEvolution {
    pub fn new(settings: EvolutionSettings) -> Self {
        Self {
            settings,
            parallel: true,
        }
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Maximize `fitness` over the box `bounds` (`(low, high)` per dimension).
    pub fn maximize<F>(&self, bounds: &[(f64, f64)], fitness: F) -> EvolutionOutcome
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        let dims = bounds.len();
        let pop_size = (self.settings.population_multiplier * dims).max(MIN_POPULATION);
        let mut rng = StdRng::seed_from_u64(self.settings.seed);

        let to_bounds = |unit: &[f64]| -> Vec<f64> {
            unit.iter()
                .zip(bounds)
                .map(|(u, (lo, hi))| lo + u * (hi - lo))
                .collect()
        };
        // Internally minimize energy = −fitness; NaN counts as infeasible.
        let energy = |unit: &Vec<f64>| -> f64 {
            let f = fitness(&to_bounds(unit));
            if f.is_nan() {
                f64::INFINITY
            } else {
                -f
            }
        };

        let mut population = latin_hypercube(pop_size, dims, &mut rng);
        let mut energies = self.evaluate_all(&population, &energy);
        let mut evaluations = pop_size;
        let mut best_idx = argmin(&energies);
        let mut converged = self.has_converged(&energies);
        let mut generations = 0;

        while !converged && generations < self.settings.max_generations {
            generations += 1;
            let (f_lo, f_hi) = self.settings.mutation;
            let scale = if f_hi > f_lo {
                rng.gen_range(f_lo..f_hi)
            } else {
                f_lo
            };

            let trials: Vec<Vec<f64>> = (0..pop_size)
                .map(|i| self.make_trial(&population, i, best_idx, scale, &mut rng))
                .collect();
            let trial_energies = self.evaluate_all(&trials, &energy);
            evaluations += pop_size;

            for (i, (trial, e)) in trials.into_iter().zip(trial_energies).enumerate() {
                if e < energies[i] {
                    population[i] = trial;
                    energies[i] = e;
                }
            }
            best_idx = argmin(&energies);
            converged = self.has_converged(&energies);

            tracing::debug!(
                generation = generations,
                best = -energies[best_idx],
                scale,
                "evolution generation"
            );
        }

        EvolutionOutcome {
            best: to_bounds(&population[best_idx]),
            best_fitness: -energies[best_idx],
            generations,
            evaluations,
            converged,
        }
    }

    fn make_trial(
        &self,
        population: &[Vec<f64>],
        target: usize,
        best: usize,
        scale: f64,
        rng: &mut StdRng,
    ) -> Vec<f64> {
        let n = population.len();
        let dims = population[target].len();
        let r1 = pick_distinct(n, &[target], rng);
        let r2 = pick_distinct(n, &[target, r1], rng);
        let forced = rng.gen_range(0..dims);

        (0..dims)
            .map(|j| {
                let cross = rng.gen::<f64>() < self.settings.recombination || j == forced;
                let gene = if cross {
                    population[best][j] + scale * (population[r1][j] - population[r2][j])
                } else {
                    population[target][j]
                };
                if (0.0..=1.0).contains(&gene) {
                    gene
                } else {
                    rng.gen::<f64>()
                }
            })
            .collect()
    }

    fn evaluate_all<E>(&self, points: &[Vec<f64>], energy: &E) -> Vec<f64>
    where
        E: Fn(&Vec<f64>) -> f64 + Sync,
    {
        if self.parallel {
            points.par_iter().map(energy).collect()
        } else {
            points.iter().map(energy).collect()
        }
    }

    fn has_converged(&self, energies: &[f64]) -> bool {
        if energies.iter().any(|e| !e.is_finite()) {
            return false;
        }
        population_std(energies)
            <= self.settings.atol + self.settings.tolerance * mean(energies).abs()
    }
}

/// Stratified sample of the unit cube: each dimension's `n` strata are hit once.
fn latin_hypercube(n: usize, dims: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut population = vec![vec![0.0; dims]; n];
    for j in 0..dims {
        let mut strata: Vec<usize> = (0..n).collect();
        strata.shuffle(rng);
        for (i, s) in strata.into_iter().enumerate() {
            population[i][j] = (s as f64 + rng.gen::<f64>()) / n as f64;
        }
    }
    population
}

fn pick_distinct(n: usize, exclude: &[usize], rng: &mut StdRng) -> usize {
    loop {
        let k = rng.gen_range(0..n);
        if !exclude.contains(&k) {
            return k;
        }
    }
}

/// Index of the smallest energy; ties keep the earliest index.
fn argmin(energies: &[f64]) -> usize {
    let mut best = 0;
    for (i, e) in energies.iter().enumerate() {
        if *e < energies[best] {
            best = i;
        }
    }
    best
}
