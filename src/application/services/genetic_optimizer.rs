//! Genetic optimizer service module
//!
//! A genetic algorithm over batch-order permutations: random initial
//! population, tournament parent selection, order-preserving crossover,
//! count-scaled swap mutation and elitism. Every operator routes through
//! the chromosome repair step, so permutations stay complete. Termination
//! is a fixed generation count, optionally cut short by a wall-clock
//! budget checked between generations.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use super::objective_evaluator::ObjectiveEvaluator;
use super::schedule_decoder::{DecodeOutcome, ScheduleDecoder};
use crate::domain::entities::GaParams;
use crate::domain::value_objects::Chromosome;

/// Best individual found by a GA run
#[derive(Debug, Clone)]
pub struct GaOutcome {
    /// Best permutation found
    pub chromosome: Chromosome,
    /// Its objective value
    pub objective: f64,
    /// Its decoded schedule
    pub decode: DecodeOutcome,
}

/// Runs the genetic search over a fixed batch table
pub struct GeneticOptimizer<'a> {
    decoder: &'a ScheduleDecoder<'a>,
    evaluator: &'a ObjectiveEvaluator<'a>,
    params: &'a GaParams,
}

impl<'a> GeneticOptimizer<'a> {
    /// Creates an optimizer over a decoder and evaluator
    pub fn new(
        decoder: &'a ScheduleDecoder<'a>,
        evaluator: &'a ObjectiveEvaluator<'a>,
        params: &'a GaParams,
    ) -> Self {
        Self {
            decoder,
            evaluator,
            params,
        }
    }

    /// Runs the configured number of generations and returns the best
    ///
    /// # Arguments
    ///
    /// * `rng` - Seeded random stream; the caller owns the master seed
    pub fn run(&self, rng: &mut StdRng) -> GaOutcome {
        let batch_count = self.decoder.batches().len();
        let pop_size = self.params.effective_pop_size();
        let generations = self.params.effective_generations();
        let deadline = self
            .params
            .time_budget_secs
            .map(|secs| (Instant::now(), secs));

        let mut population: Vec<Chromosome> = (0..pop_size)
            .map(|_| Chromosome::shuffled(batch_count, rng))
            .collect();
        let mut fitness = self.score_population(&population);

        let (mut best, mut best_objective) = pick_best(&population, &fitness);

        for generation in 0..generations {
            if let Some((started, budget)) = deadline {
                if started.elapsed().as_secs_f64() >= budget {
                    debug!(generation, "wall-clock budget reached; stopping early");
                    break;
                }
            }

            let mut ranking: Vec<usize> = (0..population.len()).collect();
            ranking.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));

            let mut next: Vec<Chromosome> = ranking
                .iter()
                .take(self.params.elite_count.min(pop_size))
                .map(|&i| population[i].clone())
                .collect();

            while next.len() < pop_size {
                let parent_a = self.select_parent(&population, &fitness, rng);
                let parent_b = self.select_parent(&population, &fitness, rng);
                let mut child = if rng.gen::<f64>() < self.params.crossover_rate {
                    parent_a.order_crossover(parent_b, rng)
                } else {
                    parent_a.clone()
                };
                child.swap_mutate(self.params.mutation_rate, rng);
                next.push(child);
            }

            population = next;
            fitness = self.score_population(&population);

            let (gen_best, gen_objective) = pick_best(&population, &fitness);
            if gen_objective < best_objective {
                best = gen_best;
                best_objective = gen_objective;
            }
            debug!(generation, best = best_objective, "generation complete");
        }

        // Decoding is idempotent, so re-decoding the winner is cheaper than
        // keeping every outcome around
        let decode = self.decoder.decode(&best);
        GaOutcome {
            chromosome: best,
            objective: best_objective,
            decode,
        }
    }

    fn score_population(&self, population: &[Chromosome]) -> Vec<f64> {
        population
            .iter()
            .map(|ch| self.evaluator.evaluate(&self.decoder.decode(ch)))
            .collect()
    }

    /// Tournament selection; k of 1 or less degrades to uniform sampling
    fn select_parent<'p>(
        &self,
        population: &'p [Chromosome],
        fitness: &[f64],
        rng: &mut StdRng,
    ) -> &'p Chromosome {
        let k = self.params.tournament_k.max(1).min(population.len());
        let mut winner = rng.gen_range(0..population.len());
        for _ in 1..k {
            let challenger = rng.gen_range(0..population.len());
            if fitness[challenger] < fitness[winner] {
                winner = challenger;
            }
        }
        &population[winner]
    }
}

fn pick_best(population: &[Chromosome], fitness: &[f64]) -> (Chromosome, f64) {
    let mut best_idx = 0;
    for idx in 1..population.len() {
        if fitness[idx] < fitness[best_idx] {
            best_idx = idx;
        }
    }
    (population[best_idx].clone(), fitness[best_idx])
}
