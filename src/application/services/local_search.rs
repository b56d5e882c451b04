//! Local search service module
//!
//! Simulated-annealing refinement around a chromosome with a tabu ring of
//! recently visited candidates. Neighbors come from swap mutation; a
//! worse neighbor is still accepted with probability `exp(-delta / T)`,
//! and the temperature cools geometrically each iteration.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use super::genetic_optimizer::GaOutcome;
use super::objective_evaluator::ObjectiveEvaluator;
use super::schedule_decoder::ScheduleDecoder;
use crate::domain::entities::LocalSearchParams;
use crate::domain::value_objects::Chromosome;

/// Refines chromosomes with SA acceptance and tabu memory
pub struct LocalSearch<'a> {
    decoder: &'a ScheduleDecoder<'a>,
    evaluator: &'a ObjectiveEvaluator<'a>,
    params: &'a LocalSearchParams,
}

impl<'a> LocalSearch<'a> {
    /// Creates a local search over a decoder and evaluator
    pub fn new(
        decoder: &'a ScheduleDecoder<'a>,
        evaluator: &'a ObjectiveEvaluator<'a>,
        params: &'a LocalSearchParams,
    ) -> Self {
        Self {
            decoder,
            evaluator,
            params,
        }
    }

    /// Refines a starting solution and returns the best found
    ///
    /// The signature of a candidate is its gene vector; since batches are
    /// immutable and indexed, the indices identify the batches completely.
    pub fn refine(&self, start: GaOutcome, rng: &mut StdRng) -> GaOutcome {
        let mut current = start.chromosome.clone();
        let mut best = start.chromosome;
        let mut best_objective = start.objective;

        let mut tabu: VecDeque<Vec<usize>> = VecDeque::with_capacity(self.params.tabu_size);
        let mut temperature = self.params.initial_temp;

        for iteration in 0..self.params.iterations {
            let mut neighbor = current.clone();
            neighbor.swap_mutate(self.params.mutation_rate, rng);

            let signature = neighbor.genes().to_vec();
            if tabu.contains(&signature) {
                temperature *= self.params.cooling;
                continue;
            }

            let objective = self.evaluator.evaluate(&self.decoder.decode(&neighbor));
            let delta = objective - best_objective;
            let accept = delta < 0.0 || rng.gen::<f64>() < (-delta / temperature).exp();

            if accept {
                current = neighbor.clone();
                if objective < best_objective {
                    best = neighbor;
                    best_objective = objective;
                    debug!(iteration, objective, "local search improvement");
                }
                if tabu.len() == self.params.tabu_size {
                    tabu.pop_front();
                }
                tabu.push_back(signature);
            }

            temperature *= self.params.cooling;
        }

        let decode = self.decoder.decode(&best);
        GaOutcome {
            chromosome: best,
            objective: best_objective,
            decode,
        }
    }
}
