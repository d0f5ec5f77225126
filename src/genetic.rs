use rand::Rng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use serde_json::Value;

use crate::types::CompositeIndices;

#[derive(Debug, Clone, Copy)]
pub struct GaConfig {
    pub population_size: usize,
    pub mutation_rate: f64,
    /// Heavier rate used once, when seeding the initial population.
    pub init_mutation_rate: f64,
    pub crossover_rate: f64,
    pub elitism_count: usize,
    pub generations: usize,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 24,
            mutation_rate: 0.08,
            init_mutation_rate: 0.4,
            crossover_rate: 0.75,
            elitism_count: 2,
            generations: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GaOutcome {
    pub best_params: Value,
    pub best_fitness: f64,
    /// Running best per generation; non-decreasing by construction.
    pub convergence: Vec<f64>,
}

/// Population search over an arbitrary JSON structure with numeric
/// leaves. Mutation and crossover recurse over the value tree, so any
/// flat-or-nested record of numbers works as a genome.
///
/// Fitness evaluation for a generation runs in parallel; the collect is
/// the generation barrier (selection and elitism need the full fitness
/// vector before anyone advances). Selection, crossover and mutation
/// draw from the injected RNG sequentially, so a fixed seed reproduces
/// the full run.
pub fn optimize<F>(cfg: &GaConfig, seed_params: &Value, fitness: F, rng: &mut StdRng) -> GaOutcome
where
    F: Fn(&Value) -> f64 + Sync,
{
    let mut population = initialize(cfg, seed_params, rng);
    let mut best_fitness = f64::NEG_INFINITY;
    let mut best_individual = population[0].clone();
    let mut convergence = Vec::with_capacity(cfg.generations);

    for _ in 0..cfg.generations {
        let scores: Vec<f64> = population.par_iter().map(&fitness).collect();

        let (gen_best_idx, gen_best) = scores
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, f64::NEG_INFINITY));
        if gen_best > best_fitness {
            best_fitness = gen_best;
            best_individual = population[gen_best_idx].clone();
        }
        convergence.push(best_fitness);

        let selected = tournament_selection(&population, &scores, rng);
        let mut offspring = crossover(cfg, selected, rng);
        for child in &mut offspring {
            mutate_value(child, cfg.mutation_rate, rng);
        }
        apply_elitism(cfg, &population, &scores, &mut offspring);
        population = offspring;
    }

    GaOutcome {
        best_params: best_individual,
        best_fitness,
        convergence,
    }
}

/// Typed convenience wrapper for the engine's composite-index genome.
pub fn optimize_indices<F>(
    cfg: &GaConfig,
    seed: &CompositeIndices,
    fitness: F,
    rng: &mut StdRng,
) -> (CompositeIndices, f64, Vec<f64>)
where
    F: Fn(&CompositeIndices) -> f64 + Sync,
{
    let seed_value = serde_json::to_value(seed).unwrap_or(Value::Null);
    let outcome = optimize(
        cfg,
        &seed_value,
        |candidate| match serde_json::from_value::<CompositeIndices>(candidate.clone()) {
            Ok(indices) => fitness(&indices),
            Err(_) => f64::NEG_INFINITY,
        },
        rng,
    );
    let best = serde_json::from_value(outcome.best_params).unwrap_or(*seed);
    (best, outcome.best_fitness, outcome.convergence)
}

fn initialize(cfg: &GaConfig, seed: &Value, rng: &mut StdRng) -> Vec<Value> {
    (0..cfg.population_size)
        .map(|_| {
            let mut individual = seed.clone();
            mutate_value(&mut individual, cfg.init_mutation_rate, rng);
            individual
        })
        .collect()
}

fn tournament_selection(population: &[Value], scores: &[f64], rng: &mut StdRng) -> Vec<Value> {
    (0..population.len())
        .map(|_| {
            let i1 = rng.gen_range(0..population.len());
            let i2 = rng.gen_range(0..population.len());
            if scores[i1] > scores[i2] {
                population[i1].clone()
            } else {
                population[i2].clone()
            }
        })
        .collect()
}

/// Uniform crossover over top-level fields: adjacent pairs swap each
/// field independently with probability 0.5.
fn crossover(cfg: &GaConfig, selected: Vec<Value>, rng: &mut StdRng) -> Vec<Value> {
    let mut offspring = Vec::with_capacity(selected.len());
    let mut iter = selected.into_iter();

    while let Some(first) = iter.next() {
        let Some(second) = iter.next() else {
            offspring.push(first);
            break;
        };
        if rng.gen_range(0.0..1.0) < cfg.crossover_rate {
            let (c1, c2) = cross_pair(first, second, rng);
            offspring.push(c1);
            offspring.push(c2);
        } else {
            offspring.push(first);
            offspring.push(second);
        }
    }
    offspring
}

fn cross_pair(a: Value, b: Value, rng: &mut StdRng) -> (Value, Value) {
    match (a, b) {
        (Value::Object(mut ma), Value::Object(mut mb)) => {
            let keys: Vec<String> = ma.keys().cloned().collect();
            for key in keys {
                if mb.contains_key(&key) && rng.gen_range(0.0..1.0) < 0.5 {
                    let va = ma[&key].clone();
                    let vb = mb[&key].clone();
                    ma.insert(key.clone(), vb);
                    mb.insert(key, va);
                }
            }
            (Value::Object(ma), Value::Object(mb))
        }
        (a, b) => (a, b),
    }
}

/// Perturbs every numeric leaf independently with `rate` probability,
/// by a uniform relative nudge in +-12.5% of its current value.
fn mutate_value(value: &mut Value, rate: f64, rng: &mut StdRng) {
    match value {
        Value::Number(n) => {
            if rng.gen_range(0.0..1.0) < rate {
                let v = n.as_f64().unwrap_or(0.0);
                let nudged = v + rng.gen_range(-0.5..0.5) * v * 0.25;
                if let Some(num) = serde_json::Number::from_f64(nudged) {
                    *value = Value::Number(num);
                }
            }
        }
        Value::Object(map) => {
            for child in map.values_mut() {
                mutate_value(child, rate, rng);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                mutate_value(child, rate, rng);
            }
        }
        _ => {}
    }
}

/// Deep-copies the previous generation's fittest individuals into the
/// head of the new population.
fn apply_elitism(cfg: &GaConfig, population: &[Value], scores: &[f64], offspring: &mut [Value]) {
    let mut ranked: Vec<usize> = (0..population.len()).collect();
    ranked.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));
    for (slot, idx) in ranked.iter().take(cfg.elitism_count).enumerate() {
        if slot < offspring.len() {
            offspring[slot] = population[*idx].clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use serde_json::json;

    fn fitness(v: &Value) -> f64 {
        // Reward x close to 10 and y close to -4.
        let x = v["x"].as_f64().unwrap_or(0.0);
        let y = v["nested"]["y"].as_f64().unwrap_or(0.0);
        -(x - 10.0).powi(2) - (y + 4.0).powi(2)
    }

    #[test]
    fn convergence_history_is_non_decreasing() {
        let mut rng = StdRng::seed_from_u64(11);
        let seed = json!({ "x": 7.0, "nested": { "y": -2.0 } });
        let out = optimize(&GaConfig::default(), &seed, fitness, &mut rng);
        assert_eq!(out.convergence.len(), 12);
        for pair in out.convergence.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn best_fitness_beats_the_unoptimized_seed() {
        let mut rng = StdRng::seed_from_u64(42);
        let seed = json!({ "x": 7.0, "nested": { "y": -2.0 } });
        let seed_score = fitness(&seed);
        let out = optimize(&GaConfig::default(), &seed, fitness, &mut rng);
        assert!(out.best_fitness >= seed_score);
    }

    #[test]
    fn identical_seeds_reproduce_the_same_run() {
        let seed = json!({ "x": 3.0, "nested": { "y": 1.0 } });
        let mut r1 = StdRng::seed_from_u64(5);
        let mut r2 = StdRng::seed_from_u64(5);
        let o1 = optimize(&GaConfig::default(), &seed, fitness, &mut r1);
        let o2 = optimize(&GaConfig::default(), &seed, fitness, &mut r2);
        assert_eq!(o1.best_params, o2.best_params);
        assert_eq!(o1.convergence, o2.convergence);
    }

    #[test]
    fn mutation_touches_nested_numeric_leaves_only() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut v = json!({ "a": 4.0, "label": "keep", "inner": { "b": 2.0 } });
        // Rate 1.0 forces every numeric leaf to move.
        mutate_value(&mut v, 1.0, &mut rng);
        assert_eq!(v["label"], "keep");
        assert_ne!(v["a"].as_f64(), Some(4.0));
        assert_ne!(v["inner"]["b"].as_f64(), Some(2.0));
    }

    #[test]
    fn typed_wrapper_round_trips_composite_indices() {
        let mut rng = StdRng::seed_from_u64(9);
        let seed = CompositeIndices {
            offensive_power: 80.0,
            defensive_solidity: 76.0,
            home_advantage: 1.12,
            momentum: 0.1,
            fatigue: 12.0,
            motivation: 88.0,
        };
        let (best, fit, history) = optimize_indices(
            &GaConfig::default(),
            &seed,
            |ix| 100.0 - (ix.offensive_power - ix.defensive_solidity).abs(),
            &mut rng,
        );
        assert!(fit.is_finite());
        assert_eq!(history.len(), 12);
        assert!(best.offensive_power.is_finite());
    }
}
