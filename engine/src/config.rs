//! # Configuration
//!
//! Every numeric default named in SPEC_FULL.md §4.3-§4.8 lives in one `OptimizerParams` struct
//! with a `Default` impl, so a caller (CLI flag, TOML file, or test) can override a single knob
//! without touching algorithm code — the same "struct of tunables" shape the grounding stack
//! uses for its own strategy/permutator configuration.

use serde::{Deserialize, Serialize};

/// Tunable parameters for the Genetic Algorithm (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaParams {
    /// Tournament size for parent selection.
    pub tournament_k: usize,
    /// Crossover probability.
    pub crossover_rate: f64,
    /// Base mutation rate `mu_0`.
    pub mutation_rate: f64,
    /// Fraction of the population kept unchanged each generation.
    pub elitism_fraction: f64,
    /// Maximum number of generations.
    pub max_generations: u64,
    /// Generations without improvement `> stagnation_eps` before early termination.
    pub stagnation_generations: u64,
    /// Minimum improvement in best cost to reset the stagnation counter.
    pub stagnation_eps: f64,
}

impl Default for GaParams {
    fn default() -> Self {
        GaParams {
            tournament_k: 5,
            crossover_rate: 0.8,
            mutation_rate: 0.12,
            elitism_fraction: 0.08,
            max_generations: 500,
            stagnation_generations: 20,
            stagnation_eps: 1e-4,
        }
    }
}

impl GaParams {
    /// Population size scaled by `|V|` (§4.3: 200 below 100 nodes, 260 below 500, 500 else).
    pub fn population_size(&self, node_count: usize) -> usize {
        if node_count < 100 {
            200
        } else if node_count < 500 {
            260
        } else {
            500
        }
    }
}

/// Tunable parameters for Ant Colony Optimization (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcoParams {
    /// Pheromone exponent.
    pub alpha: f64,
    /// Heuristic exponent.
    pub beta: f64,
    /// Pheromone evaporation rate.
    pub evaporation: f64,
    /// Pheromone deposit scale `Q`.
    pub deposit: f64,
    /// Number of ants per iteration.
    pub n_ants: usize,
    /// Maximum number of iterations.
    pub max_iterations: u64,
    /// Iterations without improvement before early termination.
    pub stagnation_iterations: u64,
    /// Use the MMAS pheromone-clamping variant.
    pub mmas: bool,
}

impl Default for AcoParams {
    fn default() -> Self {
        AcoParams {
            alpha: 1.0,
            beta: 2.0,
            evaporation: 0.5,
            deposit: 100.0,
            n_ants: 50,
            max_iterations: 100,
            stagnation_iterations: 15,
            mmas: false,
        }
    }
}

/// Tunable parameters for Particle Swarm Optimization (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PsoParams {
    /// Inertia weight.
    pub inertia: f64,
    /// Personal-best coefficient.
    pub c1: f64,
    /// Global-best coefficient.
    pub c2: f64,
    /// Number of particles.
    pub n_particles: usize,
    /// Maximum number of iterations.
    pub max_iterations: u64,
    /// Iterations without improvement before early termination.
    pub stagnation_iterations: u64,
}

impl Default for PsoParams {
    fn default() -> Self {
        PsoParams {
            inertia: 0.7,
            c1: 1.5,
            c2: 1.5,
            n_particles: 30,
            max_iterations: 100,
            stagnation_iterations: 15,
        }
    }
}

/// Tunable parameters for Simulated Annealing (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaParams {
    /// Initial temperature.
    pub t_init: f64,
    /// Stopping temperature.
    pub t_final: f64,
    /// Geometric cooling factor.
    pub cooling_factor: f64,
    /// Iterations per temperature step.
    pub iterations_per_temp: u64,
    /// Retries of the neighbor operator before giving up on a step.
    pub neighbor_retries: u64,
}

impl Default for SaParams {
    fn default() -> Self {
        SaParams {
            t_init: 1000.0,
            t_final: 0.01,
            cooling_factor: 0.995,
            iterations_per_temp: 10,
            neighbor_retries: 20,
        }
    }
}

/// Tunable parameters shared by Q-Learning and SARSA (§4.7, §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TdLearningParams {
    /// Number of training episodes.
    pub episodes: u64,
    /// Initial exploration rate.
    pub epsilon_init: f64,
    /// Minimum exploration rate.
    pub epsilon_min: f64,
    /// Geometric decay factor applied to epsilon each episode.
    pub epsilon_decay: f64,
    /// Learning rate `eta`.
    pub learning_rate: f64,
    /// Discount factor `gamma`.
    pub discount: f64,
    /// Reward for reaching the destination.
    pub goal_reward: f64,
    /// Penalty for an episode that dead-ends.
    pub dead_end_penalty: f64,
}

impl Default for TdLearningParams {
    fn default() -> Self {
        TdLearningParams {
            episodes: 5000,
            epsilon_init: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            learning_rate: 0.1,
            discount: 0.95,
            goal_reward: 100.0,
            dead_end_penalty: -50.0,
        }
    }
}

impl TdLearningParams {
    /// Episode step cap `3 * |V|` (§4.7).
    pub fn max_episode_len(&self, node_count: usize) -> usize {
        3 * node_count.max(1)
    }
}

/// Every optimizer's tunables, constructible from CLI flags, a TOML file, or defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Genetic Algorithm parameters.
    pub ga: GaParams,
    /// Ant Colony Optimization parameters.
    pub aco: AcoParams,
    /// Particle Swarm Optimization parameters.
    pub pso: PsoParams,
    /// Simulated Annealing parameters.
    pub sa: SaParams,
    /// Q-Learning parameters.
    pub ql: TdLearningParams,
    /// SARSA parameters.
    pub sarsa: TdLearningParams,
}
