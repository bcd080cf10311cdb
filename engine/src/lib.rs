//! # QoS-constrained path routing engine
//!
//! Given a source, a destination, a per-edge bandwidth demand, and three QoS weights, finds a
//! simple path minimizing a normalized weighted cost subject to the bandwidth constraint. Six
//! stochastic optimizers ([`optimizers::GeneticAlgorithm`], [`optimizers::AntColony`],
//! [`optimizers::ParticleSwarm`], [`optimizers::SimulatedAnnealing`], [`optimizers::QLearning`],
//! [`optimizers::Sarsa`]) compete on the same objective behind the common
//! [`optimizers::Optimizer`] trait; [`experiment::ExperimentRunner`] drives the
//! (test case × algorithm × repeat) matrix and [`report::ExperimentReport`] is its exported
//! result.

pub mod config;
pub mod error;
pub mod experiment;
pub mod graph;
pub mod kpaths;
pub mod metrics;
pub mod optimizers;
pub mod pathutil;
pub mod report;
pub mod result;
pub mod rng;
pub mod testcases;
pub mod validity;

pub use config::EngineConfig;
pub use error::Error;
pub use graph::Graph;
pub use metrics::Weights;
pub use optimizers::{CancelFlag, Optimizer};
pub use result::{OptResult, Seed, TestCase};
