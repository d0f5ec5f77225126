pub mod bayes;
pub mod calibration;
pub mod engine;
pub mod genetic;
pub mod matrix;
pub mod monte_carlo;
pub mod poisson;
pub mod time_series;
pub mod types;

pub use engine::{analyze_match, analyze_match_with, team_seed};
pub use types::{PredictionResult, SimulationContext, Weather};
