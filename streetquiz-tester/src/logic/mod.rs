pub mod assets;
pub mod policy;
pub mod reports;
pub mod seeds;
pub mod simulation;

pub use assets::{load_file_pool, synthetic_pool};
pub use policy::PolicyKind;
pub use seeds::resolve_seed_inputs;
pub use simulation::{RunRecord, SimulationConfig, StrategySummary, run_simulation, summarize_runs};
