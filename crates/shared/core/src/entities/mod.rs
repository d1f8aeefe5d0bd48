mod analysis;
mod block;
mod observation;
mod parameters;
mod regime;

pub use analysis::{BlockAnalysis, PerformanceMetrics, RiskLevel};
pub use block::{Block, BlockType, ErrorStatistics, StoredBlock};
pub use observation::ErrorObservation;
pub use parameters::{FormulaBlockParameters, OptimizationRecord, ParameterSet, keys};
pub use regime::{MarketRegime, RegimeProfile, RegimeRange};
