//! Ports for the parameter cache and the optimization log

use crate::error::StoreResult;
use blocks_core::{BlockId, FormulaBlockParameters, OptimizationRecord};

/// Read operations for cached parameter sets
pub trait ParameterReader: Send + Sync {
    /// Cached row for a (formula, block) pair
    fn get_parameters(
        &self,
        formula_id: &str,
        block_id: BlockId,
    ) -> StoreResult<Option<FormulaBlockParameters>>;

    /// All cached rows for a formula, ordered by block ID
    fn list_parameters(&self, formula_id: &str) -> StoreResult<Vec<FormulaBlockParameters>>;
}

/// Write operations for cached parameter sets
pub trait ParameterWriter: Send + Sync {
    /// Insert or replace the row keyed by (formula_id, block_id)
    fn upsert_parameters(&self, row: &FormulaBlockParameters) -> StoreResult<()>;

    /// Remove a cached row; returns false if none existed
    fn invalidate_parameters(&self, formula_id: &str, block_id: BlockId) -> StoreResult<bool>;
}

/// Combined repository trait
pub trait ParameterRepository: ParameterReader + ParameterWriter {}

// Blanket implementation
impl<T: ParameterReader + ParameterWriter> ParameterRepository for T {}

/// Append-only log of regime optimization runs
pub trait OptimizationLog: Send + Sync {
    fn record_optimization(&self, record: &OptimizationRecord) -> StoreResult<()>;

    /// Records for a formula, oldest first
    fn optimization_history(&self, formula_id: &str) -> StoreResult<Vec<OptimizationRecord>>;
}
