//! In-memory parameter cache and optimization log

use blocks_core::{BlockId, FormulaBlockParameters, OptimizationRecord};
use blocks_ports::{OptimizationLog, ParameterReader, ParameterWriter, StoreResult};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// In-memory parameter repository
///
/// Rows are keyed by (formula_id, block_id); writes replace.
pub struct InMemoryParameterRepository {
    rows: Arc<DashMap<(String, BlockId), FormulaBlockParameters>>,
    optimizations: Arc<RwLock<Vec<OptimizationRecord>>>,
}

impl InMemoryParameterRepository {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(DashMap::new()),
            optimizations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for InMemoryParameterRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryParameterRepository {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
            optimizations: Arc::clone(&self.optimizations),
        }
    }
}

impl ParameterReader for InMemoryParameterRepository {
    fn get_parameters(
        &self,
        formula_id: &str,
        block_id: BlockId,
    ) -> StoreResult<Option<FormulaBlockParameters>> {
        Ok(self
            .rows
            .get(&(formula_id.to_string(), block_id))
            .map(|r| r.value().clone()))
    }

    fn list_parameters(&self, formula_id: &str) -> StoreResult<Vec<FormulaBlockParameters>> {
        let mut rows: Vec<FormulaBlockParameters> = self
            .rows
            .iter()
            .filter(|r| r.formula_id == formula_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.block_id);
        Ok(rows)
    }
}

impl ParameterWriter for InMemoryParameterRepository {
    fn upsert_parameters(&self, row: &FormulaBlockParameters) -> StoreResult<()> {
        self.rows
            .insert((row.formula_id.clone(), row.block_id), row.clone());
        Ok(())
    }

    fn invalidate_parameters(&self, formula_id: &str, block_id: BlockId) -> StoreResult<bool> {
        Ok(self
            .rows
            .remove(&(formula_id.to_string(), block_id))
            .is_some())
    }
}

impl OptimizationLog for InMemoryParameterRepository {
    fn record_optimization(&self, record: &OptimizationRecord) -> StoreResult<()> {
        self.optimizations.write().push(record.clone());
        Ok(())
    }

    fn optimization_history(&self, formula_id: &str) -> StoreResult<Vec<OptimizationRecord>> {
        Ok(self
            .optimizations
            .read()
            .iter()
            .filter(|r| r.formula_id == formula_id)
            .cloned()
            .collect())
    }
}
