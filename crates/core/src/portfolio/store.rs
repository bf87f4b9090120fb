//! In-memory portfolio store.
//!
//! The default [`PortfolioRepositoryTrait`] implementation: one document per
//! owner in a concurrent map. Durable stores (SQL, document databases) live
//! outside this crate and implement the same trait.

use async_trait::async_trait;
use dashmap::DashMap;

use super::ledger_traits::PortfolioRepositoryTrait;
use super::positions_model::PortfolioRecord;
use crate::errors::Result;

#[derive(Default)]
pub struct InMemoryPortfolioStore {
    records: DashMap<String, PortfolioRecord>,
}

impl InMemoryPortfolioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PortfolioRepositoryTrait for InMemoryPortfolioStore {
    async fn load(&self, owner: &str) -> Result<Option<PortfolioRecord>> {
        Ok(self.records.get(owner).map(|r| r.value().clone()))
    }

    async fn save(&self, owner: &str, record: &PortfolioRecord) -> Result<()> {
        self.records.insert(owner.to_string(), record.clone());
        Ok(())
    }
}
