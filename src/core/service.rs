use crate::domain::ports::CrmStore;
use std::sync::Arc;

/// 低庫存補貨規則：庫存嚴格小於 `threshold` 的商品一律加上 `increment`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockPolicy {
    pub threshold: u32,
    pub increment: u32,
}

impl Default for RestockPolicy {
    fn default() -> Self {
        Self {
            threshold: 10,
            increment: 10,
        }
    }
}

/// Mutation / query 層的入口，GraphQL resolver 直接委派到這裡
#[derive(Clone)]
pub struct CrmService {
    pub(crate) store: Arc<dyn CrmStore>,
    pub(crate) restock: RestockPolicy,
}

impl CrmService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self {
            store,
            restock: RestockPolicy::default(),
        }
    }

    pub fn with_restock_policy(mut self, policy: RestockPolicy) -> Self {
        self.restock = policy;
        self
    }

    pub fn restock_policy(&self) -> RestockPolicy {
        self.restock
    }

    pub fn store(&self) -> &Arc<dyn CrmStore> {
        &self.store
    }
}
