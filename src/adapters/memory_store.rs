use crate::domain::model::{
    Customer, CustomerId, NewCustomer, NewOrder, NewProduct, Order, Product, ProductId,
};
use crate::domain::ports::CrmStore;
use crate::utils::error::{Result, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<i64, Order>,
    last_customer_id: i64,
    last_product_id: i64,
    last_order_id: i64,
}

/// 記憶體內的實體儲存，所有資料表共用一把 RwLock
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CrmStore for MemoryStore {
    async fn email_exists(&self, email: &str) -> Result<bool> {
        let tables = self.tables.read().await;
        Ok(tables.customers.values().any(|c| c.email == email))
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let mut tables = self.tables.write().await;

        // 檢查與寫入在同一把鎖內完成
        if tables.customers.values().any(|c| c.email == customer.email) {
            return Err(StoreError::DuplicateEmail {
                email: customer.email,
            }
            .into());
        }

        tables.last_customer_id += 1;
        let created = Customer {
            id: tables.last_customer_id,
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
        };
        tables.customers.insert(created.id, created.clone());

        tracing::debug!("Stored customer {} <{}>", created.id, created.email);
        Ok(created)
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.get(&id).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>> {
        let tables = self.tables.read().await;
        Ok(tables.customers.values().cloned().collect())
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut tables = self.tables.write().await;

        tables.last_product_id += 1;
        let created = Product {
            id: tables.last_product_id,
            name: product.name,
            price: product.price,
            stock: product.stock,
        };
        tables.products.insert(created.id, created.clone());

        tracing::debug!("Stored product {} ({})", created.id, created.name);
        Ok(created)
    }

    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let distinct: BTreeSet<ProductId> = ids.iter().copied().collect();

        Ok(distinct
            .into_iter()
            .filter_map(|id| tables.products.get(&id).cloned())
            .collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().cloned().collect())
    }

    async fn products_below_stock(&self, threshold: u32) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables
            .products
            .values()
            .filter(|p| p.stock < threshold)
            .cloned()
            .collect())
    }

    async fn save_product(&self, product: &Product) -> Result<Product> {
        let mut tables = self.tables.write().await;

        match tables.products.get_mut(&product.id) {
            Some(stored) => {
                *stored = product.clone();
                Ok(stored.clone())
            }
            None => Err(StoreError::NotFound {
                entity: "Product",
                id: product.id,
            }
            .into()),
        }
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut tables = self.tables.write().await;

        if !tables.customers.contains_key(&order.customer_id) {
            return Err(StoreError::NotFound {
                entity: "Customer",
                id: order.customer_id,
            }
            .into());
        }

        if let Some(missing) = order
            .product_ids
            .iter()
            .find(|id| !tables.products.contains_key(id))
        {
            return Err(StoreError::NotFound {
                entity: "Product",
                id: *missing,
            }
            .into());
        }

        tables.last_order_id += 1;
        let created = Order {
            id: tables.last_order_id,
            customer_id: order.customer_id,
            product_ids: order.product_ids,
            total_amount: order.total_amount,
            order_date: order.order_date,
        };
        tables.orders.insert(created.id, created.clone());

        tracing::debug!(
            "Stored order {} for customer {} ({} products)",
            created.id,
            created.customer_id,
            created.product_ids.len()
        );
        Ok(created)
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        Ok(tables.orders.values().cloned().collect())
    }
}
