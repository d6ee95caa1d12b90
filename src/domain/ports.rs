use crate::domain::model::{
    Customer, CustomerId, NewCustomer, NewOrder, NewProduct, Order, Product, ProductId,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 實體儲存：Customer / Product / Order 的持久化
///
/// 實作必須保證 email 唯一；`insert_customer` 遇到重複 email 時回傳
/// `StoreError::DuplicateEmail`，且不寫入任何資料。
#[async_trait]
pub trait CrmStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool>;
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer>;
    async fn get_customer(&self, id: CustomerId) -> Result<Option<Customer>>;
    async fn list_customers(&self) -> Result<Vec<Customer>>;

    async fn insert_product(&self, product: NewProduct) -> Result<Product>;
    /// 回傳存在的商品，重複的 id 只會出現一次
    async fn find_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn products_below_stock(&self, threshold: u32) -> Result<Vec<Product>>;
    async fn save_product(&self, product: &Product) -> Result<Product>;

    async fn insert_order(&self, order: NewOrder) -> Result<Order>;
    async fn list_orders(&self) -> Result<Vec<Order>>;
}

/// 排程工作呼叫 GraphQL API 的通道，回傳 response 的 `data` 部分
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    async fn execute(
        &self,
        document: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value>;
}

/// 排程工作的文字 log 輸出，每次呼叫寫入一行
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn append_line(&self, line: &str) -> Result<()>;
}
