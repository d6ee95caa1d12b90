use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type CustomerId = i64;
pub type ProductId = i64;
pub type OrderId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub product_ids: Vec<ProductId>,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
}

/// 新增客戶的輸入，只接受 name / email / phone 三個欄位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductInput {
    pub name: String,
    pub price: f64,
    pub stock: Option<i32>,
}

/// id 保持呼叫端傳入的原樣，解析失敗視同找不到
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    pub customer_id: String,
    pub product_ids: Vec<String>,
    pub order_date: Option<DateTime<Utc>>,
}

/// 已通過驗證、等待寫入的資料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub stock: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub product_ids: Vec<ProductId>,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerResult {
    pub customer: Option<Customer>,
    pub message: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkCustomerResult {
    pub customers: Vec<Customer>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductResult {
    pub product: Option<Product>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderResult {
    pub order: Option<Order>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestockResult {
    pub updated_products: Vec<Product>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_input_requires_name_and_email() {
        let input: CustomerInput = serde_json::from_value(serde_json::json!({
            "name": "Alice",
            "email": "alice@example.com"
        }))
        .unwrap();
        assert_eq!(input.phone, None);

        let missing_email = serde_json::from_value::<CustomerInput>(serde_json::json!({
            "name": "Bob"
        }));
        assert!(missing_email.is_err());
    }

    #[test]
    fn test_customer_input_rejects_unknown_keys() {
        let result = serde_json::from_value::<CustomerInput>(serde_json::json!({
            "name": "Eve",
            "email": "eve@example.com",
            "is_admin": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_customer_input_rejects_non_mapping_payloads() {
        // 字串形式的 payload 不會被當成程式碼解析
        let result = serde_json::from_value::<CustomerInput>(serde_json::json!(
            "{'name': 'Mallory', 'email': 'm@example.com'}"
        ));
        assert!(result.is_err());
    }
}
