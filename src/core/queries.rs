use crate::core::service::CrmService;
use crate::domain::model::{Customer, CustomerId, Order, Product};
use crate::utils::error::{CrmError, Result};
use chrono::{Local, NaiveDate, TimeZone};
use rust_decimal::Decimal;
use std::cmp::Ordering;

pub const HELLO: &str = "Hello, GraphQL!";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    pub name_icontains: Option<String>,
    pub email_icontains: Option<String>,
    pub phone_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub name_icontains: Option<String>,
    pub price_gte: Option<Decimal>,
    pub price_lte: Option<Decimal>,
    pub stock_lt: Option<u32>,
}

/// 日期區間兩端都包含，以本地日曆日比較
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub order_date_gte: Option<NaiveDate>,
    pub order_date_lte: Option<NaiveDate>,
    pub total_amount_gte: Option<Decimal>,
    pub customer_name_icontains: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub descending: bool,
}

/// 可依欄位名稱排序的實體
pub trait Sortable {
    const ENTITY: &'static str;
    const FIELDS: &'static [&'static str];

    fn compare_field(&self, other: &Self, field: &str) -> Ordering;
}

impl Sortable for Customer {
    const ENTITY: &'static str = "Customer";
    const FIELDS: &'static [&'static str] = &["id", "name", "email", "phone"];

    fn compare_field(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "name" => self.name.cmp(&other.name),
            "email" => self.email.cmp(&other.email),
            "phone" => self.phone.cmp(&other.phone),
            _ => Ordering::Equal,
        }
    }
}

impl Sortable for Product {
    const ENTITY: &'static str = "Product";
    const FIELDS: &'static [&'static str] = &["id", "name", "price", "stock"];

    fn compare_field(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "name" => self.name.cmp(&other.name),
            "price" => self.price.cmp(&other.price),
            "stock" => self.stock.cmp(&other.stock),
            _ => Ordering::Equal,
        }
    }
}

impl Sortable for Order {
    const ENTITY: &'static str = "Order";
    const FIELDS: &'static [&'static str] =
        &["id", "customer", "customer_id", "total_amount", "order_date"];

    fn compare_field(&self, other: &Self, field: &str) -> Ordering {
        match field {
            "id" => self.id.cmp(&other.id),
            "customer" | "customer_id" => self.customer_id.cmp(&other.customer_id),
            "total_amount" => self.total_amount.cmp(&other.total_amount),
            "order_date" => self.order_date.cmp(&other.order_date),
            _ => Ordering::Equal,
        }
    }
}

/// `totalAmount` -> `total_amount`
fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// 解析 `orderBy` 欄位清單；開頭的 `-` 代表該欄位遞減
pub fn parse_order_by<T: Sortable>(fields: &[String]) -> Result<Vec<SortKey>> {
    fields
        .iter()
        .map(|raw| {
            let trimmed = raw.trim();
            let (descending, name) = match trimmed.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, trimmed),
            };
            let field = to_snake_case(name);

            if T::FIELDS.contains(&field.as_str()) {
                Ok(SortKey { field, descending })
            } else {
                Err(CrmError::UnknownSortField {
                    entity: T::ENTITY,
                    field: raw.clone(),
                })
            }
        })
        .collect()
}

/// 穩定排序，鍵值相同時保留原本的順序（預設為 id 遞增）
pub fn sort_records<T: Sortable>(records: &mut [T], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    records.sort_by(|a, b| {
        keys.iter()
            .map(|key| {
                let ordering = a.compare_field(b, &key.field);
                if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        let name_ok = self
            .name_icontains
            .as_deref()
            .is_none_or(|needle| contains_ignore_case(&customer.name, needle));
        let email_ok = self
            .email_icontains
            .as_deref()
            .is_none_or(|needle| contains_ignore_case(&customer.email, needle));
        let phone_ok = self.phone_prefix.as_deref().is_none_or(|prefix| {
            customer
                .phone
                .as_deref()
                .is_some_and(|phone| phone.starts_with(prefix))
        });

        name_ok && email_ok && phone_ok
    }
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        self.name_icontains
            .as_deref()
            .is_none_or(|needle| contains_ignore_case(&product.name, needle))
            && self.price_gte.is_none_or(|min| product.price >= min)
            && self.price_lte.is_none_or(|max| product.price <= max)
            && self.stock_lt.is_none_or(|limit| product.stock < limit)
    }
}

impl OrderFilter {
    fn matches(&self, order: &Order, customer_name: Option<&str>) -> bool {
        self.matches_in(&Local, order, customer_name)
    }

    /// 日期條件以 `tz` 的日曆日比較，伺服器使用本地時區
    fn matches_in<Tz: TimeZone>(&self, tz: &Tz, order: &Order, customer_name: Option<&str>) -> bool {
        let date = order.order_date.with_timezone(tz).date_naive();

        self.order_date_gte.is_none_or(|from| date >= from)
            && self.order_date_lte.is_none_or(|to| date <= to)
            && self.total_amount_gte.is_none_or(|min| order.total_amount >= min)
            && self
                .customer_name_icontains
                .as_deref()
                .is_none_or(|needle| customer_name.is_some_and(|name| contains_ignore_case(name, needle)))
    }
}

impl CrmService {
    pub fn hello(&self) -> &'static str {
        HELLO
    }

    pub async fn all_customers(
        &self,
        filter: &CustomerFilter,
        order_by: &[String],
    ) -> Result<Vec<Customer>> {
        let keys = parse_order_by::<Customer>(order_by)?;
        let mut customers: Vec<Customer> = self
            .store
            .list_customers()
            .await?
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect();

        sort_records(&mut customers, &keys);
        Ok(customers)
    }

    pub async fn all_products(
        &self,
        filter: &ProductFilter,
        order_by: &[String],
    ) -> Result<Vec<Product>> {
        let keys = parse_order_by::<Product>(order_by)?;
        let mut products: Vec<Product> = self
            .store
            .list_products()
            .await?
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();

        sort_records(&mut products, &keys);
        Ok(products)
    }

    pub async fn all_orders(&self, filter: &OrderFilter, order_by: &[String]) -> Result<Vec<Order>> {
        let keys = parse_order_by::<Order>(order_by)?;
        let orders = self.store.list_orders().await?;

        let mut matched = Vec::with_capacity(orders.len());
        for order in orders {
            let customer_name = match &filter.customer_name_icontains {
                Some(_) => self
                    .store
                    .get_customer(order.customer_id)
                    .await?
                    .map(|c| c.name),
                None => None,
            };
            if filter.matches(&order, customer_name.as_deref()) {
                matched.push(order);
            }
        }

        sort_records(&mut matched, &keys);
        Ok(matched)
    }

    pub async fn customer(&self, id: CustomerId) -> Result<Option<Customer>> {
        self.store.get_customer(id).await
    }

    /// 訂單的商品，依 id 排序
    pub async fn order_products(&self, order: &Order) -> Result<Vec<Product>> {
        self.store.find_products(&order.product_ids).await
    }

    pub async fn customers_count(&self) -> Result<usize> {
        Ok(self.store.list_customers().await?.len())
    }

    pub async fn orders_count(&self) -> Result<usize> {
        Ok(self.store.list_orders().await?.len())
    }

    pub async fn total_revenue(&self) -> Result<Decimal> {
        Ok(self
            .store
            .list_orders()
            .await?
            .iter()
            .map(|o| o.total_amount)
            .sum())
    }
}
