use crate::core::service::CrmService;
use crate::domain::model::{
    BulkCustomerResult, CustomerInput, CustomerResult, NewCustomer, NewOrder, NewProduct,
    OrderInput, OrderResult, ProductInput, ProductResult, RestockResult,
};
use crate::utils::error::{CrmError, Result, StoreError};
use crate::utils::validation::{is_valid_email, validate_phone, PHONE_FORMAT_HINT};
use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

pub const EMAIL_EXISTS: &str = "Email already exists";
pub const NAME_BLANK: &str = "Name cannot be blank";
pub const EMAIL_INVALID: &str = "Enter a valid email address";
pub const PRICE_NOT_POSITIVE: &str = "Price must be positive";
pub const PRICE_OUT_OF_RANGE: &str = "Price is out of range";
pub const STOCK_NEGATIVE: &str = "Stock cannot be negative";
pub const INVALID_CUSTOMER_ID: &str = "Invalid customer ID";
pub const PRODUCTS_REQUIRED: &str = "At least one product is required";
pub const INVALID_PRODUCT_IDS: &str = "One or more product IDs are invalid";

pub const CUSTOMER_CREATED: &str = "Customer created successfully";
pub const CUSTOMER_FAILED: &str = "Failed to create customer";
pub const RESTOCK_MESSAGE: &str = "Low stock products successfully updated.";

const PRICE_DECIMAL_PLACES: u32 = 2;

fn phone_error() -> String {
    format!("Invalid phone format. {}", PHONE_FORMAT_HINT)
}

fn order_failure(message: &str) -> OrderResult {
    OrderResult {
        order: None,
        errors: vec![message.to_string()],
    }
}

fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

impl CrmService {
    /// 客戶資料的所有檢查，全部跑完才回傳，錯誤依序累積
    async fn check_customer(&self, input: &CustomerInput) -> Result<Vec<String>> {
        let mut errors = Vec::new();

        if self.store.email_exists(&input.email).await? {
            errors.push(EMAIL_EXISTS.to_string());
        }

        if let Some(phone) = &input.phone {
            if !validate_phone(phone) {
                errors.push(phone_error());
            }
        }

        // 模型層驗證
        if input.name.trim().is_empty() {
            errors.push(NAME_BLANK.to_string());
        }
        if !is_valid_email(&input.email) {
            errors.push(EMAIL_INVALID.to_string());
        }

        Ok(errors)
    }

    pub async fn create_customer(&self, input: CustomerInput) -> Result<CustomerResult> {
        let errors = self.check_customer(&input).await?;
        if !errors.is_empty() {
            tracing::info!(
                "Rejected customer <{}>: {}",
                input.email,
                errors.join("; ")
            );
            return Ok(CustomerResult {
                customer: None,
                message: CUSTOMER_FAILED.to_string(),
                errors,
            });
        }

        let new_customer = NewCustomer {
            name: input.name,
            email: input.email,
            phone: input.phone,
        };

        match self.store.insert_customer(new_customer).await {
            Ok(customer) => {
                tracing::info!("✅ Created customer {} <{}>", customer.id, customer.email);
                Ok(CustomerResult {
                    customer: Some(customer),
                    message: CUSTOMER_CREATED.to_string(),
                    errors: Vec::new(),
                })
            }
            // 檢查之後才被其他請求搶先寫入
            Err(CrmError::StoreError(StoreError::DuplicateEmail { .. })) => Ok(CustomerResult {
                customer: None,
                message: CUSTOMER_FAILED.to_string(),
                errors: vec![EMAIL_EXISTS.to_string()],
            }),
            Err(e) => Err(e),
        }
    }

    /// 逐筆建立客戶。每筆獨立成功或失敗，失敗的記錄不會回滾已建立的其他記錄。
    pub async fn bulk_create_customers(&self, inputs: Vec<CustomerInput>) -> BulkCustomerResult {
        let mut result = BulkCustomerResult::default();

        for (index, input) in inputs.into_iter().enumerate() {
            let key = if input.email.trim().is_empty() {
                format!("record #{}", index + 1)
            } else {
                input.email.clone()
            };

            let errors = match self.check_customer(&input).await {
                Ok(errors) => errors,
                Err(e) => vec![e.to_string()],
            };
            if !errors.is_empty() {
                result.errors.push(format!("{}: {}", key, errors.join("; ")));
                continue;
            }

            let new_customer = NewCustomer {
                name: input.name,
                email: input.email,
                phone: input.phone,
            };

            match self.store.insert_customer(new_customer).await {
                Ok(customer) => result.customers.push(customer),
                Err(CrmError::StoreError(StoreError::DuplicateEmail { .. })) => {
                    result.errors.push(format!("{}: {}", key, EMAIL_EXISTS));
                }
                Err(e) => result.errors.push(format!("{}: {}", key, e)),
            }
        }

        tracing::info!(
            "Bulk customer import: {} created, {} rejected",
            result.customers.len(),
            result.errors.len()
        );
        result
    }

    pub async fn create_product(&self, input: ProductInput) -> Result<ProductResult> {
        let mut errors = Vec::new();

        let price = match Decimal::from_f64(input.price).map(|p| p.round_dp(PRICE_DECIMAL_PLACES)) {
            Some(price) if price > Decimal::ZERO => Some(price),
            // 超出 Decimal 可表示的範圍
            None if input.price > 0.0 => {
                errors.push(PRICE_OUT_OF_RANGE.to_string());
                None
            }
            _ => {
                errors.push(PRICE_NOT_POSITIVE.to_string());
                None
            }
        };

        let stock = input.stock.unwrap_or(0);
        if stock < 0 {
            errors.push(STOCK_NEGATIVE.to_string());
        }

        if input.name.trim().is_empty() {
            errors.push(NAME_BLANK.to_string());
        }

        let price = match price {
            Some(price) if errors.is_empty() => price,
            _ => {
                return Ok(ProductResult {
                    product: None,
                    errors,
                })
            }
        };

        let product = self
            .store
            .insert_product(NewProduct {
                name: input.name,
                price,
                stock: stock.unsigned_abs(),
            })
            .await?;

        tracing::info!("✅ Created product {} ({})", product.id, product.name);
        Ok(ProductResult {
            product: Some(product),
            errors: Vec::new(),
        })
    }

    /// 依序檢查客戶、商品清單、商品 id，任一步失敗就停止
    pub async fn create_order(&self, input: OrderInput) -> Result<OrderResult> {
        let customer = match parse_id(&input.customer_id) {
            Some(id) => self.store.get_customer(id).await?,
            None => None,
        };
        let Some(customer) = customer else {
            return Ok(order_failure(INVALID_CUSTOMER_ID));
        };

        if input.product_ids.is_empty() {
            return Ok(order_failure(PRODUCTS_REQUIRED));
        }

        let requested: Vec<i64> = input
            .product_ids
            .iter()
            .filter_map(|raw| parse_id(raw))
            .collect();
        let products = self.store.find_products(&requested).await?;
        if products.len() != input.product_ids.len() {
            return Ok(order_failure(INVALID_PRODUCT_IDS));
        }

        let total_amount: Decimal = products.iter().map(|p| p.price).sum();
        let order = self
            .store
            .insert_order(NewOrder {
                customer_id: customer.id,
                product_ids: products.iter().map(|p| p.id).collect(),
                total_amount,
                order_date: input.order_date.unwrap_or_else(Utc::now),
            })
            .await?;

        tracing::info!(
            "✅ Created order {} for customer {} (total {})",
            order.id,
            customer.id,
            order.total_amount
        );
        Ok(OrderResult {
            order: Some(order),
            errors: Vec::new(),
        })
    }

    /// 補貨不是補到門檻，而是固定加上 increment，因此執行後仍可能低於門檻
    pub async fn update_low_stock_products(&self) -> Result<RestockResult> {
        let policy = self.restock;
        let low_stock = self.store.products_below_stock(policy.threshold).await?;

        let mut updated_products = Vec::with_capacity(low_stock.len());
        for mut product in low_stock {
            product.stock = product.stock.saturating_add(policy.increment);
            updated_products.push(self.store.save_product(&product).await?);
        }

        tracing::info!(
            "📦 Restocked {} products below {} units",
            updated_products.len(),
            policy.threshold
        );
        Ok(RestockResult {
            updated_products,
            message: RESTOCK_MESSAGE.to_string(),
        })
    }
}
