use crate::core::CrmService;
use crate::domain::model::{
    BulkCustomerResult, Customer, CustomerInput, CustomerResult, Order, OrderResult, Product,
    ProductResult, RestockResult,
};
use async_graphql::{Context, InputObject, Object, SimpleObject, ID};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub struct CustomerType(pub Customer);

#[Object(name = "CustomerType")]
impl CustomerType {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn phone(&self) -> Option<&str> {
        self.0.phone.as_deref()
    }
}

pub struct ProductType(pub Product);

#[Object(name = "ProductType")]
impl ProductType {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn price(&self) -> Decimal {
        self.0.price
    }

    async fn stock(&self) -> u32 {
        self.0.stock
    }
}

pub struct OrderType(pub Order);

#[Object(name = "OrderType")]
impl OrderType {
    async fn id(&self) -> ID {
        ID(self.0.id.to_string())
    }

    async fn customer(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<CustomerType>> {
        let service = ctx.data::<CrmService>()?;
        Ok(service.customer(self.0.customer_id).await?.map(CustomerType))
    }

    async fn products(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<ProductType>> {
        let service = ctx.data::<CrmService>()?;
        let products = service.order_products(&self.0).await?;
        Ok(products.into_iter().map(ProductType).collect())
    }

    async fn total_amount(&self) -> Decimal {
        self.0.total_amount
    }

    async fn order_date(&self) -> DateTime<Utc> {
        self.0.order_date
    }
}

/// 批次建立客戶的單筆輸入，欄位由 schema 嚴格限定
#[derive(Debug, Clone, InputObject)]
#[graphql(name = "CustomerInput")]
pub struct CustomerRecordInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<CustomerRecordInput> for CustomerInput {
    fn from(input: CustomerRecordInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            phone: input.phone,
        }
    }
}

#[derive(SimpleObject)]
pub struct CreateCustomerPayload {
    pub customer: Option<CustomerType>,
    pub message: String,
    pub errors: Vec<String>,
}

impl From<CustomerResult> for CreateCustomerPayload {
    fn from(result: CustomerResult) -> Self {
        Self {
            customer: result.customer.map(CustomerType),
            message: result.message,
            errors: result.errors,
        }
    }
}

#[derive(SimpleObject)]
pub struct BulkCreateCustomersPayload {
    pub customers: Vec<CustomerType>,
    pub errors: Vec<String>,
}

impl From<BulkCustomerResult> for BulkCreateCustomersPayload {
    fn from(result: BulkCustomerResult) -> Self {
        Self {
            customers: result.customers.into_iter().map(CustomerType).collect(),
            errors: result.errors,
        }
    }
}

#[derive(SimpleObject)]
pub struct CreateProductPayload {
    pub product: Option<ProductType>,
    pub errors: Vec<String>,
}

impl From<ProductResult> for CreateProductPayload {
    fn from(result: ProductResult) -> Self {
        Self {
            product: result.product.map(ProductType),
            errors: result.errors,
        }
    }
}

#[derive(SimpleObject)]
pub struct CreateOrderPayload {
    pub order: Option<OrderType>,
    pub errors: Vec<String>,
}

impl From<OrderResult> for CreateOrderPayload {
    fn from(result: OrderResult) -> Self {
        Self {
            order: result.order.map(OrderType),
            errors: result.errors,
        }
    }
}

#[derive(SimpleObject)]
pub struct UpdateLowStockProductsPayload {
    pub updated_products: Vec<ProductType>,
    pub message: String,
}

impl From<RestockResult> for UpdateLowStockProductsPayload {
    fn from(result: RestockResult) -> Self {
        Self {
            updated_products: result.updated_products.into_iter().map(ProductType).collect(),
            message: result.message,
        }
    }
}
