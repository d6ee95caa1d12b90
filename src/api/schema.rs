use crate::api::types::{
    BulkCreateCustomersPayload, CreateCustomerPayload, CreateOrderPayload, CreateProductPayload,
    CustomerRecordInput, CustomerType, OrderType, ProductType, UpdateLowStockProductsPayload,
};
use crate::core::queries::{CustomerFilter, OrderFilter, ProductFilter};
use crate::core::CrmService;
use crate::domain::model::{CustomerInput, OrderInput, ProductInput};
use async_graphql::{Context, EmptySubscription, Object, Schema, ID};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

pub type CrmSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(service: CrmService) -> CrmSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(service)
        .finish()
}

/// 無法轉成 Decimal 的值回傳欄位錯誤，不會被忽略
fn decimal_arg(name: &str, value: Option<f64>) -> async_graphql::Result<Option<Decimal>> {
    value
        .map(|v| {
            Decimal::from_f64(v).ok_or_else(|| {
                async_graphql::Error::new(format!("Invalid value for {}: {} is out of range", name, v))
            })
        })
        .transpose()
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn hello(&self, ctx: &Context<'_>) -> async_graphql::Result<&'static str> {
        Ok(ctx.data::<CrmService>()?.hello())
    }

    async fn all_customers(
        &self,
        ctx: &Context<'_>,
        order_by: Option<Vec<String>>,
        name_icontains: Option<String>,
        email_icontains: Option<String>,
        phone_pattern: Option<String>,
    ) -> async_graphql::Result<Vec<CustomerType>> {
        let service = ctx.data::<CrmService>()?;
        let filter = CustomerFilter {
            name_icontains,
            email_icontains,
            phone_prefix: phone_pattern,
        };

        let customers = service
            .all_customers(&filter, order_by.as_deref().unwrap_or_default())
            .await?;
        Ok(customers.into_iter().map(CustomerType).collect())
    }

    async fn all_products(
        &self,
        ctx: &Context<'_>,
        order_by: Option<Vec<String>>,
        name_icontains: Option<String>,
        price_gte: Option<f64>,
        price_lte: Option<f64>,
        stock_lt: Option<i32>,
    ) -> async_graphql::Result<Vec<ProductType>> {
        let service = ctx.data::<CrmService>()?;
        let filter = ProductFilter {
            name_icontains,
            price_gte: decimal_arg("priceGte", price_gte)?,
            price_lte: decimal_arg("priceLte", price_lte)?,
            // 負數門檻不會有任何商品符合
            stock_lt: stock_lt.map(|limit| u32::try_from(limit).unwrap_or(0)),
        };

        let products = service
            .all_products(&filter, order_by.as_deref().unwrap_or_default())
            .await?;
        Ok(products.into_iter().map(ProductType).collect())
    }

    async fn all_orders(
        &self,
        ctx: &Context<'_>,
        order_by: Option<Vec<String>>,
        order_date_gte: Option<NaiveDate>,
        order_date_lte: Option<NaiveDate>,
        total_amount_gte: Option<f64>,
        customer_name: Option<String>,
    ) -> async_graphql::Result<Vec<OrderType>> {
        let service = ctx.data::<CrmService>()?;
        let filter = OrderFilter {
            order_date_gte,
            order_date_lte,
            total_amount_gte: decimal_arg("totalAmountGte", total_amount_gte)?,
            customer_name_icontains: customer_name,
        };

        let orders = service
            .all_orders(&filter, order_by.as_deref().unwrap_or_default())
            .await?;
        Ok(orders.into_iter().map(OrderType).collect())
    }

    async fn customers_count(&self, ctx: &Context<'_>) -> async_graphql::Result<usize> {
        Ok(ctx.data::<CrmService>()?.customers_count().await?)
    }

    async fn orders_count(&self, ctx: &Context<'_>) -> async_graphql::Result<usize> {
        Ok(ctx.data::<CrmService>()?.orders_count().await?)
    }

    async fn total_revenue(&self, ctx: &Context<'_>) -> async_graphql::Result<Decimal> {
        Ok(ctx.data::<CrmService>()?.total_revenue().await?)
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_customer(
        &self,
        ctx: &Context<'_>,
        name: String,
        email: String,
        phone: Option<String>,
    ) -> async_graphql::Result<CreateCustomerPayload> {
        let service = ctx.data::<CrmService>()?;
        let result = service
            .create_customer(CustomerInput { name, email, phone })
            .await?;
        Ok(result.into())
    }

    async fn bulk_create_customers(
        &self,
        ctx: &Context<'_>,
        input: Vec<CustomerRecordInput>,
    ) -> async_graphql::Result<BulkCreateCustomersPayload> {
        let service = ctx.data::<CrmService>()?;
        let records = input.into_iter().map(CustomerInput::from).collect();
        Ok(service.bulk_create_customers(records).await.into())
    }

    async fn create_product(
        &self,
        ctx: &Context<'_>,
        name: String,
        price: f64,
        stock: Option<i32>,
    ) -> async_graphql::Result<CreateProductPayload> {
        let service = ctx.data::<CrmService>()?;
        let result = service
            .create_product(ProductInput { name, price, stock })
            .await?;
        Ok(result.into())
    }

    async fn create_order(
        &self,
        ctx: &Context<'_>,
        customer_id: ID,
        product_ids: Vec<ID>,
        order_date: Option<DateTime<Utc>>,
    ) -> async_graphql::Result<CreateOrderPayload> {
        let service = ctx.data::<CrmService>()?;
        let result = service
            .create_order(OrderInput {
                customer_id: customer_id.0,
                product_ids: product_ids.into_iter().map(|id| id.0).collect(),
                order_date,
            })
            .await?;
        Ok(result.into())
    }

    async fn update_low_stock_products(
        &self,
        ctx: &Context<'_>,
    ) -> async_graphql::Result<UpdateLowStockProductsPayload> {
        let service = ctx.data::<CrmService>()?;
        Ok(service.update_low_stock_products().await?.into())
    }
}
