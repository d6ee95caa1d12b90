use crate::api::schema::CrmSchema;
use crate::domain::ports::GraphqlTransport;
use crate::utils::error::{CrmError, Result};
use async_graphql::{Request, Variables};
use async_trait::async_trait;

/// 不經過 HTTP，直接在同一個行程內執行 GraphQL 文件
#[derive(Clone)]
pub struct InProcessTransport {
    schema: CrmSchema,
}

impl InProcessTransport {
    pub fn new(schema: CrmSchema) -> Self {
        Self { schema }
    }
}

#[async_trait]
impl GraphqlTransport for InProcessTransport {
    async fn execute(
        &self,
        document: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let mut request = Request::new(document);
        if let Some(variables) = variables {
            request = request.variables(Variables::from_json(variables));
        }

        let response = self.schema.execute(request).await;
        if !response.errors.is_empty() {
            let message = response
                .errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(CrmError::GraphqlError { message });
        }

        Ok(response.data.into_json()?)
    }
}
