//! Templates in the `templates` table.

use async_trait::async_trait;
use tracing::debug;

use shorts_models::Template;

use crate::client::RestClient;
use crate::error::DbResult;
use crate::store::TemplateStore;

/// Table holding video templates.
pub const TEMPLATES_TABLE: &str = "templates";

/// REST-backed template repository.
#[derive(Clone)]
pub struct TemplateRepository {
    client: RestClient,
}

impl TemplateRepository {
    /// Create a new template repository.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TemplateStore for TemplateRepository {
    async fn get_template(&self, template_id: &str) -> DbResult<Option<Template>> {
        let rows: Vec<Template> = self
            .client
            .select(
                TEMPLATES_TABLE,
                &[
                    ("select", "*".to_string()),
                    ("template_id", format!("eq.{template_id}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        debug!(template_id, found = !rows.is_empty(), "Loaded template");
        Ok(rows.into_iter().next())
    }
}
