use std::time::Duration;

use crate::io::backend::{BackendError, CategoryBackend, DeleteRequest};
use crate::model::category::{CategoryDraft, CategoryId, CategoryNode};

/// `CategoryBackend` over the inventory REST API
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    /// `timeout` bounds each request; `None` waits indefinitely
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let agent = builder.build();
        HttpBackend {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn categories_url(&self) -> String {
        format!("{}/categories", self.base_url)
    }

    fn category_url(&self, id: &CategoryId) -> String {
        format!("{}/categories/{}", self.base_url, urlencoding::encode(id.as_str()))
    }
}

fn into_backend_error(err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            BackendError::from_status(code, &body)
        }
        ureq::Error::Transport(transport) => BackendError::Transport(transport.to_string()),
    }
}

fn decode_error(err: std::io::Error) -> BackendError {
    BackendError::Decode(err.to_string())
}

impl CategoryBackend for HttpBackend {
    fn list(&self, include_empty: bool) -> Result<Vec<CategoryNode>, BackendError> {
        let url = self.categories_url();
        tracing::debug!(%url, include_empty, "listing categories");
        self.agent
            .get(&url)
            .query("hierarchy", "true")
            .query("include_empty", if include_empty { "true" } else { "false" })
            .call()
            .map_err(into_backend_error)?
            .into_json()
            .map_err(decode_error)
    }

    fn create(&self, draft: &CategoryDraft) -> Result<CategoryNode, BackendError> {
        let url = self.categories_url();
        tracing::debug!(%url, name = %draft.name, "creating category");
        self.agent
            .post(&url)
            .send_json(draft)
            .map_err(into_backend_error)?
            .into_json()
            .map_err(decode_error)
    }

    fn update(&self, id: &CategoryId, draft: &CategoryDraft) -> Result<CategoryNode, BackendError> {
        let url = self.category_url(id);
        tracing::debug!(%url, "updating category");
        self.agent
            .put(&url)
            .send_json(draft)
            .map_err(into_backend_error)?
            .into_json()
            .map_err(decode_error)
    }

    fn delete(&self, request: &DeleteRequest) -> Result<(), BackendError> {
        let url = self.category_url(&request.id);
        tracing::debug!(
            %url,
            force = request.force,
            reassign_to = request.reassign_to.as_ref().map(CategoryId::as_str),
            "deleting category"
        );
        let mut call = self
            .agent
            .delete(&url)
            .query("force", if request.force { "true" } else { "false" });
        if let Some(target) = &request.reassign_to {
            call = call.query("reassign_to", target.as_str());
        }
        call.call().map_err(into_backend_error)?;
        Ok(())
    }
}
