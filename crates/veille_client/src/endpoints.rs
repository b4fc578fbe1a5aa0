//! Thin wrappers over the dashboard's read and admin endpoints.

use serde_json::{json, Value};
use url::form_urlencoded;

use crate::{ApiError, CallOptions, RequestClient};

fn with_query<'a>(path: &str, pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    if query.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{query}")
    }
}

impl RequestClient {
    pub async fn list_offers(&self, page: u32, filters: &[(&str, &str)]) -> Result<Value, ApiError> {
        let page = page.to_string();
        let pairs = std::iter::once(("page", page.as_str())).chain(filters.iter().copied());
        self.call(&with_query("/offres", pairs), CallOptions::get()).await
    }

    pub async fn offer(&self, id: u64) -> Result<Value, ApiError> {
        self.call(&format!("/offres/{id}"), CallOptions::get()).await
    }

    pub async fn search_offers(&self, query: &str, page: u32) -> Result<Value, ApiError> {
        let page = page.to_string();
        let path = with_query("/offres/rechercher", [("q", query), ("page", page.as_str())]);
        self.call(&path, CallOptions::get()).await
    }

    pub async fn list_keywords(&self, page: u32) -> Result<Value, ApiError> {
        let page = page.to_string();
        self.call(&with_query("/mots-cles", [("page", page.as_str())]), CallOptions::get())
            .await
    }

    /// Admin only.
    pub async fn add_keyword(&self, word: &str, category: &str) -> Result<Value, ApiError> {
        let body = json!({ "mot": word, "categorie": category });
        self.call("/mots-cles", CallOptions::post().with_body(body)).await
    }

    pub async fn list_sources(&self) -> Result<Value, ApiError> {
        self.call("/sources", CallOptions::get()).await
    }

    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.call("/stats", CallOptions::get()).await
    }

    pub async fn scheduler_status(&self) -> Result<Value, ApiError> {
        self.call("/scheduler/status", CallOptions::get()).await
    }

    pub async fn ai_status(&self) -> Result<Value, ApiError> {
        self.call("/ai/status", CallOptions::get()).await
    }
}

#[cfg(test)]
mod tests {
    use super::with_query;

    #[test]
    fn query_is_form_encoded() {
        assert_eq!(
            with_query("/offres/rechercher", [("q", "eau & assainissement"), ("page", "2")]),
            "/offres/rechercher?q=eau+%26+assainissement&page=2"
        );
        assert_eq!(with_query("/sources", Vec::<(&str, &str)>::new()), "/sources");
    }
}
