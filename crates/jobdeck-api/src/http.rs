//! `reqwest`-backed implementation of [`JobsApi`].

use crate::client::JobsApi;
use crate::error::{ApiError, Result, GENERIC_FAILURE};
use crate::message::extract_message;
use crate::query::set_query_param;
use async_trait::async_trait;
use jobdeck_core::{ApiConfig, Job, JobHistory, JobId, JobName, Paginated, StatusKind};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

/// HTTP client for the jobs API.
pub struct HttpJobsApi {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpJobsApi {
    /// Create a client from API settings.
    ///
    /// # Errors
    /// Returns error if the base URL does not parse or the HTTP client
    /// cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Internal(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Resolve an API-relative path such as `/jobs/?page_size=15`.
    fn endpoint(&self, path: &str) -> Result<Url> {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let raw = format!("{}{path}", self.base_url);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{raw}: {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body)
            .unwrap_or_else(|| format!("{GENERIC_FAILURE} with status code {}", status.as_u16()));
        debug!(status = status.as_u16(), %message, "jobs API returned an error");

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout {
                seconds: self.timeout_secs,
            }
        } else {
            ApiError::Network(err)
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateJobBody<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct StatusUpdateBody {
    status_type: StatusKind,
}

#[async_trait]
impl JobsApi for HttpJobsApi {
    async fn list_jobs(&self, path: &str, query: Option<&str>) -> Result<Paginated<Job>> {
        let mut url = self.endpoint(path)?;
        if let Some(q) = query.filter(|q| !q.is_empty()) {
            set_query_param(&mut url, "q", q);
        }
        debug!(url = %url, "listing jobs");
        self.send_json(self.client.get(url)).await
    }

    async fn create_job(&self, name: &JobName) -> Result<Job> {
        let url = self.endpoint("/jobs/")?;
        let body = CreateJobBody {
            name: name.as_str(),
        };
        self.send_json(self.client.post(url).json(&body)).await
    }

    async fn update_status(&self, id: JobId, status: StatusKind) -> Result<Job> {
        let url = self.endpoint(&format!("/jobs/{id}/status/"))?;
        let body = StatusUpdateBody {
            status_type: status,
        };
        self.send_json(self.client.post(url).json(&body)).await
    }

    async fn delete_job(&self, id: JobId) -> Result<()> {
        let url = self.endpoint(&format!("/jobs/{id}/"))?;
        self.send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn get_job(&self, id: JobId) -> Result<Job> {
        let url = self.endpoint(&format!("/jobs/{id}/"))?;
        self.send_json(self.client.get(url)).await
    }

    async fn job_history(&self, id: JobId) -> Result<JobHistory> {
        let url = self.endpoint(&format!("/jobs/{id}/history/"))?;
        self.send_json(self.client.get(url)).await
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, ServerGuard};

    const JOB_JSON: &str = r#"{
        "id": 3,
        "name": "helium",
        "created_at": "2025-01-02T03:04:05Z",
        "updated_at": "2025-01-02T03:04:05Z",
        "current_status": {"status_type": "PENDING", "timestamp": "2025-01-02T03:04:05Z"}
    }"#;

    fn api_for(server: &ServerGuard) -> HttpJobsApi {
        let config = ApiConfig {
            base_url: format!("{}/api/", server.url()),
            ..ApiConfig::default()
        };
        HttpJobsApi::new(&config).expect("create client")
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = ApiConfig {
            base_url: "::nope::".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpJobsApi::new(&config),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_list_sets_query_param() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/jobs/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("page_size".into(), "15".into()),
                Matcher::UrlEncoded("q".into(), "he".into()),
            ]))
            .with_status(200)
            .with_body(format!(
                r#"{{"results": [{JOB_JSON}], "next": null, "previous": null}}"#
            ))
            .create_async()
            .await;

        let api = api_for(&server);
        assert!(api.base_url().ends_with("/api"));

        let page = api
            .list_jobs("/jobs/?page_size=15&q=old", Some("he"))
            .await
            .expect("list jobs");

        mock.assert_async().await;
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, JobId(3));
    }

    #[tokio::test]
    async fn test_create_sends_trimmed_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/jobs/")
            .match_body(Matcher::Json(serde_json::json!({"name": "helium"})))
            .with_status(201)
            .with_body(JOB_JSON)
            .create_async()
            .await;

        let api = api_for(&server);
        let name = JobName::new("  helium ").expect("valid name");
        let job = api.create_job(&name).await.expect("create job");

        mock.assert_async().await;
        assert_eq!(job.name, "helium");
    }

    #[tokio::test]
    async fn test_update_status_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/jobs/3/status/")
            .match_body(Matcher::Json(
                serde_json::json!({"status_type": "IN_PROGRESS"}),
            ))
            .with_status(200)
            .with_body(JOB_JSON)
            .create_async()
            .await;

        let api = api_for(&server);
        api.update_status(JobId(3), StatusKind::InProgress)
            .await
            .expect("update status");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_no_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/api/jobs/3/")
            .with_status(204)
            .create_async()
            .await;

        let api = api_for(&server);
        api.delete_job(JobId(3)).await.expect("delete job");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validation_error_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/jobs/")
            .with_status(400)
            .with_body(r#"{"detail": {"name": ["Ensure this field has no more than 255 characters."]}}"#)
            .create_async()
            .await;

        let api = api_for(&server);
        let name = JobName::new("x").expect("valid name");
        let err = api.create_job(&name).await.expect_err("server rejects");

        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.user_message(),
            "name: Ensure this field has no more than 255 characters."
        );
    }

    #[tokio::test]
    async fn test_error_without_body_uses_status_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/jobs/9/")
            .with_status(404)
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.get_job(JobId(9)).await.expect_err("missing job");
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "Request failed with status code 404");
    }

    #[tokio::test]
    async fn test_unreadable_error_body_uses_status_code() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/api/jobs/4/")
            .with_status(500)
            .with_body("{}")
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.delete_job(JobId(4)).await.expect_err("server error");
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.user_message(), "Request failed with status code 500");
    }

    #[tokio::test]
    async fn test_history_decodes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/jobs/3/history/")
            .with_status(200)
            .with_body(format!(
                r#"{{"job": {JOB_JSON}, "results": [
                    {{"id": 1, "job": 3, "status_type": "PENDING", "timestamp": "2025-01-02T03:04:05Z"}},
                    {{"id": 2, "job": 3, "status_type": "FAILED", "timestamp": "2025-01-02T04:00:00Z"}}
                ]}}"#
            ))
            .create_async()
            .await;

        let api = api_for(&server);
        let history = api.job_history(JobId(3)).await.expect("history");
        assert_eq!(history.results.len(), 2);
        assert_eq!(history.results[1].status_type, StatusKind::Failed);
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/jobs/3/")
            .with_status(200)
            .with_body("{not json")
            .create_async()
            .await;

        let api = api_for(&server);
        let err = api.get_job(JobId(3)).await.expect_err("bad body");
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
