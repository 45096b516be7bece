use crate::error::{FetchError, Result};
use crate::vacancy::{SearchQuery, VacancyDetail, VacancyPage};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.hh.ru";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; HH-Analyzer/1.0)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings shared by every request of a run.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct VacancyClient {
    client: Client,
    base_url: Url,
}

impl VacancyClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;

        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Canonical detail URL for a vacancy identifier.
    pub fn detail_url(&self, id: &str) -> Result<String> {
        self.endpoint(&format!("vacancies/{}", id))
            .map(|url| url.to_string())
    }

    /// Fetch one page of search results. Any non-2xx status is an error.
    pub async fn fetch_page(&self, query: &SearchQuery) -> Result<VacancyPage> {
        let url = self.endpoint("vacancies")?;
        debug!("Fetching area={} page={} from {}", query.area, query.page, url);

        let start = Instant::now();
        let response = self.client.get(url.clone()).query(&query.params()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        let page: VacancyPage = serde_json::from_slice(&body)?;
        info!(
            "area={} page={}: {} vacancies in {:?}",
            query.area,
            query.page,
            page.items.len(),
            start.elapsed()
        );
        Ok(page)
    }

    /// Fetch the description and key skills of one vacancy as a single text.
    ///
    /// A non-2xx status yields an empty string rather than an error; only
    /// transport and decode failures are reported.
    pub async fn fetch_description(&self, url: &str) -> Result<String> {
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("{} returned {}, treating as empty", url, status);
            return Ok(String::new());
        }

        let body = response.bytes().await?;
        let detail: VacancyDetail = serde_json::from_slice(&body)?;
        Ok(detail.text())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        let current_path = url.path().to_string();
        let path_base = if current_path.ends_with('/') {
            current_path
        } else {
            format!("{}/", current_path)
        };
        url.set_path(&format!("{}{}", path_base, path.trim_start_matches('/')));
        url.set_query(None);

        if url.cannot_be_a_base() {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> VacancyClient {
        VacancyClient::new(ClientConfig::default().with_api_url(server.uri())).unwrap()
    }

    fn query(page: u32) -> SearchQuery {
        SearchQuery {
            text: "программист".to_string(),
            area: "72".to_string(),
            page,
            per_page: 50,
            experience: "noExperience".to_string(),
        }
    }

    #[test]
    fn test_detail_url_from_root() {
        let client =
            VacancyClient::new(ClientConfig::default().with_api_url("https://api.hh.ru")).unwrap();
        assert_eq!(
            client.detail_url("93353083").unwrap(),
            "https://api.hh.ru/vacancies/93353083"
        );
    }

    #[test]
    fn test_detail_url_keeps_base_path() {
        let client = VacancyClient::new(
            ClientConfig::default().with_api_url("http://localhost:8080/proxy"),
        )
        .unwrap();
        assert_eq!(
            client.detail_url("7").unwrap(),
            "http://localhost:8080/proxy/vacancies/7"
        );
    }

    #[test]
    fn test_invalid_api_url_is_rejected() {
        let result = VacancyClient::new(ClientConfig::default().with_api_url("not a url"));
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_page_sends_search_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vacancies"))
            .and(query_param("text", "программист"))
            .and(query_param("area", "72"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "50"))
            .and(query_param("experience", "noExperience"))
            .and(header("user-agent", DEFAULT_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [{
                    "id": "1",
                    "name": "Стажер Python",
                    "area": {"id": "72", "name": "Пермь"},
                    "alternate_url": "https://hh.ru/vacancy/1"
                }],
                "found": 1,
                "page": 1,
                "pages": 2
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client_for(&server).fetch_page(&query(1)).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0]["name"], "Стажер Python");
        assert_eq!(page.pages, Some(2));
    }

    #[tokio::test]
    async fn test_fetch_page_fails_on_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vacancies"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_page(&query(0)).await;
        assert!(matches!(result, Err(FetchError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_fetch_description_returns_text() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vacancies/42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "description": "Опыт Django",
                "key_skills": [{"name": "Docker"}, {"name": "Linux"}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.detail_url("42").unwrap();
        let text = client.fetch_description(&url).await.unwrap();
        assert_eq!(text, "Опыт Django Docker Linux");
    }

    #[tokio::test]
    async fn test_fetch_description_soft_fails_on_404() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vacancies/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.detail_url("404").unwrap();
        let text = client.fetch_description(&url).await.unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn test_fetch_description_reports_bad_json() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vacancies/9"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let url = client.detail_url("9").unwrap();
        let result = client.fetch_description(&url).await;
        assert!(matches!(result, Err(FetchError::DecodeError(_))));
    }

    #[tokio::test]
    async fn test_fetch_description_times_out() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/vacancies/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"description": "late"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = VacancyClient::new(
            ClientConfig::default()
                .with_api_url(server.uri())
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap();
        let url = client.detail_url("slow").unwrap();
        let result = client.fetch_description(&url).await;
        assert!(matches!(result, Err(FetchError::HttpError(_))));
    }
}
