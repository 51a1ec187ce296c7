use serde_json::Value;
use url::Url;

/// Fetches snapshots of the public aircraft state feed.
#[derive(Clone, Debug)]
pub struct FeedClient {
    feed_url: Url,
    client: reqwest::Client,
}

impl FeedClient {
    pub fn new(feed_url: Url) -> Self {
        Self {
            feed_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn feed_url(&self) -> &Url {
        &self.feed_url
    }

    /// One GET against the feed. Non-2xx statuses and non-JSON bodies are errors.
    pub async fn fetch(&self) -> Result<Value, reqwest::Error> {
        let response = self
            .client
            .get(self.feed_url.clone())
            .send()
            .await?
            .error_for_status()?;
        response.json::<Value>().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn feed_at(server: &MockServer) -> FeedClient {
        FeedClient::new(Url::parse(&format!("{}/api/states/all", server.uri())).unwrap())
    }

    #[actix_web::test]
    async fn test_fetch_returns_json() {
        let server = MockServer::start().await;
        let body = json!({"time": 1700000000, "states": [["ICAO1", "data"]]});
        Mock::given(method("GET"))
            .and(path("/api/states/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .expect(1)
            .mount(&server)
            .await;

        let fetched = feed_at(&server).await.fetch().await.unwrap();
        assert_eq!(fetched, body);
    }

    #[actix_web::test]
    async fn test_fetch_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(feed_at(&server).await.fetch().await.is_err());
    }

    #[actix_web::test]
    async fn test_fetch_rejects_non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        assert!(feed_at(&server).await.fetch().await.is_err());
    }
}
