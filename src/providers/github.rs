use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{HostError, RemoteHost, RemoteRepository};

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const GITHUB_ACCEPT: &str = "application/vnd.github+json";
// GitHub rejects requests without a User-Agent.
const USER_AGENT: &str = concat!("hoist/", env!("CARGO_PKG_VERSION"));

/// GitHub REST API client.
///
/// Holds the access token in memory only; the token is sent as a Bearer
/// header and never logged.
pub struct GithubHost {
    client: Client,
    token: String,
    api_url: String,
}

impl GithubHost {
    pub fn new(token: String) -> Self {
        Self::with_api_url(token, GITHUB_API_URL.to_string())
    }

    /// Same client pointed at a different API root (tests use this).
    pub fn with_api_url(token: String, api_url: String) -> Self {
        Self {
            client: Client::new(),
            token,
            api_url,
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .header("authorization", format!("Bearer {}", self.token))
            .header("accept", GITHUB_ACCEPT)
            .header("x-github-api-version", GITHUB_API_VERSION)
            .header("user-agent", USER_AGENT)
    }

    /// Resolve the login the token belongs to.
    async fn authenticated_login(&self) -> Result<String, HostError> {
        let response = self.request(Method::GET, "/user").send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(HostError::AuthFailed);
        }
        if !status.is_success() {
            let body = response.text().await?;
            return Err(HostError::Api {
                status: status.as_u16(),
                message: api_message(&body),
            });
        }

        let user: AuthenticatedUser = response.json().await?;
        Ok(user.login)
    }
}

// ---------- API request/response types ----------

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    auto_init: bool,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    clone_url: String,
    private: bool,
}

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

// ---------- Error mapping ----------

/// Map a failed `POST /user/repos` to the outcome the workflow reports.
///
/// GitHub answers 422 both for a taken name and for a malformed one; the
/// `errors[].message` text is what tells them apart.
fn classify_create_failure(name: &str, status: StatusCode, body: &str) -> HostError {
    if status == StatusCode::UNAUTHORIZED {
        return HostError::AuthFailed;
    }

    let parsed: Option<ApiError> = serde_json::from_str(body).ok();

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        let mut details: Vec<String> = Vec::new();
        if let Some(err) = &parsed {
            details.push(err.message.clone());
            details.extend(err.errors.iter().filter_map(|e| e.message.clone()));
        }

        if details
            .iter()
            .any(|m| m.to_lowercase().contains("already exists"))
        {
            return HostError::AlreadyExists(name.to_string());
        }

        let reason = details
            .into_iter()
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("; ");
        return HostError::InvalidName(if reason.is_empty() {
            "the service gave no reason".to_string()
        } else {
            reason
        });
    }

    HostError::Api {
        status: status.as_u16(),
        message: parsed
            .map(|e| e.message)
            .unwrap_or_else(|| truncated(body, 200).to_string()),
    }
}

fn api_message(body: &str) -> String {
    serde_json::from_str::<ApiError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| truncated(body, 200).to_string())
}

/// Char-boundary-safe prefix of `body`.
fn truncated(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// ---------- RemoteHost implementation ----------

#[async_trait]
impl RemoteHost for GithubHost {
    async fn validate_credential(&self) -> bool {
        match self.authenticated_login().await {
            Ok(login) => {
                debug!("token accepted for '{}'", login);
                true
            }
            Err(err) => {
                debug!("token validation failed: {}", err);
                false
            }
        }
    }

    async fn create_repository(
        &self,
        name: &str,
        private: bool,
        description: Option<&str>,
    ) -> Result<RemoteRepository, HostError> {
        let payload = CreateRepoRequest {
            name,
            private,
            description,
            // The folder's own content becomes the initial content; the
            // service must not create a README or branch first.
            auto_init: false,
        };

        let response = self
            .request(Method::POST, "/user/repos")
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(classify_create_failure(name, status, &body));
        }

        let repo: RepoResponse = serde_json::from_str(&body).map_err(|err| HostError::Api {
            status: status.as_u16(),
            message: format!("Unparseable creation response: {}", err),
        })?;

        debug!("created repository '{}' at {}", repo.name, repo.clone_url);
        Ok(RemoteRepository {
            name: repo.name,
            clone_url: repo.clone_url,
            private: repo.private,
        })
    }

    async fn repository_exists(&self, name: &str) -> bool {
        let login = match self.authenticated_login().await {
            Ok(login) => login,
            Err(err) => {
                warn!("could not resolve the account for the existence check: {}", err);
                return false;
            }
        };

        let response = match self
            .request(Method::GET, &format!("/repos/{}/{}", login, name))
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!("existence check for '{}' failed: {}", name, err);
                return false;
            }
        };

        match response.status() {
            status if status.is_success() => true,
            StatusCode::NOT_FOUND => false,
            status => {
                warn!("ambiguous existence answer for '{}' (HTTP {})", name, status);
                false
            }
        }
    }

    fn name(&self) -> &str {
        "github"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn host_for(server: &Server) -> GithubHost {
        GithubHost::with_api_url("ghp_testtoken".to_string(), server.url())
    }

    #[tokio::test]
    async fn test_create_repository_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/user/repos")
            .match_header("authorization", "Bearer ghp_testtoken")
            .match_header("user-agent", USER_AGENT)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "name": "demo",
                "private": true,
                "auto_init": false,
            })))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"name":"demo","clone_url":"https://github.com/octo/demo.git","private":true}"#,
            )
            .create_async()
            .await;

        let host = host_for(&server);
        let repo = host.create_repository("demo", true, None).await.unwrap();
        assert_eq!(repo.name, "demo");
        assert_eq!(repo.clone_url, "https://github.com/octo/demo.git");
        assert!(repo.private);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_repository_sends_description() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/user/repos")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "name": "demo",
                "description": "my project",
            })))
            .with_status(201)
            .with_body(
                r#"{"name":"demo","clone_url":"https://github.com/octo/demo.git","private":false}"#,
            )
            .create_async()
            .await;

        let host = host_for(&server);
        let repo = host
            .create_repository("demo", false, Some("my project"))
            .await
            .unwrap();
        assert!(!repo.private);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_repository_name_taken() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/user/repos")
            .with_status(422)
            .with_body(
                r#"{"message":"Repository creation failed.","errors":[{"resource":"Repository","code":"custom","field":"name","message":"name already exists on this account"}]}"#,
            )
            .create_async()
            .await;

        let host = host_for(&server);
        let err = host.create_repository("demo", true, None).await.unwrap_err();
        assert!(matches!(err, HostError::AlreadyExists(ref name) if name == "demo"));
    }

    #[tokio::test]
    async fn test_create_repository_invalid_name() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/user/repos")
            .with_status(422)
            .with_body(
                r#"{"message":"Repository creation failed.","errors":[{"resource":"Repository","code":"custom","field":"name","message":"name is too long (maximum is 100 characters)"}]}"#,
            )
            .create_async()
            .await;

        let host = host_for(&server);
        let err = host.create_repository("demo", true, None).await.unwrap_err();
        match err {
            HostError::InvalidName(reason) => assert!(reason.contains("too long")),
            other => panic!("expected InvalidName, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_repository_auth_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/user/repos")
            .with_status(401)
            .with_body(r#"{"message":"Bad credentials"}"#)
            .create_async()
            .await;

        let host = host_for(&server);
        let err = host.create_repository("demo", true, None).await.unwrap_err();
        assert!(matches!(err, HostError::AuthFailed));
    }

    #[tokio::test]
    async fn test_validate_credential_accepts_good_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/user")
            .match_header("authorization", "Bearer ghp_testtoken")
            .with_status(200)
            .with_body(r#"{"login":"octo"}"#)
            .create_async()
            .await;

        let host = host_for(&server);
        assert!(host.validate_credential().await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validate_credential_rejects_bad_token() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/user")
            .with_status(401)
            .with_body(r#"{"message":"Bad credentials"}"#)
            .create_async()
            .await;

        let host = host_for(&server);
        assert!(!host.validate_credential().await);
    }

    #[tokio::test]
    async fn test_repository_exists_answers() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/user")
            .with_status(200)
            .with_body(r#"{"login":"octo"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octo/taken")
            .with_status(200)
            .with_body(r#"{"name":"taken"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octo/free")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/octo/flaky")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let host = host_for(&server);
        assert!(host.repository_exists("taken").await);
        assert!(!host.repository_exists("free").await);
        // Ambiguous answers never count as "found".
        assert!(!host.repository_exists("flaky").await);
    }

    #[test]
    fn test_classify_unparseable_body() {
        let err = classify_create_failure("x", StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        match err {
            HostError::Api { status, message } => {
                assert_eq!(status, 502);
                assert!(message.contains("bad gateway"));
            }
            other => panic!("expected Api, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_422_without_details() {
        let err = classify_create_failure("x", StatusCode::UNPROCESSABLE_ENTITY, "{}");
        assert!(matches!(err, HostError::InvalidName(_)));
    }

    #[test]
    fn test_truncated_respects_char_boundaries() {
        assert_eq!(truncated("abcdef", 3), "abc");
        assert_eq!(truncated("ab", 5), "ab");
        assert_eq!(truncated("héllo wörld", 4), "héll");
    }
}
