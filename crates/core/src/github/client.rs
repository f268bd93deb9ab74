//! GitHub GraphQL API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::models::{
    GraphQlResponse, LatestRelease, ReleaseData, RepositoriesData, UserData, UserStats,
};
use crate::errors::GitHubError;
use crate::stats::{ContributionCalendar, RepositoryPage, RepositorySource};

/// Per-request timeout; there are no retries.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_QUERY: &str = r#"
query($login: String!) {
  user(login: $login) {
    login
    name
    followers { totalCount }
    publicRepos: repositories(privacy: PUBLIC) { totalCount }
    ownedRepos: repositories(ownerAffiliations: OWNER) { totalCount }
    contributionsCollection {
      contributionCalendar {
        weeks {
          contributionDays { date contributionCount }
        }
      }
    }
  }
}
"#;

const RELEASE_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    releases(first: 1, orderBy: {field: CREATED_AT, direction: DESC}) {
      nodes { tagName publishedAt url }
    }
  }
}
"#;

const REPOSITORIES_QUERY: &str = r#"
query($login: String!, $cursor: String) {
  user(login: $login) {
    repositories(
      first: 100,
      after: $cursor,
      ownerAffiliations: OWNER,
      isFork: false,
      orderBy: {field: UPDATED_AT, direction: DESC}
    ) {
      pageInfo { hasNextPage endCursor }
      nodes {
        name
        stargazerCount
        isArchived
        languages(first: 12, orderBy: {field: SIZE, direction: DESC}) {
          edges { size node { name } }
        }
      }
    }
  }
}
"#;

/// Asynchronous GitHub GraphQL client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    graphql_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(graphql_url: impl Into<String>, token: impl Into<String>) -> Result<Self, GitHubError> {
        let graphql_url = graphql_url.into();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("readme-cards-generator"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        info!(graphql_url = %graphql_url, "created GitHubClient");
        Ok(Self {
            http,
            graphql_url,
            token: token.into(),
        })
    }

    /// Run one GraphQL query and return its `data` member.
    ///
    /// A response carrying an `errors` array, or without data, is an error.
    #[instrument(skip(self, query, variables))]
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, GitHubError> {
        let resp = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let body = resp.text().await?;
        decode_graphql(&body)
    }

    /// Profile numbers and the trailing-year contribution calendar.
    #[instrument(skip(self))]
    pub async fn fetch_user(
        &self,
        login: &str,
    ) -> Result<(UserStats, ContributionCalendar), GitHubError> {
        let data: UserData = self
            .graphql("user", USER_QUERY, json!({ "login": login }))
            .await?;
        let user = data.user.ok_or_else(|| GitHubError::NotFound {
            entity: "user".into(),
            name: login.into(),
        })?;
        let (stats, calendar) = user.into_parts();
        debug!(login = %stats.login, days = calendar.days().len(), "fetched user stats");
        Ok((stats, calendar))
    }

    /// Most recently created release, `None` when the repository has none.
    #[instrument(skip(self))]
    pub async fn latest_release(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<LatestRelease>, GitHubError> {
        let data: ReleaseData = self
            .graphql(
                "release",
                RELEASE_QUERY,
                json!({ "owner": owner, "name": name }),
            )
            .await?;
        let repo = data.repository.ok_or_else(|| GitHubError::NotFound {
            entity: "repository".into(),
            name: format!("{owner}/{name}"),
        })?;
        let release = repo.releases.nodes.into_iter().next().map(LatestRelease::from);
        debug!(found = release.is_some(), "fetched latest release");
        Ok(release)
    }

    /// One page of the user's owned, non-fork repositories.
    #[instrument(skip(self))]
    pub async fn repositories_page(
        &self,
        login: &str,
        cursor: Option<&str>,
    ) -> Result<RepositoryPage, GitHubError> {
        let data: RepositoriesData = self
            .graphql(
                "repositories",
                REPOSITORIES_QUERY,
                json!({ "login": login, "cursor": cursor }),
            )
            .await?;
        let owner = data.user.ok_or_else(|| GitHubError::NotFound {
            entity: "user".into(),
            name: login.into(),
        })?;
        let page = RepositoryPage::from(owner.repositories);
        debug!(
            count = page.repositories.len(),
            more = page.next_cursor.is_some(),
            "fetched repository page"
        );
        Ok(page)
    }

    /// Repository source over `login`'s owned repositories.
    pub fn owned_repositories(&self, login: impl Into<String>) -> OwnedRepositories {
        OwnedRepositories {
            client: self.clone(),
            login: login.into(),
        }
    }
}

/// [`RepositorySource`] backed by the repositories query.
pub struct OwnedRepositories {
    client: GitHubClient,
    login: String,
}

#[async_trait]
impl RepositorySource for OwnedRepositories {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<RepositoryPage, GitHubError> {
        self.client.repositories_page(&self.login, cursor).await
    }
}

/// Turn a raw GraphQL body into its data, surfacing `errors` and null data.
pub fn decode_graphql<T: DeserializeOwned>(body: &str) -> Result<T, GitHubError> {
    let envelope: GraphQlResponse<T> =
        serde_json::from_str(body).map_err(|e| GitHubError::ParseError(e.to_string()))?;

    if let Some(errors) = envelope.errors.filter(|e| !e.is_empty()) {
        let rendered = serde_json::to_string_pretty(&errors)
            .unwrap_or_else(|_| format!("{} error(s)", errors.len()));
        return Err(GitHubError::GraphQl(rendered));
    }

    envelope.data.ok_or(GitHubError::EmptyData)
}

async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, GitHubError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let rate_limited = resp
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        == Some("0");
    if status.as_u16() == 429 || (status.as_u16() == 403 && rate_limited) {
        let reset = resp
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        return Err(GitHubError::RateLimited { reset_at: reset });
    }
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(GitHubError::AuthenticationFailed(format!("HTTP {}", status)));
    }

    let body = resp.text().await.unwrap_or_default();
    Err(GitHubError::ApiError {
        status: status.as_u16(),
        body,
    })
}
