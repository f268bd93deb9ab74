//! Response shapes of the GraphQL queries, and their conversion into the
//! stats types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stats::{ContributionCalendar, ContributionDay, LanguageBytes, RepositoryLanguages, RepositoryPage};

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

// ---------------------------------------------------------------------------
// User + contribution calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct UserData {
    pub user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserNode {
    pub login: String,
    pub name: Option<String>,
    pub followers: TotalCount,
    pub public_repos: TotalCount,
    pub owned_repos: TotalCount,
    pub contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionsCollection {
    pub contribution_calendar: CalendarNode,
}

#[derive(Debug, Deserialize)]
pub struct CalendarNode {
    pub weeks: Vec<WeekNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekNode {
    pub contribution_days: Vec<DayNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayNode {
    pub date: NaiveDate,
    pub contribution_count: u32,
}

/// Profile numbers shown on the stats card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub login: String,
    pub name: Option<String>,
    pub followers: u64,
    pub public_repos: u64,
    pub owned_repos: u64,
}

impl UserStats {
    /// The profile name, or the login when no name is set.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.login,
        }
    }
}

impl UserNode {
    /// Split into profile numbers and a sorted contribution calendar.
    pub fn into_parts(self) -> (UserStats, ContributionCalendar) {
        let days = self
            .contributions_collection
            .contribution_calendar
            .weeks
            .into_iter()
            .flat_map(|w| w.contribution_days)
            .map(|d| ContributionDay::new(d.date, d.contribution_count))
            .collect();
        let stats = UserStats {
            login: self.login,
            name: self.name,
            followers: self.followers.total_count,
            public_repos: self.public_repos.total_count,
            owned_repos: self.owned_repos.total_count,
        };
        (stats, ContributionCalendar::new(days))
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RepositoriesData {
    pub user: Option<RepositoriesOwner>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoriesOwner {
    pub repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConnection {
    pub page_info: PageInfo,
    pub nodes: Vec<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub name: String,
    pub stargazer_count: u64,
    #[serde(default)]
    pub is_archived: bool,
    pub languages: LanguageConnection,
}

#[derive(Debug, Deserialize)]
pub struct LanguageConnection {
    pub edges: Vec<LanguageEdge>,
}

#[derive(Debug, Deserialize)]
pub struct LanguageEdge {
    pub size: u64,
    pub node: LanguageNode,
}

#[derive(Debug, Deserialize)]
pub struct LanguageNode {
    pub name: String,
}

impl From<RepositoryNode> for RepositoryLanguages {
    fn from(node: RepositoryNode) -> Self {
        Self {
            name: node.name,
            stars: node.stargazer_count,
            archived: node.is_archived,
            languages: node
                .languages
                .edges
                .into_iter()
                .map(|e| LanguageBytes::new(e.node.name, e.size))
                .collect(),
        }
    }
}

impl From<RepositoryConnection> for RepositoryPage {
    fn from(conn: RepositoryConnection) -> Self {
        let next_cursor = if conn.page_info.has_next_page {
            if conn.page_info.end_cursor.is_none() {
                warn!("page reports more results but has no end cursor");
            }
            conn.page_info.end_cursor
        } else {
            None
        };
        Self {
            repositories: conn.nodes.into_iter().map(RepositoryLanguages::from).collect(),
            next_cursor,
        }
    }
}

// ---------------------------------------------------------------------------
// Latest release
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReleaseData {
    pub repository: Option<ReleaseRepository>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRepository {
    pub releases: ReleaseConnection,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseConnection {
    pub nodes: Vec<ReleaseNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseNode {
    pub tag_name: Option<String>,
    pub published_at: Option<String>,
    pub url: Option<String>,
}

/// Latest release of a repository; every field is `null` when none exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestRelease {
    pub tag: Option<String>,
    pub published_at: Option<String>,
    pub url: Option<String>,
}

impl From<ReleaseNode> for LatestRelease {
    fn from(node: ReleaseNode) -> Self {
        Self {
            tag: node.tag_name,
            published_at: node.published_at,
            url: node.url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_payload_into_parts() {
        let payload = serde_json::json!({
            "user": {
                "login": "octocat",
                "name": null,
                "followers": { "totalCount": 12 },
                "publicRepos": { "totalCount": 8 },
                "ownedRepos": { "totalCount": 9 },
                "contributionsCollection": {
                    "contributionCalendar": {
                        "weeks": [
                            { "contributionDays": [
                                { "date": "2024-01-02", "contributionCount": 3 },
                                { "date": "2024-01-01", "contributionCount": 1 }
                            ]},
                            { "contributionDays": [
                                { "date": "2024-01-03", "contributionCount": 0 }
                            ]}
                        ]
                    }
                }
            }
        });
        let data: UserData = serde_json::from_value(payload).unwrap();
        let (stats, calendar) = data.user.unwrap().into_parts();

        assert_eq!(stats.display_name(), "octocat");
        assert_eq!(stats.followers, 12);
        assert_eq!(stats.owned_repos, 9);
        let dates: Vec<String> = calendar.days().iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn test_display_name_prefers_name() {
        let stats = UserStats {
            login: "jdoe".into(),
            name: Some("Jane Doe".into()),
            followers: 0,
            public_repos: 0,
            owned_repos: 0,
        };
        assert_eq!(stats.display_name(), "Jane Doe");
    }

    #[test]
    fn test_repository_page_conversion() {
        let payload = serde_json::json!({
            "pageInfo": { "hasNextPage": true, "endCursor": "Y3Vyc29yOjEwMA==" },
            "nodes": [{
                "name": "SysAdmin-Tools",
                "stargazerCount": 42,
                "isArchived": false,
                "languages": { "edges": [
                    { "size": 900, "node": { "name": "PowerShell" } },
                    { "size": 100, "node": { "name": "VBScript" } }
                ]}
            }]
        });
        let conn: RepositoryConnection = serde_json::from_value(payload).unwrap();
        let page = RepositoryPage::from(conn);

        assert_eq!(page.next_cursor.as_deref(), Some("Y3Vyc29yOjEwMA=="));
        assert_eq!(page.repositories.len(), 1);
        assert_eq!(page.repositories[0].stars, 42);
        assert_eq!(page.repositories[0].languages[0], LanguageBytes::new("PowerShell", 900));
    }

    #[test]
    fn test_last_page_has_no_cursor() {
        let payload = serde_json::json!({
            "pageInfo": { "hasNextPage": false, "endCursor": "abc" },
            "nodes": []
        });
        let conn: RepositoryConnection = serde_json::from_value(payload).unwrap();
        assert!(RepositoryPage::from(conn).next_cursor.is_none());
    }

    #[test]
    fn test_release_serializes_nulls() {
        let json = serde_json::to_string(&LatestRelease::default()).unwrap();
        assert_eq!(json, r#"{"tag":null,"publishedAt":null,"url":null}"#);
    }

    #[test]
    fn test_graphql_envelope_with_errors() {
        let body = r#"{"data":null,"errors":[{"message":"Could not resolve to a User"}]}"#;
        let resp: GraphQlResponse<UserData> = serde_json::from_str(body).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.unwrap().len(), 1);
    }
}
