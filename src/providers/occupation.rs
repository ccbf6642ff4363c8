use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Occupational skill-standards contract: role text → ranked occupations,
/// occupation code → skill/knowledge elements with importance.
#[async_trait]
pub trait OccupationProvider: Send + Sync {
    async fn search(&self, role: &str) -> anyhow::Result<Vec<OccupationSummary>>;
    async fn skills_for(&self, code: &str) -> anyhow::Result<Vec<RankedElement>>;

    /// Label used in errors, provider status maps, and citations.
    fn name(&self) -> &'static str {
        "careeronestop"
    }
}

/// One occupation hit, validated at the boundary.
#[derive(Debug, Clone)]
pub struct OccupationSummary {
    pub title: String,
    pub code: String,
    pub description: String,
}

/// One skill or knowledge element with its importance weight.
#[derive(Debug, Clone)]
pub struct RankedElement {
    pub name: String,
    pub importance: f64,
}

// ─── Wire payloads ──────────────────────────────────────────────────────────
// The provider has shipped several response shapes over time; aliases cover
// the ones observed in production.

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(
        alias = "OccupationList",
        alias = "OccupationDetailList",
        alias = "Occupations",
        default
    )]
    occupations: Vec<OccupationRow>,
}

#[derive(Debug, Deserialize)]
struct OccupationRow {
    #[serde(alias = "OnetTitle", alias = "Title", default)]
    title: Option<String>,
    #[serde(alias = "OnetCode", alias = "OccupationCode", alias = "Code", default)]
    code: Option<String>,
    #[serde(alias = "OccupationDescription", alias = "Duties", default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailPayload {
    #[serde(alias = "OccupationDetail", default)]
    details: Vec<DetailRow>,
}

#[derive(Debug, Deserialize)]
struct DetailRow {
    #[serde(alias = "SkillsDataList", default)]
    skills: Vec<ElementRow>,
    #[serde(alias = "KnowledgeDataList", default)]
    knowledge: Vec<ElementRow>,
}

#[derive(Debug, Deserialize)]
struct ElementRow {
    #[serde(alias = "ElementName", alias = "Skill", alias = "name", default)]
    name: Option<String>,
    #[serde(alias = "Importance", alias = "DataValue", default)]
    importance: Option<serde_json::Value>,
}

impl ElementRow {
    fn importance_value(&self) -> f64 {
        match &self.importance {
            Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

// ─── HTTP client ────────────────────────────────────────────────────────────

pub struct CareerOneStopClient {
    base_url: String,
    user_id: String,
    api_key: Option<String>,
    client: Client,
}

impl CareerOneStopClient {
    pub fn new(api_key: Option<&str>, user_id: &str, timeout_secs: u64) -> Self {
        Self::with_base_url(api_key, user_id, timeout_secs, None)
    }

    pub fn with_base_url(
        api_key: Option<&str>,
        user_id: &str,
        timeout_secs: u64,
        base_url: Option<&str>,
    ) -> Self {
        let base = base_url
            .map_or("https://api.careeronestop.org", |u| u.trim_end_matches('/'))
            .to_string();
        Self {
            base_url: base,
            user_id: user_id.to_string(),
            api_key: api_key.map(str::trim).filter(|k| !k.is_empty()).map(String::from),
            client: super::build_client(timeout_secs),
        }
    }

    fn bearer(&self) -> anyhow::Result<String> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!("CareerOneStop credentials not set. Provide an API key and user id.")
        })?;
        Ok(format!("Bearer {key}"))
    }

    /// Percent-encode a path segment (role text and occupation codes carry
    /// spaces and slashes).
    fn encode(segment: &str) -> String {
        segment
            .bytes()
            .map(|b| match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    char::from(b).to_string()
                }
                _ => format!("%{b:02X}"),
            })
            .collect()
    }
}

#[async_trait]
impl OccupationProvider for CareerOneStopClient {
    async fn search(&self, role: &str) -> anyhow::Result<Vec<OccupationSummary>> {
        let auth = self.bearer()?;
        let url = format!(
            "{}/v1/occupation/{}/{}/US/0/10",
            self.base_url,
            self.user_id,
            Self::encode(role.trim())
        );
        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::api_error("CareerOneStop", response).await);
        }

        let payload: SearchPayload = response.json().await?;
        Ok(payload
            .occupations
            .into_iter()
            .filter_map(|row| {
                let title = row.title.unwrap_or_default();
                if title.trim().is_empty() {
                    return None;
                }
                Some(OccupationSummary {
                    title,
                    code: row.code.unwrap_or_default().trim().to_string(),
                    description: row.description.unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn skills_for(&self, code: &str) -> anyhow::Result<Vec<RankedElement>> {
        let auth = self.bearer()?;
        let url = format!(
            "{}/v1/occupation/{}/{}/US",
            self.base_url,
            self.user_id,
            Self::encode(code)
        );
        let response = self
            .client
            .get(&url)
            .header("Authorization", auth)
            .query(&[("skills", "true"), ("knowledge", "true"), ("ability", "true")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(super::api_error("CareerOneStop", response).await);
        }

        let payload: DetailPayload = response.json().await?;
        let Some(detail) = payload.details.into_iter().next() else {
            return Ok(Vec::new());
        };

        let mut elements = Vec::new();
        for row in detail.skills.iter().chain(detail.knowledge.iter()) {
            let Some(name) = row.name.as_deref() else {
                continue;
            };
            if name.trim().is_empty() {
                continue;
            }
            elements.push(RankedElement {
                name: name.to_string(),
                importance: row.importance_value(),
            });
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CareerOneStopClient {
        CareerOneStopClient::with_base_url(Some("key"), "uid", 5, Some(&server.uri()))
    }

    #[tokio::test]
    async fn search_fails_without_credentials() {
        let c = CareerOneStopClient::new(None, "uid", 5);
        let err = c.search("software engineer").await.unwrap_err();
        assert!(err.to_string().contains("credentials not set"));
    }

    #[tokio::test]
    async fn search_parses_aliased_occupation_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/occupation/uid/software%20engineer/US/0/10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "OccupationList": [
                    {"OnetTitle": "Software Developers", "OnetCode": "15-1252.00",
                     "OccupationDescription": "Design software"},
                    {"Title": "Web Developers", "Code": "15-1254.00"},
                    {"OnetCode": "15-0000.00"}
                ]
            })))
            .mount(&server)
            .await;

        let rows = client(&server).search("software engineer").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Software Developers");
        assert_eq!(rows[0].code, "15-1252.00");
        assert_eq!(rows[1].title, "Web Developers");
        // The code-only row has no title and is dropped at the boundary.
    }

    #[tokio::test]
    async fn skills_for_merges_skills_and_knowledge() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/occupation/uid/15-1252.00/US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "OccupationDetail": [{
                    "SkillsDataList": [
                        {"ElementName": "Programming", "Importance": "75"},
                        {"ElementName": "Critical Thinking", "DataValue": 68.0}
                    ],
                    "KnowledgeDataList": [
                        {"ElementName": "Computers and Electronics", "Importance": 90.0}
                    ]
                }]
            })))
            .mount(&server)
            .await;

        let elements = client(&server).skills_for("15-1252.00").await.unwrap();
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].name, "Programming");
        assert_eq!(elements[0].importance, 75.0);
        assert_eq!(elements[2].importance, 90.0);
    }

    #[tokio::test]
    async fn empty_detail_yields_no_elements() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/occupation/uid/15-1252.00/US"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"OccupationDetail": []})),
            )
            .mount(&server)
            .await;

        let elements = client(&server).skills_for("15-1252.00").await.unwrap();
        assert!(elements.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream sad"))
            .mount(&server)
            .await;

        let err = client(&server).search("software engineer").await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
