use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Duration;

use crate::config::Config;

/// Time window for a topic-trend report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    /// Week starting on the given Monday
    Week { start: chrono::NaiveDate },
    Month { month: u32, year: i32 },
    Quarter { quarter: u32, year: i32 },
    Year { year: i32 },
}

impl TimeRange {
    fn query(&self) -> Vec<(&'static str, String)> {
        match *self {
            TimeRange::Week { start } => {
                vec![("week", start.format("%Y-%m-%d").to_string())]
            }
            TimeRange::Month { month, year } => {
                vec![("month", month.to_string()), ("year", year.to_string())]
            }
            TimeRange::Quarter { quarter, year } => {
                vec![("quarter", quarter.to_string()), ("year", year.to_string())]
            }
            TimeRange::Year { year } => vec![("year", year.to_string())],
        }
    }
}

/// One point on the trend chart: a date label plus a value per topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    #[serde(default, alias = "fullDate")]
    pub full_date: Option<String>,
    /// Per-topic values keyed by topic name
    #[serde(flatten)]
    pub values: HashMap<String, Value>,
}

/// Ranked keyword within a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyword {
    pub text: String,
    pub value: f64,
    #[serde(default)]
    pub category: String,
}

/// Topic-trend report: the chart series, the topic list and the top
/// keywords per topic.
#[derive(Debug, Clone, Deserialize)]
pub struct TrendReport {
    pub data: Vec<TrendPoint>,
    pub topics: Vec<String>,
    #[serde(default)]
    pub keywords: HashMap<String, Vec<Keyword>>,
}

/// Entry of a popular-topics ranking.
#[derive(Debug, Clone, Deserialize)]
pub struct PopularTopic {
    pub topic: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub growth: Option<String>,
    #[serde(default)]
    pub articles: u64,
}

#[derive(Debug, Deserialize)]
struct RankedPayload<T> {
    results: T,
}

/// Client for the analytics (LDA) endpoints. Responses are already shaped
/// by the backend; this client only issues the GET and parses JSON.
#[derive(Clone)]
pub struct AnalyticsClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalyticsClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the topic-trend report for a time window.
    pub async fn topic_trends(&self, range: TimeRange) -> Result<TrendReport> {
        let url = format!("{}/lda/topic-trends/", self.base_url);
        self.http
            .get(&url)
            .query(&range.query())
            .send()
            .await
            .context("Failed to fetch topic trends")?
            .error_for_status()
            .context("Topic trends request rejected")?
            .json()
            .await
            .context("Failed to parse topic trends response")
    }

    pub async fn popular_topics_today(&self) -> Result<Vec<PopularTopic>> {
        self.popular_topics("popular-topics-today").await
    }

    pub async fn popular_topics_this_week(&self) -> Result<Vec<PopularTopic>> {
        self.popular_topics("popular-topics-this-week").await
    }

    pub async fn popular_topics_this_month(&self) -> Result<Vec<PopularTopic>> {
        self.popular_topics("popular-topics-this-month").await
    }

    async fn popular_topics(&self, endpoint: &str) -> Result<Vec<PopularTopic>> {
        let url = format!("{}/lda/{}/", self.base_url, endpoint);
        let payload: RankedPayload<Vec<PopularTopic>> = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {endpoint}"))?
            .error_for_status()
            .with_context(|| format!("{endpoint} request rejected"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse {endpoint} response"))?;
        Ok(payload.results)
    }

    /// Fetch the hot keywords, flattened from the keyed payload and ordered
    /// by value descending.
    pub async fn hot_keywords(&self) -> Result<Vec<Keyword>> {
        let url = format!("{}/lda/hot-keywords", self.base_url);
        let payload: RankedPayload<HashMap<String, Keyword>> = self
            .http
            .get(&url)
            .send()
            .await
            .context("Failed to fetch hot keywords")?
            .error_for_status()
            .context("Hot keywords request rejected")?
            .json()
            .await
            .context("Failed to parse hot keywords response")?;

        let mut keywords: Vec<Keyword> = payload.results.into_values().collect();
        keywords.sort_by(|a, b| b.value.total_cmp(&a.value));
        Ok(keywords)
    }
}
