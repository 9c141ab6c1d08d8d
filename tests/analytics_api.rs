use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trendchat::{AnalyticsClient, Config, TimeRange};

fn client_for(server: &MockServer) -> AnalyticsClient {
    AnalyticsClient::new(&Config {
        base_url: server.uri(),
        ..Config::default()
    })
}

#[tokio::test]
async fn topic_trends_maps_chart_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lda/topic-trends/"))
        .and(query_param("month", "4"))
        .and(query_param("year", "2025"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "date": "01/04", "fullDate": "2025-04-01", "Politics": 12, "Economics": 7 },
                { "date": "02/04", "fullDate": "2025-04-02", "Politics": 9, "Economics": 11 }
            ],
            "topics": ["Politics", "Economics"],
            "keywords": {
                "Politics": [
                    { "text": "election", "value": 42.0, "category": "Politics" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let report = client_for(&server)
        .topic_trends(TimeRange::Month {
            month: 4,
            year: 2025,
        })
        .await
        .unwrap();

    assert_eq!(report.topics, vec!["Politics", "Economics"]);
    assert_eq!(report.data.len(), 2);
    assert_eq!(report.data[0].date, "01/04");
    assert_eq!(report.data[0].full_date.as_deref(), Some("2025-04-01"));
    assert_eq!(report.data[0].values["Politics"], serde_json::json!(12));
    assert_eq!(report.keywords["Politics"][0].text, "election");
}

#[tokio::test]
async fn popular_topics_unwrap_the_results_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lda/popular-topics-today/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                { "topic": "Artificial Intelligence", "category": "Technology",
                  "growth": "+45%", "articles": 250 },
                { "topic": "Global Economy", "category": "Economics",
                  "growth": "+38%", "articles": 180 }
            ]
        })))
        .mount(&server)
        .await;

    let topics = client_for(&server).popular_topics_today().await.unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[0].topic, "Artificial Intelligence");
    assert_eq!(topics[0].growth.as_deref(), Some("+45%"));
    assert_eq!(topics[1].articles, 180);
}

#[tokio::test]
async fn hot_keywords_flatten_to_a_ranked_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lda/hot-keywords"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": {
                "0": { "text": "lạm phát", "value": 10.0, "category": "Economics" },
                "1": { "text": "AI", "value": 30.0, "category": "Technology" },
                "2": { "text": "vaccine", "value": 20.0, "category": "Health" }
            }
        })))
        .mount(&server)
        .await;

    let keywords = client_for(&server).hot_keywords().await.unwrap();
    let texts: Vec<&str> = keywords.iter().map(|k| k.text.as_str()).collect();
    assert_eq!(texts, vec!["AI", "vaccine", "lạm phát"]);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lda/popular-topics-this-week/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server).popular_topics_this_week().await;
    assert!(result.is_err());
}
