// tests/common/mod.rs
// In-process mock of the three providers, served on an ephemeral port.
#![allow(dead_code)]

use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;

use signal_scout::config::{ConceptQueries, PipelineConfig};

/// Query the scholarly mock answers with HTTP 500.
pub const BROKEN_QUERY: &str = "broken query";
pub const GOOD_QUERY: &str = "prediction markets accuracy";
pub const SHARED_DOI: &str = "10.1257/0895330041371321";

/// Five classifiable markets, one sports market (no topic) and a repeat of m1.
pub fn market_fixture() -> Value {
    json!([
        {
            "id": "m1", "slug": "senate-budget",
            "question": "Will the Senate pass the budget bill?",
            "outcomes": "[\"Yes\", \"No\"]", "outcomePrices": "[\"0.5\", \"0.5\"]",
            "volume": "1000000", "volume24hr": 50000, "liquidity": "100000",
            "oneDayPriceChange": 0.10
        },
        {
            "id": "m2", "slug": "fed-june",
            "question": "Will the Fed cut interest rates in June?",
            "outcomes": "[\"Yes\", \"No\"]", "outcomePrices": "[\"0.9\", \"0.1\"]",
            "volume": 20000000, "volume24hr": 5000, "liquidity": 200000,
            "oneDayPriceChange": 0.0
        },
        {
            "id": "m3", "slug": "trump-eo-tariffs",
            "question": "Will Trump sign an executive order on tariffs?",
            "outcomes": "[\"Yes\", \"No\"]", "outcomePrices": "[\"0.35\", \"0.65\"]",
            "volume": 300000, "volume24hr": 90000, "liquidity": 60000,
            "oneDayPriceChange": -0.25
        },
        {
            "id": "m4", "slug": "inflation-4",
            "question": "Will inflation exceed 4% in 2026?"
        },
        {
            "id": "m5", "slug": "btc-150k",
            "question": "Will Bitcoin close above $150k this year?",
            "outcomes": "[\"Yes\", \"No\"]", "outcomePrices": "[\"0.2\", \"0.8\"]",
            "volume": 5000, "volume24hr": 4000, "liquidity": 1000,
            "oneDayPriceChange": 0.02
        },
        {
            "id": "m6", "slug": "super-bowl",
            "question": "Who wins the Super Bowl?",
            "volume": 9000000, "volume24hr": 800000, "liquidity": 500000
        },
        {
            "id": "m1", "slug": "senate-budget",
            "question": "Will the Senate pass the budget bill? (relisted)",
            "volume": 1, "volume24hr": 1, "liquidity": 1
        }
    ])
}

fn semantic_scholar_fixture() -> Value {
    json!({
        "total": 2,
        "data": [
            {
                "paperId": "ss1",
                "title": "Prediction Markets as Forecasting Tools",
                "year": 2021,
                "citationCount": 120,
                "authors": [{"name": "Justin Wolfers"}, {"name": "Eric Zitzewitz"}],
                "venue": "Journal of Economic Perspectives",
                "abstract": "We survey <i>prediction</i> markets.",
                "externalIds": {"DOI": SHARED_DOI}
            },
            {
                "paperId": "ss2",
                "title": "Polls versus Markets",
                "year": 2024,
                "citationCount": 3,
                "authors": [{"name": "A. Author"}],
                "venue": "",
                "abstract": null,
                "externalIds": {}
            }
        ]
    })
}

fn scopus_fixture() -> Value {
    json!({
        "search-results": {
            "opensearch:totalResults": "2",
            "entry": [
                {
                    "dc:identifier": "SCOPUS_ID:1",
                    "dc:title": "Prediction Markets",
                    "dc:creator": "Wolfers J.",
                    "prism:coverDate": "2004-06-01",
                    "prism:publicationName": "Journal of Economic Perspectives",
                    "citedby-count": "1500",
                    "prism:doi": SHARED_DOI.to_uppercase()
                },
                {
                    "dc:title": "Betting Markets and Elections",
                    "dc:creator": "Rhode P.",
                    "prism:coverDate": "2023-01-01",
                    "citedby-count": "60"
                }
            ]
        }
    })
}

async fn markets() -> Json<Value> {
    Json(market_fixture())
}

async fn semantic_scholar(headers: HeaderMap, Query(q): Query<HashMap<String, String>>) -> Response {
    if headers.get("x-api-key").is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match q.get("query").map(String::as_str) {
        Some(BROKEN_QUERY) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => Json(semantic_scholar_fixture()).into_response(),
    }
}

async fn scopus(headers: HeaderMap) -> Response {
    if headers.get("x-els-apikey").is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(scopus_fixture()).into_response()
}

pub fn mock_router() -> Router {
    Router::new()
        .route("/markets", get(markets))
        .route("/graph/v1/paper/search", get(semantic_scholar))
        .route("/content/search/scopus", get(scopus))
}

/// Serve `router` on 127.0.0.1:0 and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock");
    let addr = listener.local_addr().expect("mock addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server");
    });
    format!("http://{addr}")
}

/// Default config pointed at `base`, unpaced, with one concept of two queries
/// (the first one fails) and a fixed recency pivot.
pub fn test_config(base: &str) -> PipelineConfig {
    let mut cfg = PipelineConfig::default();
    for p in [
        &mut cfg.providers.polymarket,
        &mut cfg.providers.semantic_scholar,
        &mut cfg.providers.scopus,
    ] {
        p.base_url = base.to_string();
        p.pacing_ms = 0;
    }
    cfg.fetch.timeout_secs = 5;
    cfg.papers.concepts = vec![ConceptQueries {
        name: "prediction_markets".into(),
        queries: vec![BROKEN_QUERY.into(), GOOD_QUERY.into()],
    }];
    cfg.scoring.paper.recency_pivot_year = 2026;
    cfg
}
