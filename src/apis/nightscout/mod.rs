/// Nightscout REST client for treatments
///
/// Endpoints implemented:
/// 1. GET    /api/v1/treatments.json   - filtered lookup and range pages
/// 2. PUT    /api/v1/treatments/{id}   - in-place update
/// 3. DELETE /api/v1/treatments/{id}   - delete one record
/// 4. POST   /api/v1/treatments.json   - insert a list of records
///
/// Authentication is optional: an `api-secret` header carrying the hex SHA-1
/// of the shared secret, and/or a `token` query parameter.
use crate::apis::client::HttpClient;
use crate::config::NightscoutConfig;
use crate::errors::{BridgeError, StoreError};
use crate::logger::{self, LogTag};
use crate::treatments::{Patch, RangePage, StoreReply, Treatment, TreatmentStore};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use sha1::{Digest, Sha1};
use url::Url;

// ============================================================================
// API CONFIGURATION
// ============================================================================

const TREATMENTS_PATH: &str = "/api/v1/treatments.json";
const TREATMENT_PATH: &str = "/api/v1/treatments";
const TREATMENTS_SEGMENTS: [&str; 3] = ["api", "v1", "treatments.json"];
const TREATMENT_SEGMENTS: [&str; 3] = ["api", "v1", "treatments"];

const API_SECRET_HEADER: &str = "api-secret";
const TOKEN_PARAM: &str = "token";

// ============================================================================
// CLIENT IMPLEMENTATION
// ============================================================================

pub struct NightscoutClient {
    http_client: HttpClient,
    base_url: Url,
    token: Option<String>,
    api_secret_hash: Option<String>,
}

impl NightscoutClient {
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        api_secret: Option<&str>,
        connect_timeout_secs: u64,
        timeout_secs: u64,
    ) -> Result<Self, BridgeError> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(BridgeError::configuration("NS_URL is not configured"));
        }
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https") && !u.cannot_be_a_base())
            .ok_or_else(|| BridgeError::configuration("NS_URL is not a valid http(s) URL"))?;

        Ok(Self {
            http_client: HttpClient::new(connect_timeout_secs, timeout_secs)?,
            base_url,
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
            api_secret_hash: api_secret.filter(|s| !s.is_empty()).map(hash_api_secret),
        })
    }

    pub fn from_config(config: &NightscoutConfig) -> Result<Self, BridgeError> {
        Self::new(
            &config.url,
            config.token.as_deref(),
            config.api_secret.as_deref(),
            config.connect_timeout_secs,
            config.request_timeout_secs,
        )
    }

    /// Request with authentication applied
    ///
    /// Each segment is appended to the base path percent-encoded, so an id
    /// holding `/`, `?` or `#` stays a single segment.
    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        let mut builder = self.http_client.client().request(method, url);
        if let Some(token) = &self.token {
            builder = builder.query(&[(TOKEN_PARAM, token.as_str())]);
        }
        if let Some(hash) = &self.api_secret_hash {
            builder = builder.header(API_SECRET_HEADER, hash.as_str());
        }
        builder
    }

    /// Send and map any non-2xx status to a [`StoreError`]
    async fn execute(&self, endpoint: &str, builder: RequestBuilder) -> Result<StoreReply, StoreError> {
        logger::debug(LogTag::Store, &format!("{} →", endpoint));

        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::from_reqwest(endpoint, e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::from_reqwest(endpoint, e))?;

        if !status.is_success() {
            let err = StoreError::from_status(endpoint, status.as_u16(), &body);
            logger::debug(LogTag::Store, &format!("{}", err));
            return Err(err);
        }

        logger::debug(
            LogTag::Store,
            &format!("{} ← HTTP {} ({} bytes)", endpoint, status.as_u16(), body.len()),
        );
        Ok(StoreReply {
            status: status.as_u16(),
            body,
            content_type,
        })
    }

    async fn find_one(&self, field: &str, value: &str) -> Result<Option<Treatment>, StoreError> {
        let endpoint = format!("GET {}", TREATMENTS_PATH);
        let builder = self
            .request(Method::GET, &TREATMENTS_SEGMENTS)
            .query(&lookup_query(field, value));
        let reply = self.execute(&endpoint, builder).await?;
        Ok(parse_treatments(&endpoint, &reply.body)?.into_iter().next())
    }
}

#[async_trait]
impl TreatmentStore for NightscoutClient {
    async fn find_by_id(&self, id: &str) -> Result<Option<Treatment>, StoreError> {
        self.find_one("_id", id).await
    }

    async fn find_by_client_id(&self, client_id: &str) -> Result<Option<Treatment>, StoreError> {
        self.find_one("clientId", client_id).await
    }

    async fn modify(&self, id: &str, patch: &Patch) -> Result<StoreReply, StoreError> {
        let endpoint = format!("PUT {}/{}", TREATMENT_PATH, id);
        let builder = self
            .request(Method::PUT, &treatment_segments(id))
            .json(&patch.to_value());
        self.execute(&endpoint, builder).await
    }

    async fn delete(&self, id: &str) -> Result<StoreReply, StoreError> {
        let endpoint = format!("DELETE {}/{}", TREATMENT_PATH, id);
        self.execute(&endpoint, self.request(Method::DELETE, &treatment_segments(id)))
            .await
    }

    async fn insert(&self, documents: &[Treatment]) -> Result<StoreReply, StoreError> {
        let endpoint = format!("POST {}", TREATMENTS_PATH);
        let builder = self
            .request(Method::POST, &TREATMENTS_SEGMENTS)
            .json(documents);
        self.execute(&endpoint, builder).await
    }

    async fn fetch_page(&self, page: &RangePage) -> Result<Vec<Treatment>, StoreError> {
        let endpoint = format!("GET {}", TREATMENTS_PATH);
        let builder = self
            .request(Method::GET, &TREATMENTS_SEGMENTS)
            .query(&page_query(page));
        let reply = self.execute(&endpoint, builder).await?;
        parse_treatments(&endpoint, &reply.body)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Hex SHA-1 digest Nightscout expects in the `api-secret` header
pub fn hash_api_secret(secret: &str) -> String {
    hex::encode(Sha1::digest(secret.as_bytes()))
}

fn treatment_segments(id: &str) -> Vec<&str> {
    let mut segments = TREATMENT_SEGMENTS.to_vec();
    segments.push(id);
    segments
}

fn lookup_query(field: &str, value: &str) -> Vec<(String, String)> {
    vec![
        (format!("find[{}]", field), value.to_string()),
        ("count".to_string(), "1".to_string()),
    ]
}

fn page_query(page: &RangePage) -> Vec<(String, String)> {
    let upper = if page.end_inclusive { "$lte" } else { "$lt" };
    vec![
        ("find[created_at][$gte]".to_string(), format_timestamp(page.start)),
        (format!("find[created_at][{}]", upper), format_timestamp(page.end)),
        ("count".to_string(), page.count.to_string()),
    ]
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Decode a JSON list of treatments; non-object entries are skipped
fn parse_treatments(endpoint: &str, body: &str) -> Result<Vec<Treatment>, StoreError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let items: Vec<Value> = serde_json::from_str(body).map_err(|e| StoreError::Decode {
        endpoint: endpoint.to_string(),
        message: format!("expected a JSON list: {}", e),
    })?;
    Ok(items.into_iter().filter_map(Treatment::from_value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn client(token: Option<&str>, secret: Option<&str>) -> NightscoutClient {
        NightscoutClient::new("https://ns.example.com/", token, secret, 5, 10).unwrap()
    }

    #[test]
    fn test_api_secret_hash() {
        assert_eq!(
            hash_api_secret("secret"),
            "e5e9fa1ba31ecd1ae84f75caaa474f3a663f05f4"
        );
    }

    #[test]
    fn test_auth_is_applied_independently() {
        let request = client(Some("tok-1"), Some("secret"))
            .request(Method::GET, &TREATMENTS_SEGMENTS)
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://ns.example.com/api/v1/treatments.json?token=tok-1"
        );
        assert_eq!(
            request.headers().get(API_SECRET_HEADER).unwrap(),
            "e5e9fa1ba31ecd1ae84f75caaa474f3a663f05f4"
        );

        let request = client(None, None)
            .request(Method::GET, &TREATMENTS_SEGMENTS)
            .build()
            .unwrap();
        assert_eq!(request.url().query(), None);
        assert!(request.headers().get(API_SECRET_HEADER).is_none());
    }

    #[test]
    fn test_page_query() {
        let page = RangePage {
            start: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap(),
            end_inclusive: false,
            count: 200,
        };
        let pairs = |page: &RangePage| -> Vec<(String, String)> {
            client(None, None)
                .request(Method::GET, &TREATMENTS_SEGMENTS)
                .query(&page_query(page))
                .build()
                .unwrap()
                .url()
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        };
        assert_eq!(
            pairs(&page),
            vec![
                ("find[created_at][$gte]".to_string(), "2024-03-01T00:00:00.000Z".to_string()),
                ("find[created_at][$lt]".to_string(), "2024-03-02T00:00:00.000Z".to_string()),
                ("count".to_string(), "200".to_string()),
            ]
        );

        let cursor_page = RangePage {
            end_inclusive: true,
            ..page
        };
        assert_eq!(
            pairs(&cursor_page)[1],
            ("find[created_at][$lte]".to_string(), "2024-03-02T00:00:00.000Z".to_string())
        );
    }

    #[test]
    fn test_parse_treatments() {
        let parsed = parse_treatments("GET x", r#"[{"_id":"A"}, 5, {"_id":"B"}]"#).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].id(), Some("B"));

        assert!(parse_treatments("GET x", "").unwrap().is_empty());
        assert!(matches!(
            parse_treatments("GET x", r#"{"error":1}"#),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(NightscoutClient::new("", None, None, 5, 10).is_err());
        assert!(NightscoutClient::new("ns.example.com", None, None, 5, 10).is_err());
        assert!(NightscoutClient::new("ftp://ns.example.com", None, None, 5, 10).is_err());
    }

    #[test]
    fn test_id_is_one_encoded_segment() {
        let request = client(None, None)
            .request(Method::PUT, &treatment_segments("a/b?c#d e"))
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://ns.example.com/api/v1/treatments/a%2Fb%3Fc%23d%20e"
        );
        assert_eq!(request.url().query(), None);
        assert_eq!(request.url().fragment(), None);
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = NightscoutClient::new("https://host.example.com/ns/", None, None, 5, 10).unwrap();
        let request = client
            .request(Method::DELETE, &treatment_segments("65f0c1"))
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://host.example.com/ns/api/v1/treatments/65f0c1"
        );
    }
}
