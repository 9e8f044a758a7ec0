//! ClinicalTrials.gov v2 study collector.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};
use trialscope_core::{Outcome, RawTrialRecord};

use crate::CollectError;
use crate::http::{REQUEST_TIMEOUT, get_text};

pub const STUDIES_URL: &str = "https://clinicaltrials.gov/api/v2/studies";

/// Largest page the API serves.
pub const MAX_PAGE_SIZE: usize = 1000;

pub const CANCER_CONDITION_QUERY: &str =
    "cancer OR neoplasm OR carcinoma OR tumor OR malignancy";

/// Statuses with a resolved outcome.
pub const RESOLVED_STATUS_FILTER: &str =
    "COMPLETED,TERMINATED,WITHDRAWN,SUSPENDED,ACTIVE_NOT_RECRUITING";

pub const STUDY_FIELDS: &str = "NCTId,BriefTitle,OfficialTitle,OverallStatus,Phase,\
EnrollmentCount,EnrollmentType,StartDate,CompletionDate,StudyType,DesignAllocation,\
DesignInterventionModel,DesignMasking,DesignPrimaryPurpose,LeadSponsorName,LeadSponsorClass,\
InterventionType,InterventionName,Condition,BriefSummary,HasResults";

/// What to collect and how politely.
#[derive(Debug, Clone)]
pub struct TrialQuery {
    pub condition: String,
    pub statuses: String,
    /// Restrict returned fields; `None` returns full records.
    pub fields: Option<String>,
    pub max_trials: usize,
    pub page_size: usize,
    /// Pause between successive pages.
    pub page_delay: Duration,
    /// Fixed pause before retrying a failed request.
    pub retry_delay: Duration,
    /// `None` retries retryable failures indefinitely.
    pub max_retries: Option<u32>,
    pub timeout: Duration,
}

impl Default for TrialQuery {
    fn default() -> Self {
        Self {
            condition: CANCER_CONDITION_QUERY.to_string(),
            statuses: RESOLVED_STATUS_FILTER.to_string(),
            fields: Some(STUDY_FIELDS.to_string()),
            max_trials: 10_000,
            page_size: 100,
            page_delay: Duration::from_millis(500),
            retry_delay: Duration::from_secs(5),
            max_retries: None,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl TrialQuery {
    fn page_params(&self, page_token: Option<&str>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query.cond", self.condition.clone()),
            ("filter.overallStatus", self.statuses.clone()),
            ("pageSize", self.page_size.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("format", "json".to_string()),
        ];
        if let Some(fields) = &self.fields {
            params.push(("fields", fields.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct StudiesPage {
    #[serde(default)]
    studies: Vec<Value>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Trials collected in one run, keyed (and deduplicated) by NCT identifier.
#[derive(Debug, Default)]
pub struct TrialCollection {
    pub trials: BTreeMap<String, RawTrialRecord>,
    pub pages: usize,
    /// Studies returned without an identifier.
    pub skipped: usize,
    /// Set when collection ended on an error rather than running out of pages
    /// or reaching the limit.
    pub stopped_by: Option<String>,
}

impl TrialCollection {
    /// Insert or replace a study by identifier. Returns `false` if it has none.
    pub fn upsert(&mut self, record: RawTrialRecord) -> bool {
        match record.nct_id().map(str::to_owned) {
            Some(id) => {
                self.trials.insert(id, record);
                true
            }
            None => {
                self.skipped += 1;
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Most common overall statuses.
    pub fn top_statuses(&self, n: usize) -> Vec<(String, usize)> {
        top_counts(
            self.trials
                .values()
                .map(|t| t.overall_status().unwrap_or("(missing)")),
            n,
        )
    }

    /// Most common first-listed phases.
    pub fn top_phases(&self, n: usize) -> Vec<(String, usize)> {
        top_counts(
            self.trials.values().map(|t| t.first_phase().unwrap_or("N/A")),
            n,
        )
    }

    /// Trials whose status resolves to a completion label.
    pub fn resolved_outcomes(&self) -> usize {
        self.trials
            .values()
            .filter(|t| Outcome::classify(t.overall_status().unwrap_or("")) != Outcome::Unresolved)
            .count()
    }
}

fn top_counts<'a>(values: impl Iterator<Item = &'a str>, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, c)| (k.to_string(), c))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out.truncate(n);
    out
}

/// Client for the ClinicalTrials.gov study search endpoint.
pub struct ClinicalTrialsClient {
    client: reqwest::Client,
    url: String,
}

impl Default for ClinicalTrialsClient {
    fn default() -> Self {
        Self::new(STUDIES_URL.to_string())
    }
}

impl ClinicalTrialsClient {
    /// `url` is the full studies endpoint, e.g. [`STUDIES_URL`].
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_page(
        &self,
        query: &TrialQuery,
        page_token: Option<&str>,
    ) -> Result<StudiesPage, CollectError> {
        let body = get_text(
            &self.client,
            &self.url,
            &query.page_params(page_token),
            query.timeout,
        )
        .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Page through matching studies until the limit is reached or pages run
    /// out. Retryable failures are retried after a fixed delay; any other
    /// failure ends collection with whatever was gathered so far.
    pub async fn collect(&self, query: &TrialQuery) -> TrialCollection {
        let mut out = TrialCollection::default();
        let mut page_token: Option<String> = None;
        let mut retries = 0u32;

        info!(
            url = %self.url,
            condition = %query.condition,
            max_trials = query.max_trials,
            "collecting trials"
        );

        while out.len() < query.max_trials {
            let page = match self.fetch_page(query, page_token.as_deref()).await {
                Ok(page) => page,
                Err(e) if e.is_retryable() => {
                    retries += 1;
                    if query.max_retries.is_some_and(|max| retries > max) {
                        warn!(error = %e, retries, "giving up after repeated failures");
                        out.stopped_by = Some(e.to_string());
                        break;
                    }
                    warn!(error = %e, delay = ?query.retry_delay, "request failed, retrying");
                    tokio::time::sleep(query.retry_delay).await;
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "stopping collection");
                    out.stopped_by = Some(e.to_string());
                    break;
                }
            };
            retries = 0;
            out.pages += 1;

            for study in page.studies {
                out.upsert(RawTrialRecord::new(study));
                if out.len() >= query.max_trials {
                    break;
                }
            }
            info!(collected = out.len(), pages = out.pages, "collected page");

            match page.next_page_token {
                Some(token) if out.len() < query.max_trials => {
                    page_token = Some(token);
                    tokio::time::sleep(query.page_delay).await;
                }
                _ => break,
            }
        }

        info!(
            total = out.len(),
            skipped = out.skipped,
            pages = out.pages,
            "trial collection finished"
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing;
    use serde_json::json;

    fn study(id: &str, status: &str, phase: Option<&str>) -> RawTrialRecord {
        let phases: Vec<&str> = phase.into_iter().collect();
        RawTrialRecord::new(json!({
            "protocolSection": {
                "identificationModule": {"nctId": id},
                "statusModule": {"overallStatus": status},
                "designModule": {"phases": phases}
            }
        }))
    }

    #[test]
    fn page_params_include_token_and_clamp_page_size() {
        let query = TrialQuery {
            page_size: 5000,
            ..Default::default()
        };
        let params = query.page_params(Some("abc"));
        assert!(params.contains(&("pageSize", "1000".to_string())));
        assert!(params.contains(&("pageToken", "abc".to_string())));
        assert!(params.contains(&("filter.overallStatus", RESOLVED_STATUS_FILTER.to_string())));

        let first = TrialQuery {
            fields: None,
            ..Default::default()
        }
        .page_params(None);
        assert!(first.iter().all(|(k, _)| *k != "pageToken" && *k != "fields"));
    }

    #[test]
    fn studies_page_parses_with_and_without_token() {
        let page: StudiesPage = serde_json::from_value(json!({
            "studies": [{"protocolSection": {}}],
            "nextPageToken": "NF0g5JOBlA"
        }))
        .unwrap();
        assert_eq!(page.studies.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("NF0g5JOBlA"));

        let last: StudiesPage = serde_json::from_value(json!({})).unwrap();
        assert!(last.studies.is_empty());
        assert!(last.next_page_token.is_none());
    }

    #[test]
    fn upsert_deduplicates_by_identifier() {
        let mut c = TrialCollection::default();
        assert!(c.upsert(study("NCT1", "RECRUITING", None)));
        assert!(c.upsert(study("NCT2", "COMPLETED", Some("PHASE2"))));
        assert!(c.upsert(study("NCT1", "COMPLETED", Some("PHASE3"))));
        assert!(!c.upsert(RawTrialRecord::new(json!({"protocolSection": {}}))));

        assert_eq!(c.len(), 2);
        assert_eq!(c.skipped, 1);
        assert_eq!(c.trials["NCT1"].overall_status(), Some("COMPLETED"));
    }

    #[test]
    fn collection_summaries() {
        let mut c = TrialCollection::default();
        c.upsert(study("NCT1", "COMPLETED", Some("PHASE2")));
        c.upsert(study("NCT2", "COMPLETED", Some("PHASE2")));
        c.upsert(study("NCT3", "TERMINATED", None));
        c.upsert(study("NCT4", "RECRUITING", Some("PHASE1")));

        assert_eq!(c.top_statuses(1), vec![("COMPLETED".to_string(), 2)]);
        assert_eq!(
            c.top_phases(5),
            vec![
                ("PHASE2".to_string(), 2),
                ("N/A".to_string(), 1),
                ("PHASE1".to_string(), 1),
            ]
        );
        assert_eq!(c.resolved_outcomes(), 3);
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = ClinicalTrialsClient::new("http://localhost:8080/api/v2/studies/".into());
        assert_eq!(client.url, "http://localhost:8080/api/v2/studies");
    }

    fn fast_query() -> TrialQuery {
        TrialQuery {
            page_delay: Duration::from_millis(1),
            retry_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> String {
        let studies: Vec<Value> = ids
            .iter()
            .map(|id| study(id, "COMPLETED", Some("PHASE2")).into_value())
            .collect();
        json!({"studies": studies, "nextPageToken": next}).to_string()
    }

    #[tokio::test]
    async fn unreachable_endpoint_stops_after_retry_cap() {
        let client = ClinicalTrialsClient::new("http://127.0.0.1:1/api/v2/studies".into());
        let query = TrialQuery {
            max_retries: Some(2),
            ..fast_query()
        };
        let c = client.collect(&query).await;
        assert!(c.is_empty());
        assert_eq!(c.pages, 0);
        assert!(c.stopped_by.is_some());
    }

    #[tokio::test]
    async fn follows_page_tokens_until_exhausted() {
        let (url, server) = testing::serve(
            "/api/v2/studies",
            vec![
                (200, page(&["NCT1", "NCT2"], Some("tok2"))),
                (200, page(&["NCT2", "NCT3"], None)),
            ],
        )
        .await;
        let c = ClinicalTrialsClient::new(url).collect(&fast_query()).await;
        let requests = server.await.unwrap();

        assert_eq!(c.len(), 3);
        assert_eq!(c.pages, 2);
        assert!(c.stopped_by.is_none());
        assert!(!requests[0].contains("pageToken"));
        assert!(requests[1].contains("pageToken=tok2"));
    }

    #[tokio::test]
    async fn stops_at_max_trials_without_next_request() {
        let (url, server) = testing::serve(
            "/api/v2/studies",
            vec![(200, page(&["NCT1", "NCT2", "NCT3"], Some("tok2")))],
        )
        .await;
        let query = TrialQuery {
            max_trials: 2,
            ..fast_query()
        };
        let c = ClinicalTrialsClient::new(url).collect(&query).await;

        assert_eq!(c.len(), 2);
        assert_eq!(c.pages, 1);
        assert!(c.stopped_by.is_none());
        assert_eq!(server.await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn server_error_is_retried() {
        let (url, server) = testing::serve(
            "/api/v2/studies",
            vec![(503, "busy".to_string()), (200, page(&["NCT1"], None))],
        )
        .await;
        let c = ClinicalTrialsClient::new(url).collect(&fast_query()).await;

        assert_eq!(c.len(), 1);
        assert_eq!(c.pages, 1);
        assert!(c.stopped_by.is_none());
        assert_eq!(server.await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn malformed_page_stops_without_retry() {
        let (url, server) =
            testing::serve("/api/v2/studies", vec![(200, "not json".to_string())]).await;
        let query = TrialQuery {
            max_retries: Some(3),
            ..fast_query()
        };
        let c = ClinicalTrialsClient::new(url).collect(&query).await;

        assert!(c.is_empty());
        assert!(c.stopped_by.unwrap().starts_with("JSON parse error"));
        assert_eq!(server.await.unwrap().len(), 1);
    }
}
