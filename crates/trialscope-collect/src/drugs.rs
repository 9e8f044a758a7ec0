//! openFDA approved-drug collector.
//!
//! Produces the name-keyed mapping that enrichment reads back as its
//! reference set: keys are lowercase generic names.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::CollectError;
use crate::http::{REQUEST_TIMEOUT, get_text};

pub const DRUGSFDA_URL: &str = "https://api.fda.gov/drug/drugsfda.json";

pub const CANCER_KEYWORDS: &[&str] = &[
    "cancer",
    "carcinoma",
    "neoplasm",
    "tumor",
    "malignancy",
    "leukemia",
    "lymphoma",
    "myeloma",
    "sarcoma",
    "melanoma",
    "chemotherapy",
    "antineoplastic",
    "oncology",
];

/// Common oncology drugs merged in after collection, as (key, generic name, category).
pub const MANUAL_DRUGS: &[(&str, &str, &str)] = &[
    ("doxorubicin", "Doxorubicin", "Chemotherapy"),
    ("cisplatin", "Cisplatin", "Chemotherapy"),
    ("paclitaxel", "Paclitaxel", "Chemotherapy"),
    ("carboplatin", "Carboplatin", "Chemotherapy"),
    ("fluorouracil", "Fluorouracil", "Chemotherapy"),
    ("5-fu", "5-Fluorouracil", "Chemotherapy"),
    ("gemcitabine", "Gemcitabine", "Chemotherapy"),
    ("docetaxel", "Docetaxel", "Chemotherapy"),
    ("cyclophosphamide", "Cyclophosphamide", "Chemotherapy"),
    ("methotrexate", "Methotrexate", "Chemotherapy"),
    ("imatinib", "Imatinib", "Targeted therapy"),
    ("erlotinib", "Erlotinib", "Targeted therapy"),
    ("gefitinib", "Gefitinib", "Targeted therapy"),
    ("sunitinib", "Sunitinib", "Targeted therapy"),
    ("sorafenib", "Sorafenib", "Targeted therapy"),
    ("vemurafenib", "Vemurafenib", "Targeted therapy"),
    ("dabrafenib", "Dabrafenib", "Targeted therapy"),
    ("trastuzumab", "Trastuzumab", "Targeted therapy (HER2)"),
    ("bevacizumab", "Bevacizumab", "Targeted therapy (VEGF)"),
    ("cetuximab", "Cetuximab", "Targeted therapy (EGFR)"),
    ("tamoxifen", "Tamoxifen", "Hormone therapy"),
    ("letrozole", "Letrozole", "Hormone therapy"),
    ("anastrozole", "Anastrozole", "Hormone therapy"),
    ("exemestane", "Exemestane", "Hormone therapy"),
    ("fulvestrant", "Fulvestrant", "Hormone therapy"),
    ("pembrolizumab", "Pembrolizumab", "Immunotherapy (PD-1)"),
    ("nivolumab", "Nivolumab", "Immunotherapy (PD-1)"),
    ("atezolizumab", "Atezolizumab", "Immunotherapy (PD-L1)"),
    ("durvalumab", "Durvalumab", "Immunotherapy (PD-L1)"),
    ("ipilimumab", "Ipilimumab", "Immunotherapy (CTLA-4)"),
];

#[derive(Debug, Clone)]
pub struct DrugQuery {
    pub keywords: Vec<String>,
    /// Results requested per keyword.
    pub limit: usize,
    /// Pause after each keyword search.
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for DrugQuery {
    fn default() -> Self {
        Self {
            keywords: CANCER_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            limit: 100,
            delay: Duration::from_millis(500),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Search expression for prescription drugs whose indication or
/// pharmacological class mentions `keyword`.
pub fn search_expression(keyword: &str) -> String {
    format!(
        "products.marketing_status:\"Prescription\" AND \
         (openfda.indication:\"{keyword}\" OR openfda.pharm_class_epc:\"{keyword}\")"
    )
}

/// One entry of the drug mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrugEntry {
    pub generic_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub brand_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indication: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pharm_class: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Drug mapping keyed by lowercase, trimmed generic name.
pub type DrugMap = BTreeMap<String, DrugEntry>;

// ── openFDA response shapes ──

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Application>,
}

#[derive(Debug, Default, Deserialize)]
struct Application {
    #[serde(default)]
    products: Vec<Product>,
    #[serde(default)]
    openfda: OpenFdaFields,
}

#[derive(Debug, Default, Deserialize)]
struct Product {
    marketing_status_date: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenFdaFields {
    #[serde(default)]
    generic_name: Vec<String>,
    #[serde(default)]
    brand_name: Vec<String>,
    #[serde(default)]
    indication: Vec<String>,
    #[serde(default)]
    pharm_class_epc: Vec<String>,
}

/// Fold one keyword's search results into `drugs`; existing keys are kept.
/// Returns the number of new entries.
fn merge_results(drugs: &mut DrugMap, response: SearchResponse, keyword: &str) -> usize {
    let mut added = 0;
    for app in response.results {
        let fda = &app.openfda;
        for product in &app.products {
            for generic in &fda.generic_name {
                let key = generic.trim().to_lowercase();
                if key.is_empty() || drugs.contains_key(&key) {
                    continue;
                }
                drugs.insert(
                    key,
                    DrugEntry {
                        generic_name: generic.clone(),
                        brand_names: fda.brand_name.clone(),
                        indication: fda.indication.first().cloned(),
                        pharm_class: fda.pharm_class_epc.clone(),
                        approval_date: product.marketing_status_date.clone(),
                        source_keyword: Some(keyword.to_string()),
                        category: None,
                    },
                );
                added += 1;
            }
        }
    }
    added
}

/// Merge [`MANUAL_DRUGS`] without overwriting collected entries. Returns the
/// number added.
pub fn add_manual_drugs(drugs: &mut DrugMap) -> usize {
    let mut added = 0;
    for (key, generic, category) in MANUAL_DRUGS {
        if !drugs.contains_key(*key) {
            drugs.insert(
                key.to_string(),
                DrugEntry {
                    generic_name: generic.to_string(),
                    category: Some(category.to_string()),
                    ..Default::default()
                },
            );
            added += 1;
        }
    }
    added
}

/// Client for the openFDA drugs@FDA endpoint.
pub struct OpenFdaClient {
    client: reqwest::Client,
    url: String,
}

impl Default for OpenFdaClient {
    fn default() -> Self {
        Self::new(DRUGSFDA_URL.to_string())
    }
}

impl OpenFdaClient {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    async fn search(&self, query: &DrugQuery, keyword: &str) -> Result<SearchResponse, CollectError> {
        let params = [
            ("search", search_expression(keyword)),
            ("limit", query.limit.to_string()),
        ];
        let body = get_text(&self.client, &self.url, &params, query.timeout).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Search every keyword in turn. A failed keyword is logged and skipped.
    pub async fn collect(&self, query: &DrugQuery) -> DrugMap {
        let mut drugs = DrugMap::new();
        for keyword in &query.keywords {
            match self.search(query, keyword).await {
                Ok(response) => {
                    let results = response.results.len();
                    let added = merge_results(&mut drugs, response, keyword);
                    info!(keyword = %keyword, results, added, "searched openFDA");
                }
                Err(e) => warn!(keyword = %keyword, error = %e, "openFDA search failed"),
            }
            tokio::time::sleep(query.delay).await;
        }
        info!(total = drugs.len(), "drug collection finished");
        drugs
    }
}
