//! The recommendation produced for a dilemma and its supporting links.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A titled web link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub title: String,
    pub uri: String,
}

impl Link {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Supplementary text and links attached to a decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_links: Option<Vec<Link>>,
}

/// A structured recommendation.
///
/// Regeneration replaces the whole value; fields are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionData {
    pub decision: String,
    pub reasoning: String,
    pub decision_strength: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<AdditionalInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pros: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cons: Option<Vec<String>>,
}

impl DecisionData {
    /// Links attached to the decision, empty when there are none.
    pub fn links(&self) -> &[Link] {
        self.additional_info
            .as_ref()
            .and_then(|info| info.source_links.as_deref())
            .unwrap_or(&[])
    }
}

/// Where the links of a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkProvenance {
    /// Search citations plus at least one curated link not among them.
    SearchAndCurated,
    SearchOnly,
    CuratedOnly,
}

impl LinkProvenance {
    /// Short Korean caption shown above the link list.
    pub fn label(&self) -> &'static str {
        match self {
            LinkProvenance::SearchAndCurated => {
                "다음은 결정과 관련된 웹 검색 결과 및 추천 자료입니다 (한국어):"
            }
            LinkProvenance::SearchOnly => "다음은 결정과 관련된 웹 검색 결과입니다 (한국어):",
            LinkProvenance::CuratedOnly => {
                "다음은 결정을 뒷받침하는 추천 자료 및 정보입니다 (한국어):"
            }
        }
    }
}

/// Merges search citations with model-curated links.
///
/// Citations come first, then curated links; a uri appears once, keeping the
/// first occurrence. Returns `None` when no link survives.
pub fn merge_links(citations: Vec<Link>, curated: Vec<Link>) -> Option<AdditionalInfo> {
    let citation_uris: HashSet<String> = citations.iter().map(|l| l.uri.clone()).collect();
    let has_new_curated = curated.iter().any(|l| !citation_uris.contains(&l.uri));
    let provenance = match (citations.is_empty(), curated.is_empty()) {
        (false, _) if has_new_curated => LinkProvenance::SearchAndCurated,
        (false, _) => LinkProvenance::SearchOnly,
        (true, false) => LinkProvenance::CuratedOnly,
        (true, true) => return None,
    };

    let mut seen = HashSet::new();
    let merged: Vec<Link> = citations
        .into_iter()
        .chain(curated)
        .filter(|link| !link.uri.is_empty() && seen.insert(link.uri.clone()))
        .collect();

    if merged.is_empty() {
        return None;
    }

    Some(AdditionalInfo {
        text: Some(provenance.label().to_string()),
        source_links: Some(merged),
    })
}
