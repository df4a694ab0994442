use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::criteria::CriterionKey;

// ── Request ───────────────────────────────────────────────────────────────────

/// A normalised ticker ready to be sent to the analysis backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub ticker: String,
}

impl AnalysisRequest {
    /// Trim and uppercase raw user input. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let ticker = raw.trim();
        if ticker.is_empty() {
            return None;
        }
        Some(Self {
            ticker: ticker.to_uppercase(),
        })
    }
}

// ── Analysis result ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "score_from_number")]
    pub score: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation: String,
    pub basic_data: AssetSnapshot,
    #[serde(default)]
    pub criteria_results: HashMap<String, CriterionOutcome>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub demo_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_message: Option<String>,
}

impl AnalysisResult {
    /// Criteria in display order: the nine known keys first, unknown keys
    /// after them sorted by name.
    pub fn ordered_criteria(&self) -> Vec<(&str, &CriterionOutcome)> {
        let mut known = Vec::new();
        let mut unknown = Vec::new();

        for (key, outcome) in &self.criteria_results {
            match key.parse::<CriterionKey>() {
                Ok(k) => known.push((k, key.as_str(), outcome)),
                Err(_) => unknown.push((key.as_str(), outcome)),
            }
        }

        known.sort_by_key(|(k, _, _)| *k);
        unknown.sort_by(|a, b| a.0.cmp(b.0));

        known
            .into_iter()
            .map(|(_, key, outcome)| (key, outcome))
            .chain(unknown)
            .collect()
    }

    pub fn criterion(&self, key: CriterionKey) -> Option<&CriterionOutcome> {
        self.criteria_results.get(key.as_str())
    }

    pub fn passed_count(&self) -> usize {
        self.criteria_results.values().filter(|c| c.passed).count()
    }

    /// Backend timestamp, accepted either naive (`2024-05-01T10:00:00.123456`)
    /// or with an offset.
    pub fn analysed_at(&self) -> Option<NaiveDateTime> {
        let raw = self.analysis_date.as_deref()?.trim();
        raw.parse::<NaiveDateTime>()
            .ok()
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_local()))
    }
}

// ── Asset snapshot ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub long_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: String,
    #[serde(default)]
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub regular_market_change: Option<f64>,
    #[serde(default)]
    pub regular_market_change_percent: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logourl: Option<String>,
}

// ── Criterion outcome ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CriterionOutcome {
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: bool,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

impl CriterionOutcome {
    /// The value only when it carries text; empty strings count as absent.
    pub fn display_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

// ── Auxiliary endpoints ───────────────────────────────────────────────────────

/// One entry from `/api/search/{query}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetHit {
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Body of `/api/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub token_status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub demo_mode: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Error envelope the backend returns alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

// ── Serde helpers ─────────────────────────────────────────────────────────────

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The backend reports `passed / total * 100` rounded to two decimals.
fn score_from_number<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom(format!("score is not finite: {}", raw)));
    }
    Ok(raw.round().clamp(0.0, 100.0) as u8)
}
