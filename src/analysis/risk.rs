// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Rule-based risk scoring over aggregated findings.
//!
//! Conservative heuristic, not a statistical model: ties always
//! resolve toward the higher-severity label. Rules are applied in a
//! single fixed order so overlapping conditions stay deterministic.

use serde::{Deserialize, Serialize};

use super::AggregatedAnalysis;

/// Severity labels under the total order green < yellow < red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub overall: RiskLevel,
    pub regulatory: RiskLevel,
    pub transparency: RiskLevel,
    pub user_rights: RiskLevel,
}

impl RiskAssessment {
    pub fn from_axes(regulatory: RiskLevel, transparency: RiskLevel, user_rights: RiskLevel) -> Self {
        Self {
            overall: regulatory.max(transparency).max(user_rights),
            regulatory,
            transparency,
            user_rights,
        }
    }
}

/// Score an aggregated analysis. Precedence:
/// 1. GDPR/CCPA compliance tags across all per-chunk findings set the
///    regulatory axis.
/// 2. Any red flag anywhere forces regulatory to red and transparency
///    to yellow; with no red flags transparency is green.
/// 3. User rights is yellow when no finding mentions any right.
/// 4. Overall is the maximum of the three axes.
pub fn score(analysis: &AggregatedAnalysis) -> RiskAssessment {
    let mut regulatory = RiskLevel::Green;
    for finding in &analysis.per_chunk_findings {
        for (tag, value) in &finding.compliance_tags {
            if !is_regulation_tag(tag) {
                continue;
            }
            match value.trim().to_lowercase().as_str() {
                "non-compliant" => regulatory = RiskLevel::Red,
                "partially" => regulatory = regulatory.max(RiskLevel::Yellow),
                _ => {}
            }
        }
    }

    let has_red_flags = analysis
        .per_chunk_findings
        .iter()
        .any(|f| !f.red_flags.is_empty());

    let transparency = if has_red_flags {
        regulatory = RiskLevel::Red;
        RiskLevel::Yellow
    } else {
        RiskLevel::Green
    };

    let mentions_rights = analysis
        .per_chunk_findings
        .iter()
        .any(|f| !f.mentioned_rights.is_empty());
    let user_rights = if mentions_rights {
        RiskLevel::Green
    } else {
        RiskLevel::Yellow
    };

    RiskAssessment::from_axes(regulatory, transparency, user_rights)
}

fn is_regulation_tag(tag: &str) -> bool {
    let lower = tag.to_lowercase();
    lower.contains("gdpr") || lower.contains("ccpa")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ChunkFinding;
    use std::collections::HashMap;

    fn analysis_with(findings: Vec<ChunkFinding>) -> AggregatedAnalysis {
        AggregatedAnalysis {
            executive_summary: String::new(),
            key_points: Vec::new(),
            red_flags: findings.iter().flat_map(|f| f.red_flags.clone()).collect(),
            recommendations: Vec::new(),
            compliance_tags: HashMap::new(),
            per_chunk_findings: findings,
            degraded_chunks: 0,
        }
    }

    fn tagged(tag: &str, value: &str) -> ChunkFinding {
        let mut finding = ChunkFinding::default();
        finding.compliance_tags.insert(tag.to_string(), value.to_string());
        finding
    }

    #[test]
    fn test_level_ordering() {
        assert!(RiskLevel::Green < RiskLevel::Yellow);
        assert!(RiskLevel::Yellow < RiskLevel::Red);
    }

    #[test]
    fn test_overall_is_max_for_all_combinations() {
        let levels = [RiskLevel::Green, RiskLevel::Yellow, RiskLevel::Red];
        for &a in &levels {
            for &b in &levels {
                for &c in &levels {
                    let assessment = RiskAssessment::from_axes(a, b, c);
                    assert_eq!(assessment.overall, a.max(b).max(c));
                }
            }
        }
    }

    #[test]
    fn test_non_compliant_tag_forces_red() {
        let assessment = score(&analysis_with(vec![tagged("GDPR", "non-compliant")]));
        assert_eq!(assessment.regulatory, RiskLevel::Red);
        assert_eq!(assessment.overall, RiskLevel::Red);
    }

    #[test]
    fn test_partially_tag_is_yellow() {
        let assessment = score(&analysis_with(vec![tagged("CCPA", "partially")]));
        assert_eq!(assessment.regulatory, RiskLevel::Yellow);
    }

    #[test]
    fn test_compliant_everything_is_green() {
        let mut finding = tagged("GDPR", "compliant");
        finding.mentioned_rights.push("erasure".to_string());
        let assessment = score(&analysis_with(vec![finding]));
        assert_eq!(assessment.regulatory, RiskLevel::Green);
        assert_eq!(assessment.transparency, RiskLevel::Green);
        assert_eq!(assessment.user_rights, RiskLevel::Green);
        assert_eq!(assessment.overall, RiskLevel::Green);
    }

    #[test]
    fn test_red_flags_force_regulatory_and_transparency() {
        let mut finding = tagged("GDPR", "compliant");
        finding.red_flags.push("Sells personal data".to_string());
        let assessment = score(&analysis_with(vec![finding]));
        assert_eq!(assessment.regulatory, RiskLevel::Red);
        assert_eq!(assessment.transparency, RiskLevel::Yellow);
        assert_eq!(assessment.overall, RiskLevel::Red);
    }

    #[test]
    fn test_no_mentioned_rights_is_yellow() {
        let assessment = score(&analysis_with(vec![tagged("GDPR", "compliant")]));
        assert_eq!(assessment.user_rights, RiskLevel::Yellow);
        assert_eq!(assessment.overall, RiskLevel::Yellow);
    }

    #[test]
    fn test_non_regulation_tags_ignored() {
        let assessment = score(&analysis_with(vec![tagged("compliance", "non-compliant")]));
        assert_eq!(assessment.regulatory, RiskLevel::Green);
    }

    #[test]
    fn test_tag_in_any_chunk_counts() {
        // A later chunk's non-compliant tag must not be shadowed by an
        // earlier chunk's value.
        let findings = vec![tagged("GDPR", "compliant"), tagged("GDPR", "non-compliant")];
        let assessment = score(&analysis_with(findings));
        assert_eq!(assessment.regulatory, RiskLevel::Red);
    }

    #[test]
    fn test_serializes_lowercase() {
        let assessment = RiskAssessment::from_axes(RiskLevel::Green, RiskLevel::Yellow, RiskLevel::Red);
        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["overall"], "red");
        assert_eq!(json["regulatory"], "green");
        assert_eq!(json["userRights"], "red");
    }
}
