// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed prompts for the structured-extraction and summary calls.

use crate::analysis::DocumentType;
use crate::inference::findings::ChunkFinding;

/// System prompt describing the auditor role. Fixed for every chunk of
/// a request.
pub fn auditor_system_prompt(doc_type: DocumentType) -> String {
    format!(
        "You are a consumer-protection auditor reviewing a {} document. \
         You identify what the document commits the provider to, what it \
         allows the provider to do with user data, and which user rights \
         it grants or omits. You answer only with JSON, never prose.",
        doc_type.description()
    )
}

/// Per-chunk user prompt embedding the chunk text and the required
/// output shape.
pub fn chunk_user_prompt(chunk_text: &str) -> String {
    format!(
        "Analyze the following excerpt and respond with a single JSON object \
         of this exact shape:\n\
         {{\"keyPoints\": [\"...\"], \"redFlags\": [\"...\"], \
         \"complianceTags\": {{\"GDPR\": \"compliant|partially|non-compliant|unknown\", \
         \"CCPA\": \"compliant|partially|non-compliant|unknown\"}}, \
         \"mentionedRights\": [\"...\"]}}\n\n\
         Excerpt:\n{}",
        chunk_text
    )
}

/// Second-pass prompt: synthesize an executive summary and
/// recommendations from the merged per-chunk findings.
pub fn summary_user_prompt(findings: &[ChunkFinding]) -> String {
    let mut digest = String::new();
    for (i, finding) in findings.iter().enumerate() {
        digest.push_str(&format!("Section {}:\n", i + 1));
        for point in &finding.key_points {
            digest.push_str(&format!("- {}\n", point));
        }
        for flag in &finding.red_flags {
            digest.push_str(&format!("- RED FLAG: {}\n", flag));
        }
    }

    format!(
        "Given these findings from a document review, respond with a single \
         JSON object of this exact shape:\n\
         {{\"executiveSummary\": \"...\", \"recommendations\": [\"...\"]}}\n\n\
         Findings:\n{}",
        digest
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_prompt_embeds_text_and_shape() {
        let prompt = chunk_user_prompt("We may share your data.");
        assert!(prompt.contains("We may share your data."));
        assert!(prompt.contains("keyPoints"));
        assert!(prompt.contains("mentionedRights"));
    }

    #[test]
    fn test_system_prompt_mentions_document_type() {
        assert!(auditor_system_prompt(DocumentType::Privacy).contains("privacy policy"));
        assert!(auditor_system_prompt(DocumentType::Terms).contains("terms of service"));
    }

    #[test]
    fn test_summary_prompt_includes_flags() {
        let finding = ChunkFinding {
            key_points: vec!["Keeps data forever".to_string()],
            red_flags: vec!["No deletion".to_string()],
            ..Default::default()
        };
        let prompt = summary_user_prompt(&[finding]);
        assert!(prompt.contains("Keeps data forever"));
        assert!(prompt.contains("RED FLAG: No deletion"));
    }
}
