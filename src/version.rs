// Version information for the Policy Audit Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-policy-audit-2026-08-26";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-08-26";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "privacy-policy-analysis",
    "terms-of-service-analysis",
    "policy-detection",
    "risk-scoring",
    "ttl-result-cache",
    "rate-limiting",
    "extension-gate",
];
