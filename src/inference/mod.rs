// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Export all submodules and their public types
pub mod client;
pub mod findings;
pub mod prompts;

pub use client::{
    HttpInferenceClient, InferenceClient, InferenceConfig, InferenceError, InferencePrompt,
};
pub use findings::{
    parse_chunk_finding, parse_summary, ChunkFinding, ParsedFinding, SummaryPayload,
    PLACEHOLDER_KEY_POINT,
};
