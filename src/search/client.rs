// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search-client seam.
//!
//! The external daemon's wire protocol is somebody else's problem; this is
//! the narrow call surface the searcher needs. Filter and limit state
//! accumulates on the client between `set_*` calls and one `query`, exactly
//! like the daemon's native API, so implementations are per-search objects
//! rather than shared connections.

use std::collections::HashMap;

use crate::error::Result;

/// A filter value in engine representation: everything date- or
/// boolean-like has already been converted to an integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineValue {
    Int(i64),
    Str(String),
}

/// One match as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineMatch {
    /// Relevance rank; a rising integer, higher means more relevant.
    pub rank: i64,
    /// Numeric attributes stored with the document, including the
    /// definition's index-id column.
    pub attributes: HashMap<String, i64>,
}

/// Engine response: an *unordered* match map plus the pre-pagination
/// total. Relevance ordering is recovered from the ranks, never from
/// iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineResponse {
    pub matches: HashMap<u64, EngineMatch>,
    pub total_found: u64,
}

/// Client operations against the external search daemon.
pub trait SearchClient {
    fn set_server(&mut self, host: &str, port: u16);

    /// Restrict matches to rows whose `column` equals any of `values`.
    fn set_filter(&mut self, column: &str, values: Vec<EngineValue>);

    /// Restrict matches to rows whose `column` lies in `[min, max]`.
    fn set_filter_range(&mut self, column: &str, min: EngineValue, max: EngineValue);

    /// Pagination window, zero-based offset.
    fn set_limits(&mut self, offset: u64, count: u64);

    /// Run `text` against `index` with the accumulated state.
    fn query(&mut self, text: &str, index: &str) -> Result<EngineResponse>;
}
