// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query issuance and result decoding.
//!
//! ```text
//! SearchOptions ──convert──▶ engine filters / ranges / limits
//!        │
//!        ▼
//! SearchClient::query ──▶ unordered { doc_id → rank, attrs }, total
//!        │
//!        ▼ sort by rank desc, unpack doc ids
//! RecordLoader::find_by_ids ──▶ records, re-ordered to relevance
//! ```
//!
//! The client is injected per call, so the [`StubClient`] test double slots
//! in wherever the real daemon client would.

mod client;
mod request;
mod searcher;
mod stub;

pub use client::{EngineMatch, EngineResponse, EngineValue, SearchClient};
pub use request::{FilterValue, SearchOptions};
pub use searcher::{AssociationScope, Searcher, SearchResults};
pub use stub::{RecordedCall, StubClient};
