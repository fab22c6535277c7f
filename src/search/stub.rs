// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Canned-response search client.
//!
//! Drop-in [`SearchClient`] for tests: no daemon required. Configure it
//! with one [`EngineResponse`] per expected query, hand it to the searcher
//! where the real client would go, then assert on the recorded calls.
//!
//! Querying an unconfigured stub or running past the configured responses
//! is an error rather than an empty result, so a test that under-provisions
//! its fixture fails loudly.

use std::collections::VecDeque;

use crate::error::{BridgeError, Result};
use crate::search::client::{EngineResponse, EngineValue, SearchClient};

/// One recorded client call, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    SetServer {
        host: String,
        port: u16,
    },
    SetFilter {
        column: String,
        values: Vec<EngineValue>,
    },
    SetFilterRange {
        column: String,
        min: EngineValue,
        max: EngineValue,
    },
    SetLimits {
        offset: u64,
        count: u64,
    },
    Query {
        text: String,
        index: String,
    },
}

/// Recording, replaying [`SearchClient`] test double.
#[derive(Debug, Default)]
pub struct StubClient {
    calls: Vec<RecordedCall>,
    responses: Option<VecDeque<EngineResponse>>,
}

impl StubClient {
    /// An unconfigured stub; any query fails until responses are supplied.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a canned response; each query consumes one.
    pub fn push_response(&mut self, response: EngineResponse) {
        self.responses
            .get_or_insert_with(VecDeque::new)
            .push_back(response);
    }

    #[must_use]
    pub fn with_response(mut self, response: EngineResponse) -> Self {
        self.push_response(response);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> &[RecordedCall] {
        &self.calls
    }

    /// Canned responses not yet consumed.
    #[must_use]
    pub fn remaining_responses(&self) -> usize {
        self.responses.as_ref().map_or(0, VecDeque::len)
    }

    /// Filter calls recorded for `column`.
    pub fn filters_for(&self, column: &str) -> Vec<&RecordedCall> {
        self.calls
            .iter()
            .filter(|call| match call {
                RecordedCall::SetFilter { column: c, .. }
                | RecordedCall::SetFilterRange { column: c, .. } => c == column,
                _ => false,
            })
            .collect()
    }
}

impl SearchClient for StubClient {
    fn set_server(&mut self, host: &str, port: u16) {
        self.calls.push(RecordedCall::SetServer {
            host: host.to_string(),
            port,
        });
    }

    fn set_filter(&mut self, column: &str, values: Vec<EngineValue>) {
        self.calls.push(RecordedCall::SetFilter {
            column: column.to_string(),
            values,
        });
    }

    fn set_filter_range(&mut self, column: &str, min: EngineValue, max: EngineValue) {
        self.calls.push(RecordedCall::SetFilterRange {
            column: column.to_string(),
            min,
            max,
        });
    }

    fn set_limits(&mut self, offset: u64, count: u64) {
        self.calls.push(RecordedCall::SetLimits { offset, count });
    }

    fn query(&mut self, text: &str, index: &str) -> Result<EngineResponse> {
        self.calls.push(RecordedCall::Query {
            text: text.to_string(),
            index: index.to_string(),
        });

        let responses = self
            .responses
            .as_mut()
            .ok_or(BridgeError::StubUnconfigured)?;
        responses.pop_front().ok_or(BridgeError::StubExhausted)
    }
}
