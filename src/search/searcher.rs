// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The searcher: engine parameters out, relevance-ordered records back.
//!
//! Decoding leans on the registry snapshot: every match carries its
//! definition's index-id as an attribute, and the snapshot's `index_count`
//! is by construction the same value the extraction queries were built
//! with, so `(doc_id - index_id) / index_count` always lands on the right
//! local primary key.
//!
//! Record loaders do not promise to preserve lookup order, so the searcher
//! re-sorts loaded records into the rank order it derived from the engine
//! response.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::Settings;
use crate::error::{BridgeError, Result};
use crate::registry::{unpack_doc_id, RegistrySnapshot, ScopedSearch, ATTR_INDEX_ID};
use crate::schema::{RecordLoader, SchemaProvider};
use crate::search::client::SearchClient;
use crate::search::request::{FilterValue, SearchOptions};

/// Outcome of one search call.
#[derive(Debug)]
pub struct SearchResults<R> {
    /// Resolved records, most relevant first.
    pub records: Vec<R>,
    /// Total matches before pagination, as the engine reported it.
    pub total: u64,
    /// Page size actually used.
    pub per_page: u64,
}

/// Issues searches and resolves results for every registered model.
pub struct Searcher<S, L> {
    snapshot: Arc<RegistrySnapshot>,
    settings: Arc<Settings>,
    schemas: S,
    loader: L,
}

impl<S: SchemaProvider, L: RecordLoader> Searcher<S, L> {
    pub fn new(
        snapshot: Arc<RegistrySnapshot>,
        settings: Arc<Settings>,
        schemas: S,
        loader: L,
    ) -> Self {
        Self {
            snapshot,
            settings,
            schemas,
            loader,
        }
    }

    /// Search `model`'s default index (or the index named in `options`)
    /// for `query`.
    pub fn search(
        &self,
        client: &mut dyn SearchClient,
        model: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResults<L::Record>> {
        let index_count = self.snapshot.index_count();
        if index_count == 0 {
            return Err(BridgeError::Client(
                "search issued before any index was registered".into(),
            ));
        }

        client.set_server(&self.settings.address(), self.settings.port());

        for (column, values) in &options.filters {
            let converted = values.iter().map(FilterValue::to_engine).collect();
            client.set_filter(column, converted);
        }
        for (column, min, max) in &options.ranges {
            client.set_filter_range(column, min.to_engine(), max.to_engine());
        }

        let per_page = options.per_page.unwrap_or_else(|| self.settings.per_page());
        let offset = options.page.map_or(0, |page| page.saturating_sub(1)) * per_page;
        client.set_limits(offset, per_page);

        let index = match &options.index {
            Some(name) => name.clone(),
            None => self
                .schemas
                .model(model)
                .ok_or_else(|| BridgeError::UnknownModel(model.to_string()))?
                .table_name()
                .to_string(),
        };

        let response = client.query(query, &index)?;
        debug!(
            index = %index,
            matches = response.matches.len(),
            total_found = response.total_found,
            "engine responded"
        );

        // The match map is unordered; relevance order is highest rank
        // first (doc id as deterministic tie-break).
        let mut matches: Vec<(u64, i64)> = response
            .matches
            .iter()
            .map(|(doc_id, m)| (*doc_id, m.rank))
            .collect();
        matches.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut ids = Vec::with_capacity(matches.len());
        for (doc_id, _) in &matches {
            let index_id = response.matches[doc_id]
                .attributes
                .get(ATTR_INDEX_ID)
                .copied()
                .ok_or_else(|| {
                    BridgeError::Client(format!(
                        "match {doc_id} is missing the {ATTR_INDEX_ID} attribute"
                    ))
                })?;
            ids.push(unpack_doc_id(*doc_id, index_id as u32, index_count));
        }

        let mut records = self.loader.find_by_ids(model, &ids)?;
        let position: HashMap<u64, usize> =
            ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        records.sort_by_key(|record| {
            position
                .get(&self.loader.record_id(record))
                .copied()
                .unwrap_or(usize::MAX)
        });

        Ok(SearchResults {
            records,
            total: response.total_found,
            per_page,
        })
    }

    /// The scoped-search collection for `owner_model.association`,
    /// installed at registration time.
    pub fn collection(
        &self,
        owner_model: &str,
        owner_id: u64,
        association: &str,
    ) -> Result<AssociationScope<'_, S, L>> {
        let scope = self
            .snapshot
            .scope(owner_model, association)
            .ok_or_else(|| BridgeError::UnknownScope {
                model: owner_model.to_string(),
                association: association.to_string(),
            })?;
        Ok(AssociationScope {
            searcher: self,
            scope,
            owner_id,
        })
    }
}

/// Search entry point scoped to one owning record's collection.
///
/// Injects a single equality filter on the association's foreign key and
/// otherwise delegates to the target model's search unchanged.
pub struct AssociationScope<'a, S, L> {
    searcher: &'a Searcher<S, L>,
    scope: &'a ScopedSearch,
    owner_id: u64,
}

impl<S, L> std::fmt::Debug for AssociationScope<'_, S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationScope")
            .field("scope", &self.scope)
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}

impl<S: SchemaProvider, L: RecordLoader> AssociationScope<'_, S, L> {
    pub fn search(
        &self,
        client: &mut dyn SearchClient,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResults<L::Record>> {
        let scoped = options
            .clone()
            .filter_value(self.scope.foreign_key.clone(), self.owner_id as i64);
        self.searcher
            .search(client, &self.scope.target_model, query, &scoped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{pack_doc_id, IndexDefinition, IndexRegistry};
    use crate::schema::{ColumnType, ModelSchema, SchemaSet};
    use crate::search::client::{EngineMatch, EngineResponse, EngineValue};
    use crate::search::stub::{RecordedCall, StubClient};

    /// Loader that returns primary keys as records, deliberately in
    /// shuffled order to prove the searcher restores relevance order.
    struct KeyLoader;

    impl RecordLoader for KeyLoader {
        type Record = u64;

        fn find_by_ids(&self, _model: &str, ids: &[u64]) -> Result<Vec<u64>> {
            let mut out = ids.to_vec();
            out.sort_unstable();
            Ok(out)
        }

        fn record_id(&self, record: &u64) -> u64 {
            *record
        }
    }

    fn schemas() -> SchemaSet {
        SchemaSet::new()
            .with(
                ModelSchema::new("Post", "posts")
                    .column("title", ColumnType::String)
                    .belongs_to("user", "User", "user_id"),
            )
            .with(
                ModelSchema::new("User", "users")
                    .column("name", ColumnType::String)
                    .has_many("posts", "Post", "user_id"),
            )
            .with(ModelSchema::new("Comment", "comments").column("body", ColumnType::Text))
    }

    /// Comment gets index-id 0, Post index-id 1; index_count is 2.
    fn searcher() -> Searcher<SchemaSet, KeyLoader> {
        let schemas = schemas();
        let mut registry = IndexRegistry::new();
        registry
            .register(&schemas, "Comment", IndexDefinition::new().field("body"))
            .unwrap();
        registry
            .register(&schemas, "Post", IndexDefinition::new().field("title"))
            .unwrap();
        let snapshot = Arc::new(registry.finalize());
        Searcher::new(
            snapshot,
            Arc::new(Settings::defaults("test")),
            schemas,
            KeyLoader,
        )
    }

    fn post_match(pk: u64, rank: i64) -> (u64, EngineMatch) {
        (
            pack_doc_id(pk, 1, 2),
            EngineMatch {
                rank,
                attributes: HashMap::from([(ATTR_INDEX_ID.to_string(), 1i64)]),
            },
        )
    }

    fn response(matches: Vec<(u64, EngineMatch)>) -> EngineResponse {
        EngineResponse {
            total_found: matches.len() as u64,
            matches: matches.into_iter().collect(),
        }
    }

    #[test]
    fn results_follow_descending_rank_not_loader_order() {
        let searcher = searcher();
        let mut client = StubClient::new().with_response(response(vec![
            post_match(12, 3),
            post_match(13, 1),
            post_match(14, 2),
        ]));

        let results = searcher
            .search(&mut client, "Post", "words", &SearchOptions::new())
            .unwrap();

        assert_eq!(results.records, vec![12, 14, 13]);
        assert_eq!(results.total, 3);
        assert_eq!(results.per_page, 10);
    }

    #[test]
    fn default_index_is_the_models_table() {
        let searcher = searcher();
        let mut client = StubClient::new().with_response(response(vec![]));

        searcher
            .search(&mut client, "Post", "words", &SearchOptions::new())
            .unwrap();

        assert!(stub_queried(&client, "posts"));
    }

    #[test]
    fn explicit_index_overrides_the_default() {
        let searcher = searcher();
        let mut client = StubClient::new().with_response(response(vec![]));

        searcher
            .search(
                &mut client,
                "Post",
                "words",
                &SearchOptions::new().index("other"),
            )
            .unwrap();

        assert!(stub_queried(&client, "other"));
    }

    #[test]
    fn filters_and_ranges_are_converted_before_the_client_sees_them() {
        let searcher = searcher();
        let mut client = StubClient::new().with_response(response(vec![]));

        searcher
            .search(
                &mut client,
                "Post",
                "words",
                &SearchOptions::new()
                    .filter("flags", [true, false])
                    .between("published_at", 999_932_400i64, 999_936_000i64),
            )
            .unwrap();

        assert_eq!(
            client.filters_for("flags"),
            vec![&RecordedCall::SetFilter {
                column: "flags".into(),
                values: vec![EngineValue::Int(1), EngineValue::Int(0)],
            }]
        );
        assert_eq!(
            client.filters_for("published_at"),
            vec![&RecordedCall::SetFilterRange {
                column: "published_at".into(),
                min: EngineValue::Int(999_932_400),
                max: EngineValue::Int(999_936_000),
            }]
        );
    }

    #[test]
    fn pagination_is_one_based_with_configured_default_page_size() {
        let searcher = searcher();

        let mut client = StubClient::new().with_response(response(vec![]));
        searcher
            .search(&mut client, "Post", "words", &SearchOptions::new())
            .unwrap();
        assert!(client
            .calls()
            .contains(&RecordedCall::SetLimits { offset: 0, count: 10 }));

        let mut client = StubClient::new().with_response(response(vec![]));
        searcher
            .search(
                &mut client,
                "Post",
                "words",
                &SearchOptions::new().page(3).per_page(5),
            )
            .unwrap();
        assert!(client
            .calls()
            .contains(&RecordedCall::SetLimits { offset: 10, count: 5 }));
    }

    #[test]
    fn server_endpoint_comes_from_settings() {
        let searcher = searcher();
        let mut client = StubClient::new().with_response(response(vec![]));

        searcher
            .search(&mut client, "Post", "words", &SearchOptions::new())
            .unwrap();

        assert_eq!(
            client.calls()[0],
            RecordedCall::SetServer {
                host: "127.0.0.1".into(),
                port: 3312
            }
        );
    }

    #[test]
    fn scoped_search_injects_exactly_one_ownership_filter() {
        let searcher = searcher();
        let mut client = StubClient::new().with_response(response(vec![post_match(12, 1)]));

        let collection = searcher.collection("User", 42, "posts").unwrap();
        let results = collection
            .search(&mut client, "words", &SearchOptions::new())
            .unwrap();

        assert_eq!(results.records, vec![12]);
        assert_eq!(
            client.filters_for("user_id"),
            vec![&RecordedCall::SetFilter {
                column: "user_id".into(),
                values: vec![EngineValue::Int(42)],
            }]
        );
        assert!(stub_queried(&client, "posts"));
    }

    #[test]
    fn unknown_collection_is_an_error() {
        let searcher = searcher();
        let err = searcher.collection("User", 42, "comments").unwrap_err();
        assert!(matches!(err, BridgeError::UnknownScope { .. }));
    }

    #[test]
    fn match_without_index_id_attribute_is_a_client_error() {
        let searcher = searcher();
        let mut client = StubClient::new().with_response(response(vec![(
            25,
            EngineMatch {
                rank: 1,
                attributes: HashMap::new(),
            },
        )]));

        let err = searcher
            .search(&mut client, "Post", "words", &SearchOptions::new())
            .unwrap_err();
        assert!(matches!(err, BridgeError::Client(_)));
    }

    fn stub_queried(client: &StubClient, index: &str) -> bool {
        client.calls().iter().any(|call| {
            matches!(call, RecordedCall::Query { index: i, .. } if i == index)
        })
    }
}
