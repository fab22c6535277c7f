//! End-to-end tests: registration → configuration text → stubbed search.
//!
//! No daemon and no database are required; the search client is the
//! [`StubClient`] double and records come from an in-memory loader.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use search_bridge::{
    assemble, pack_doc_id, write_configuration, ColumnType, DatabaseSettings, EngineMatch,
    EngineResponse, IndexDefinition, IndexRegistry, ModelSchema, RecordLoader, RegistrySnapshot,
    Result, SchemaSet, SearchOptions, Searcher, SettingsLoader, StubClient, ATTR_INDEX_ID,
};

// =============================================================================
// Fixtures
// =============================================================================

fn schemas() -> SchemaSet {
    SchemaSet::new()
        .with(
            ModelSchema::new("Post", "posts")
                .column("title", ColumnType::String)
                .column("body", ColumnType::Text)
                .column("published_at", ColumnType::DateTime)
                .column("user_id", ColumnType::Integer)
                .belongs_to("user", "User", "user_id")
                .has_many("comments", "Comment", "post_id"),
        )
        .with(
            ModelSchema::new("User", "users")
                .column("name", ColumnType::String)
                .has_many("posts", "Post", "user_id"),
        )
        .with(
            ModelSchema::new("Comment", "comments")
                .column("body", ColumnType::Text)
                .column("post_id", ColumnType::Integer)
                .belongs_to("post", "Post", "post_id"),
        )
}

/// Post gets index-id 0, Comment index-id 1.
fn snapshot() -> RegistrySnapshot {
    let schemas = schemas();
    let mut registry = IndexRegistry::new();
    registry
        .register(
            &schemas,
            "Post",
            IndexDefinition::new()
                .fields(["title", "published_at", "user.name", "comments.body"])
                .condition("published = 1"),
        )
        .unwrap();
    registry
        .register(&schemas, "Comment", IndexDefinition::new().field("body"))
        .unwrap();
    registry.finalize()
}

fn database() -> DatabaseSettings {
    DatabaseSettings {
        adapter: "mysql".into(),
        host: Some("localhost".into()),
        username: Some("rw".into()),
        password: Some("secret".into()),
        database: Some("app".into()),
        socket: None,
    }
}

/// Keyed JSON documents standing in for ORM records. Returns rows sorted
/// by primary key, i.e. *not* in the requested order.
struct JsonLoader {
    rows: HashMap<u64, Value>,
}

impl JsonLoader {
    fn with_posts(ids: &[u64]) -> Self {
        let rows = ids
            .iter()
            .map(|id| (*id, json!({"id": id, "title": format!("post {id}")})))
            .collect();
        Self { rows }
    }
}

impl RecordLoader for JsonLoader {
    type Record = Value;

    fn find_by_ids(&self, _model: &str, ids: &[u64]) -> Result<Vec<Value>> {
        let mut sorted = ids.to_vec();
        sorted.sort_unstable();
        Ok(sorted
            .iter()
            .filter_map(|id| self.rows.get(id).cloned())
            .collect())
    }

    fn record_id(&self, record: &Value) -> u64 {
        record["id"].as_u64().unwrap_or_default()
    }
}

fn post_match(pk: u64, rank: i64) -> (u64, EngineMatch) {
    (
        pack_doc_id(pk, 0, 2),
        EngineMatch {
            rank,
            attributes: HashMap::from([(ATTR_INDEX_ID.to_string(), 0i64)]),
        },
    )
}

// =============================================================================
// Configuration generation
// =============================================================================

#[test]
fn generated_configuration_covers_every_registered_definition() {
    let dir = tempfile::tempdir().unwrap();
    let settings = SettingsLoader::new(dir.path(), "test").get().unwrap();
    let snapshot = snapshot();

    let text = assemble(&schemas(), &snapshot, &settings, &database(), dir.path()).unwrap();

    // one source+index pair per definition, in registration order
    let posts_at = text.find("source posts\n{").unwrap();
    let comments_at = text.find("source comments\n{").unwrap();
    assert!(posts_at < comments_at);
    assert!(text.contains("index posts\n{"));
    assert!(text.contains("index comments\n{"));

    // packed-ID leading field uses index_count 2 and the assigned ids
    assert!(text.contains("sql_query = SELECT (posts.id * 2 + 0) AS id"));
    assert!(text.contains("sql_query = SELECT (comments.id * 2 + 1) AS id"));

    // datetime column flows through the epoch conversion and date bucket
    assert!(text.contains("UNIX_TIMESTAMP(posts.published_at) AS published_at"));
    assert!(text.contains("sql_date_column = published_at"));

    // range placeholders and the declared condition, in order
    assert!(text.contains("posts.id >= $start AND posts.id <= $end AND published = 1"));

    // association flattening: one join each way, grouped for the aggregate
    assert!(text.contains("LEFT JOIN users ON posts.user_id = users.id"));
    assert!(text.contains("GROUP_CONCAT(comments.body SEPARATOR ' ') AS comments_body"));
    assert!(text.contains("GROUP BY posts.id"));

    // unpack arithmetic in the single-record companion query
    assert!(text.contains("sql_query_info = SELECT * FROM posts WHERE posts.id = (($id - 0) / 2)"));
    assert!(text.contains("sql_query_info = SELECT * FROM comments WHERE comments.id = (($id - 1) / 2)"));

    // connection settings and adapter defaults reach every source section
    assert!(text.contains("sql_pass = secret"));
    assert!(text.contains("sql_query_pre = SET NAMES utf8"));
}

#[test]
fn environment_overrides_flow_into_the_written_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("config/environments")).unwrap();
    let mut global = std::fs::File::create(dir.path().join("config/bridge.yml")).unwrap();
    writeln!(global, "indexer:\n  mem_limit: 64M\nbridge:\n  port: 3313").unwrap();
    let mut env =
        std::fs::File::create(dir.path().join("config/environments/bridge.test.yml")).unwrap();
    writeln!(env, "bridge:\n  port: 3314").unwrap();

    let settings = SettingsLoader::new(dir.path(), "test").get().unwrap();
    let path = write_configuration(&schemas(), &snapshot(), &settings, &database(), dir.path())
        .unwrap();

    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("mem_limit = 64M")); // global override
    assert!(text.contains("port = 3314")); // environment wins over global
    assert!(text.contains("pid_file = sphinx/test/searchd.pid")); // derived
}

// =============================================================================
// Search round trip
// =============================================================================

#[test]
fn search_decodes_and_orders_records_by_relevance() {
    let searcher = Searcher::new(
        Arc::new(snapshot()),
        SettingsLoader::new(Path::new("."), "test").get().unwrap(),
        schemas(),
        JsonLoader::with_posts(&[12, 13, 14]),
    );
    let mut client = StubClient::new().with_response(EngineResponse {
        matches: [post_match(12, 3), post_match(13, 1), post_match(14, 2)]
            .into_iter()
            .collect(),
        total_found: 37,
    });

    let results = searcher
        .search(&mut client, "Post", "words", &SearchOptions::new())
        .unwrap();

    let titles: Vec<&str> = results
        .records
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["post 12", "post 14", "post 13"]);
    assert_eq!(results.total, 37);
    assert_eq!(results.per_page, 10);
}

#[test]
fn scoped_collection_search_matches_direct_search_plus_ownership_filter() {
    let searcher = Searcher::new(
        Arc::new(snapshot()),
        SettingsLoader::new(Path::new("."), "test").get().unwrap(),
        schemas(),
        JsonLoader::with_posts(&[12]),
    );

    let mut direct_client = StubClient::new()
        .with_response(EngineResponse { matches: [post_match(12, 1)].into_iter().collect(), total_found: 1 });
    let options = SearchOptions::new().filter_value("user_id", 42i64);
    searcher
        .search(&mut direct_client, "Post", "words", &options)
        .unwrap();

    let mut scoped_client = StubClient::new()
        .with_response(EngineResponse { matches: [post_match(12, 1)].into_iter().collect(), total_found: 1 });
    let collection = searcher.collection("User", 42, "posts").unwrap();
    collection
        .search(&mut scoped_client, "words", &SearchOptions::new())
        .unwrap();

    assert_eq!(direct_client.calls(), scoped_client.calls());
}
