//! Integration tests for dynosql-server: start server, connect client, verify ops.

use serde_json::json;
use tempfile::tempdir;
use tokio::runtime::Runtime;
use tokio::time::{Duration, sleep};

use dynosql_core::api::{Condition, Dynosql, compile, compile_update};
use dynosql_core::encoding::{AttributeValue, Item, encode_record};
use dynosql_core::error::{Error, StoreError};
use dynosql_core::store::{KeyRole, MemoryStore, key_schema_for};
use dynosql_core::types::{KeyDescriptor, TableSchema, TypeTag};
use dynosql_server::client::DynosqlClient;
use dynosql_server::error::ClientError;
use dynosql_server::server::DynosqlServer;
use dynosql_server::BlockingClient;

/// Start a server on a temp socket and return the socket path.
/// The server runs in a background tokio task.
async fn start_test_server() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("test.sock");

    let server = DynosqlServer::new(MemoryStore::new(), socket_path.clone());

    tokio::spawn(async move {
        server.run().await.unwrap();
    });

    // Give the server a moment to bind.
    sleep(Duration::from_millis(50)).await;

    (dir, socket_path)
}

/// Start a server on its own multi-threaded runtime, for blocking clients.
fn start_blocking_test_server() -> (tempfile::TempDir, Runtime, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("test.sock");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    let server = DynosqlServer::new(MemoryStore::new(), socket_path.clone());
    rt.spawn(async move {
        server.run().await.unwrap();
    });
    rt.block_on(async { sleep(Duration::from_millis(50)).await });

    (dir, rt, socket_path)
}

fn music_schema() -> TableSchema {
    TableSchema {
        name: "music".to_string(),
        partition_key: KeyDescriptor::new("artist", TypeTag::S),
        sort_key: Some(KeyDescriptor::new("song", TypeTag::S)),
    }
}

fn item(v: serde_json::Value) -> Item {
    encode_record(v.as_object().unwrap()).unwrap()
}

#[tokio::test]
async fn test_create_table_and_crud() {
    let (_dir, sock) = start_test_server().await;
    let mut client = DynosqlClient::connect(&sock).await.unwrap();

    let (key_schema, definitions) = key_schema_for(&music_schema());
    let description = client
        .create_table("music", &key_schema, &definitions)
        .await
        .unwrap();
    assert_eq!(description.table_name, "music");
    assert_eq!(description.key_schema[0].key_type, KeyRole::Hash);

    let tables = client.list_tables().await.unwrap();
    assert_eq!(tables, vec!["music"]);

    client
        .put_item(
            "music",
            &item(json!({"artist": "Prince", "song": "Purple Rain", "released": 1984})),
        )
        .await
        .unwrap();

    let key = item(json!({"artist": "Prince", "song": "Purple Rain"}));
    let got = client.get_item("music", &key).await.unwrap().unwrap();
    assert_eq!(got["released"], AttributeValue::N("1984".to_string()));

    let missing = item(json!({"artist": "Prince", "song": "Kiss"}));
    assert!(client.get_item("music", &missing).await.unwrap().is_none());

    client
        .update_item(
            "music",
            &key,
            &compile_update("album", AttributeValue::S("Purple Rain".to_string())),
        )
        .await
        .unwrap();
    let got = client.get_item("music", &key).await.unwrap().unwrap();
    assert_eq!(got.len(), 4);

    client.delete_item("music", &key).await.unwrap();
    client.delete_item("music", &key).await.unwrap();
    assert!(client.get_item("music", &key).await.unwrap().is_none());

    let description = client.describe_table("music").await.unwrap();
    assert_eq!(description.item_count, 0);
}

#[tokio::test]
async fn test_scan_with_filter() {
    let (_dir, sock) = start_test_server().await;
    let mut client = DynosqlClient::connect(&sock).await.unwrap();

    let (key_schema, definitions) = key_schema_for(&music_schema());
    client
        .create_table("music", &key_schema, &definitions)
        .await
        .unwrap();

    for (song, year) in [("Purple Rain", 1984), ("Little Red Corvette", 1983), ("Kiss", 1986)] {
        client
            .put_item(
                "music",
                &item(json!({"artist": "Prince", "song": song, "released": year})),
            )
            .await
            .unwrap();
    }

    let all = client.scan("music", None).await.unwrap();
    assert_eq!(all.len(), 3);

    let filter = compile(&Condition::eq("released", 1983)).unwrap();
    let hits = client.scan("music", Some(&filter)).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(
        hits[0]["song"],
        AttributeValue::S("Little Red Corvette".to_string())
    );
}

#[tokio::test]
async fn test_server_errors() {
    let (_dir, sock) = start_test_server().await;
    let mut client = DynosqlClient::connect(&sock).await.unwrap();

    let err = client.describe_table("nope").await.unwrap_err();
    match err {
        ClientError::Server(resp) => {
            assert_eq!(resp.error, "TableNotFound");
            assert_eq!(resp.table.as_deref(), Some("nope"));
        }
        other => panic!("expected server error, got {other:?}"),
    }

    let (key_schema, definitions) = key_schema_for(&music_schema());
    client
        .create_table("music", &key_schema, &definitions)
        .await
        .unwrap();
    let err = client
        .create_table("music", &key_schema, &definitions)
        .await
        .unwrap_err();
    let err: StoreError = err.into();
    assert!(matches!(err, StoreError::TableAlreadyExists(ref name) if name == "music"));

    let err = client
        .put_item("music", &item(json!({"artist": "Prince"})))
        .await
        .unwrap_err();
    assert!(matches!(StoreError::from(err), StoreError::Validation(_)));
}

#[tokio::test]
async fn test_malformed_request_keeps_connection() {
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    let (_dir, sock) = start_test_server().await;
    let stream = tokio::net::UnixStream::connect(&sock).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    writer.write_all(b"not json\n").await.unwrap();
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    let resp: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(resp["error"], "ParseError");

    writer.write_all(b"{\"op\":\"list_tables\"}\n").await.unwrap();
    line.clear();
    reader.read_line(&mut line).await.unwrap();
    let resp: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(resp, json!({"TableNames": []}));
}

#[tokio::test]
async fn test_clients_share_tables() {
    let (_dir, sock) = start_test_server().await;
    let mut first = DynosqlClient::connect(&sock).await.unwrap();
    let mut second = DynosqlClient::connect(&sock).await.unwrap();

    let (key_schema, definitions) = key_schema_for(&music_schema());
    first
        .create_table("music", &key_schema, &definitions)
        .await
        .unwrap();
    first
        .put_item("music", &item(json!({"artist": "Prince", "song": "Kiss"})))
        .await
        .unwrap();

    let key = item(json!({"artist": "Prince", "song": "Kiss"}));
    assert!(second.get_item("music", &key).await.unwrap().is_some());
}

#[test]
fn test_dynosql_over_blocking_client() {
    let (_dir, _rt, sock) = start_blocking_test_server();
    let db = Dynosql::new(BlockingClient::connect(&sock).unwrap());

    let music = db
        .table("music")
        .partition_key("artist", TypeTag::S)
        .sort_key("song", TypeTag::S)
        .open()
        .unwrap();

    music
        .put(
            ("Prince", "Purple Rain"),
            json!({"released": 1984, "album": "Purple Rain"}),
        )
        .unwrap();
    music
        .put(("Prince", "Little Red Corvette"), json!({"released": 1983}))
        .unwrap();

    let record = music.get(("Prince", "Purple Rain")).unwrap();
    assert_eq!(record["released"], json!(1984));
    assert_eq!(record["album"], json!("Purple Rain"));

    music
        .update(("Prince", "Purple Rain"), "released", 1985)
        .unwrap();
    let record = music.get(("Prince", "Purple Rain")).unwrap();
    assert_eq!(record["released"], json!(1985));
    assert_eq!(record["album"], json!("Purple Rain"));

    let hits = music.scan(&Condition::eq("released", 1983)).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["song"], json!("Little Red Corvette"));

    music.delete(("Prince", "Purple Rain")).unwrap();
    music.delete(("Prince", "Purple Rain")).unwrap();
    assert!(matches!(
        music.get(("Prince", "Purple Rain")),
        Err(Error::NotFound { .. })
    ));

    music.drop_table().unwrap();
    assert!(db.table_names().unwrap().is_empty());
}

#[test]
fn test_blocking_client_attach_and_drop() {
    let (_dir, _rt, sock) = start_blocking_test_server();
    let db = Dynosql::new(BlockingClient::connect(&sock).unwrap());

    db.table("music")
        .partition_key("artist", TypeTag::S)
        .sort_key("released", TypeTag::N)
        .open()
        .unwrap();

    // A second connection attaches to the table created by the first.
    let other = Dynosql::new(BlockingClient::connect(&sock).unwrap());
    let attached = other
        .table("music")
        .partition_key("artist", TypeTag::S)
        .open()
        .unwrap();
    assert_eq!(
        attached.schema().sort_key,
        Some(KeyDescriptor::new("released", TypeTag::N))
    );

    let first = db.table("music").open().unwrap();
    first.drop_table().unwrap();
    // Already gone: still fine.
    attached.drop_table().unwrap();

    let err = db.table("music").open().err().unwrap();
    assert!(err.is_table_not_found());
}
