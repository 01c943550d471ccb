//! SQL execution tests against the mock server.
//!
//! These check both what the client decodes and the exact requests it
//! puts on the wire.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{DateTime, TimeZone, Utc};
use iris_client::{Client, Error, SessionState};
use iris_protocol::{ListItem, ListReader, Opcode, SQL_NO_MORE_DATA, SQL_OK};
use iris_testing::{MockColumn, MockIrisServer, MockResponse, MockServerBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

async fn start(builder: MockServerBuilder) -> (MockIrisServer, Client) {
    init_tracing();
    let server = builder.build().await.unwrap();
    let client = Client::connect(server.client_config()).await.unwrap();
    (server, client)
}

fn read_sql(reader: &mut ListReader) -> String {
    let chunks = reader.read_i64().unwrap();
    (0..chunks).map(|_| reader.read_string().unwrap()).collect()
}

fn people() -> Vec<MockColumn> {
    vec![MockColumn::integer("ID"), MockColumn::varchar("Name")]
}

fn person(id: i64, name: &str) -> Vec<ListItem> {
    vec![ListItem::from_i64(id), ListItem::from_text(name)]
}

// =============================================================================
// Queries
// =============================================================================

#[tokio::test]
async fn test_query_streams_rows() {
    let (server, mut client) = start(MockIrisServer::builder().with_response(
        Opcode::DirectQuery,
        MockResponse::query(people(), vec![person(1, "Ada"), person(2, "Alan")]),
    ))
    .await;

    let mut rows = client
        .query("SELECT ID, Name FROM people WHERE ID > ?", &[&0])
        .await
        .unwrap();
    assert_eq!(rows.columns().len(), 2);
    assert_eq!(rows.columns()[1].name, "Name");

    let first = rows.next().await.unwrap().unwrap();
    assert_eq!(first.get::<i64>(0).unwrap(), 1);
    assert_eq!(first.get_by_name::<String>("name").unwrap(), "Ada");
    let second = rows.next().await.unwrap().unwrap();
    assert_eq!(second.get::<String>(1).unwrap(), "Alan");
    assert!(rows.next().await.unwrap().is_none());
    assert!(rows.is_finished());
    drop(rows);

    // Everything arrived with the query; nothing was fetched.
    assert!(server.received_with(Opcode::FetchData).await.is_empty());
    assert_eq!(client.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_query_request_layout() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectQuery, MockResponse::query(people(), vec![])),
    )
    .await;

    let rows = client
        .query("SELECT * FROM people WHERE ID = ? AND Name = ?", &[&7, &"Ada"])
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert!(rows.is_empty());

    let request = &server.received_with(Opcode::DirectQuery).await[0];
    let mut reader = request.reader();
    assert_eq!(
        read_sql(&mut reader),
        "SELECT * FROM people WHERE ID =  :%qpar(1)  AND Name =  :%qpar(2) "
    );
    assert_eq!(reader.read_i64().unwrap(), 2);
    for _ in 0..2 {
        assert_eq!(reader.read_i64().unwrap(), 99);
        assert_eq!(reader.read_i64().unwrap(), 4);
    }
    assert_eq!(reader.read_i64().unwrap(), 1);
    assert_eq!(reader.read_i64().unwrap(), 2);
    assert_eq!(reader.read_i64().unwrap(), 7);
    assert_eq!(reader.read_string().unwrap(), "Ada");
    // Query timeout and row limit follow the parameters.
    reader.read_i64().unwrap();
    reader.read_i64().unwrap();
    assert!(reader.is_exhausted());
}

#[tokio::test]
async fn test_query_fetches_more_rows() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(
                Opcode::DirectQuery,
                MockResponse::query_paged(people(), vec![person(1, "a"), person(2, "b")]),
            )
            .with_response(
                Opcode::FetchData,
                MockResponse::rows(vec![person(3, "c"), person(4, "d")], SQL_OK),
            )
            .with_response(Opcode::FetchData, MockResponse::rows(vec![], SQL_NO_MORE_DATA)),
    )
    .await;

    let rows = client
        .query("SELECT ID, Name FROM people", &[])
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    let ids: Vec<i64> = rows.iter().map(|r| r.get(0).unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    let query_id = server.received_with(Opcode::DirectQuery).await[0].statement_id;
    let fetches = server.received_with(Opcode::FetchData).await;
    assert_eq!(fetches.len(), 2);
    assert!(fetches.iter().all(|m| m.statement_id == query_id));
}

#[tokio::test]
async fn test_last_chunk_marks_end_of_data() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(
                Opcode::DirectQuery,
                MockResponse::query_paged(people(), vec![person(1, "a")]),
            )
            .with_response(
                Opcode::FetchData,
                MockResponse::rows(vec![person(2, "b")], SQL_NO_MORE_DATA),
            ),
    )
    .await;

    let rows = client
        .query("SELECT ID, Name FROM people", &[])
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(server.received_with(Opcode::FetchData).await.len(), 1);
}

#[tokio::test]
async fn test_batched_rows_use_slots() {
    let columns = vec![
        MockColumn::integer("ID").with_slot(3),
        MockColumn::varchar("Name").with_slot(1),
    ];
    let rows = vec![
        vec![
            ListItem::from_text("Ada"),
            ListItem::from_i64(0),
            ListItem::from_i64(10),
        ],
        vec![
            ListItem::from_text("Alan"),
            ListItem::from_i64(0),
            ListItem::from_i64(20),
        ],
    ];
    let (_server, mut client) = start(MockIrisServer::builder().with_response(
        Opcode::DirectQuery,
        MockResponse::batched_query(columns, 3, rows),
    ))
    .await;

    let rows = client
        .query("SELECT ID, Name FROM people", &[])
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get::<i64>(0).unwrap(), 10);
    assert_eq!(rows[0].get::<String>(1).unwrap(), "Ada");
    assert_eq!(rows[1].get::<i64>(0).unwrap(), 20);
}

#[tokio::test]
async fn test_null_and_empty_values() {
    let columns = vec![
        MockColumn::varchar("A"),
        MockColumn::varchar("B"),
        MockColumn::double("C"),
    ];
    let row = vec![
        ListItem::null(),
        ListItem::from_bytes(vec![0u8]),
        ListItem::from_f64(2.5).unwrap(),
    ];
    let (_server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectQuery, MockResponse::query(columns, vec![row])),
    )
    .await;

    let row = client
        .query("SELECT A, B, C FROM t", &[])
        .await
        .unwrap()
        .next()
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_null(0));
    assert_eq!(row.get::<String>(1).unwrap(), "");
    assert_eq!(row.get::<f64>(2).unwrap(), 2.5);
    assert_eq!(row.get::<Option<String>>(0).unwrap(), None);
}

#[tokio::test]
async fn test_timestamps_round_trip() {
    let at: DateTime<Utc> = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap();
    let columns = vec![MockColumn::timestamp("Created")];
    let row = vec![ListItem::from_text("2024-03-01 12:30:45")];
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectQuery, MockResponse::query(columns, vec![row])),
    )
    .await;

    let value = client
        .query_scalar("SELECT Created FROM t WHERE Created >= ?", &[&at])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(value.as_timestamp(), Some(at));

    let mut reader = server.received_with(Opcode::DirectQuery).await[0].reader();
    read_sql(&mut reader);
    assert_eq!(reader.read_i64().unwrap(), 1);
    reader.read_i64().unwrap();
    reader.read_i64().unwrap();
    reader.read_i64().unwrap();
    reader.read_i64().unwrap();
    assert_eq!(
        reader.read_string().unwrap(),
        iris_types::format_timestamp(&at)
    );
}

#[tokio::test]
async fn test_compound_statement_runs_update_then_query() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectUpdate, MockResponse::update(1, false))
            .with_response(
                Opcode::DirectQuery,
                MockResponse::query(people(), vec![person(5, "e")]),
            ),
    )
    .await;

    let rows = client
        .query("UPDATE people SET ID = ? WHERE ID = 4;\nSELECT ID, Name FROM people", &[&5])
        .await
        .unwrap()
        .collect_all()
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);

    let requests = server.requests().await;
    assert_eq!(requests[0].opcode, Opcode::DirectUpdate);
    assert_eq!(requests[1].opcode, Opcode::DirectQuery);

    let mut query = requests[1].reader();
    assert_eq!(read_sql(&mut query), "SELECT ID, Name FROM people");
    assert_eq!(query.read_i64().unwrap(), 0);
}

#[tokio::test]
async fn test_last_insert_id() {
    let (server, mut client) = start(MockIrisServer::builder().with_response(
        Opcode::DirectQuery,
        MockResponse::query(
            vec![MockColumn::integer("LAST_IDENTITY")],
            vec![vec![ListItem::from_i64(7)]],
        ),
    ))
    .await;

    assert_eq!(client.last_insert_id().await.unwrap(), Some(7));
    let mut reader = server.received_with(Opcode::DirectQuery).await[0].reader();
    assert_eq!(read_sql(&mut reader), "SELECT LAST_IDENTITY()");
}

// =============================================================================
// SQL errors
// =============================================================================

#[tokio::test]
async fn test_sql_error_fetches_message_once() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectQuery, MockResponse::sql_error(-30))
            .with_response(
                Opcode::GetServerError,
                MockResponse::text("Table 'SQLUser.Missing' not found"),
            ),
    )
    .await;

    let err = client.query("SELECT * FROM Missing", &[]).await.unwrap_err();
    match &err {
        Error::Sql { code, message } => {
            assert_eq!(*code, -30);
            assert!(message.contains("not found"));
        }
        other => panic!("expected SQL error, got {other:?}"),
    }
    assert!(!err.is_terminal());
    assert_eq!(client.state(), SessionState::Ready);

    let lookups = server.received_with(Opcode::GetServerError).await;
    assert_eq!(lookups.len(), 1);
    assert_eq!(lookups[0].reader().read_i64().unwrap(), -30);
}

#[tokio::test]
async fn test_error_while_fetching_surfaces_from_next() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(
                Opcode::DirectQuery,
                MockResponse::query_paged(people(), vec![person(1, "a")]),
            )
            .with_response(Opcode::FetchData, MockResponse::sql_error(-400))
            .with_response(Opcode::GetServerError, MockResponse::text("fatal error")),
    )
    .await;

    let mut rows = client.query("SELECT ID, Name FROM people", &[]).await.unwrap();
    assert!(rows.next().await.unwrap().is_some());
    let err = rows.next().await.unwrap_err();
    assert!(err.is_sql_error(-400));
    assert!(rows.is_finished());
    drop(rows);

    assert_eq!(server.received_with(Opcode::GetServerError).await.len(), 1);
    assert_eq!(client.state(), SessionState::Ready);
}

// =============================================================================
// Updates
// =============================================================================

#[tokio::test]
async fn test_batched_update_sums_affected_rows() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectUpdate, MockResponse::update(2, true))
            .with_response(Opcode::PreparedUpdate, MockResponse::affected(3))
            .with_response(Opcode::PreparedUpdate, MockResponse::affected(4)),
    )
    .await;

    let result = client
        .execute(
            "INSERT INTO t (a, b) VALUES (?, ?)",
            &[&1, &"x", &2, &"y", &3, &"z"],
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 9);
    assert_eq!(result.batches, 3);
    assert_eq!(result.suppressed_error, None);

    let requests = server.requests().await;
    let opcodes: Vec<Opcode> = requests.iter().map(|m| m.opcode).collect();
    assert_eq!(
        opcodes,
        vec![
            Opcode::DirectUpdate,
            Opcode::PreparedUpdate,
            Opcode::PreparedUpdate
        ]
    );
    assert!(requests
        .iter()
        .all(|m| m.statement_id == requests[0].statement_id));

    let mut first = requests[0].reader();
    assert_eq!(
        read_sql(&mut first),
        "INSERT INTO t (a, b) VALUES ( :%qpar(1) ,  :%qpar(2) )"
    );
    assert_eq!(first.read_i64().unwrap(), 2);

    // Cached batches carry only the row.
    let mut last = requests[2].reader();
    assert_eq!(last.read_string().unwrap(), "");
    assert_eq!(last.read_i64().unwrap(), 0);
    assert_eq!(last.read_i64().unwrap(), 1);
    assert_eq!(last.read_i64().unwrap(), 2);
    assert_eq!(last.read_i64().unwrap(), 3);
    assert_eq!(last.read_string().unwrap(), "z");
}

#[tokio::test]
async fn test_uncacheable_update_resends_text() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectUpdate, MockResponse::update(1, false))
            .with_response(Opcode::DirectUpdate, MockResponse::update(1, false)),
    )
    .await;

    let result = client
        .execute("DELETE FROM t WHERE id = ?", &[&1, &2])
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 2);

    let opcodes: Vec<Opcode> = server.requests().await.iter().map(|m| m.opcode).collect();
    assert_eq!(opcodes, vec![Opcode::DirectUpdate, Opcode::DirectUpdate]);
}

#[tokio::test]
async fn test_parameters_must_fill_rows() {
    let (server, mut client) = start(MockIrisServer::builder()).await;

    let err = client
        .execute("INSERT INTO t (a, b) VALUES (?, ?)", &[&1, &2, &3])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Misuse(_)));

    let err = client
        .execute("DELETE FROM t", &[&1])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Misuse(_)));

    assert!(server.requests().await.is_empty());
    assert_eq!(client.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_on_conflict_do_nothing_suppresses_sql_error() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectUpdate, MockResponse::sql_error(-119))
            .with_response(Opcode::GetServerError, MockResponse::text("UNIQUE constraint")),
    )
    .await;

    let result = client
        .execute(
            "INSERT INTO t (id) VALUES (?);\n-- ON CONFLICT DO NOTHING",
            &[&1],
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 0);
    assert_eq!(result.suppressed_error, Some(-119));
    assert_eq!(client.state(), SessionState::Ready);

    let mut reader = server.received_with(Opcode::DirectUpdate).await[0].reader();
    assert_eq!(read_sql(&mut reader), "INSERT INTO t (id) VALUES ( :%qpar(1) )");
}

#[tokio::test]
async fn test_on_conflict_update_rewrites_insert() {
    let (server, mut client) = start(
        MockIrisServer::builder()
            .with_response(Opcode::DirectUpdate, MockResponse::update(1, false)),
    )
    .await;

    let result = client
        .execute(
            "INSERT INTO t (id, v) VALUES (?, ?);\n-- ON CONFLICT UPDATE",
            &[&1, &"v"],
        )
        .await
        .unwrap();
    assert_eq!(result.rows_affected(), 1);

    let mut reader = server.received_with(Opcode::DirectUpdate).await[0].reader();
    assert!(read_sql(&mut reader).starts_with("INSERT OR UPDATE t (id, v)"));
}
