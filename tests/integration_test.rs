/// End-to-end tests for the projection engine
/// Covers matching, nulls, row versions, enums, diagnostics, parameter binding and Arrow batches

use arrow::array::{FixedSizeBinaryArray, Int32Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rowshape::{
    projectable, projectable_enum, Column, Diagnostic, DiagnosticKind, DiagnosticsStream, DynamicRow,
    MapperConfig, MemoryRowSet, Notice, ProjectionEngine, ProjectionError, Projectable, RowVersion,
    TypeDescriptor, TypeTag, Value,
};
use std::sync::{Arc, Mutex};

projectable_enum! {
    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    pub enum Status {
        #[default]
        Open = 0,
        Shipped = 1,
        Closed = 2,
    }
}

projectable! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Order {
        pub order_id: i32,
        pub name: String,
    }
}

projectable! {
    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Shipment {
        pub shipment_id: i64,
        pub status: Status,
        pub weight: Option<f64>,
        pub version: RowVersion,
    }
}

fn collecting_engine() -> (ProjectionEngine, Arc<Mutex<Vec<Diagnostic>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let engine = ProjectionEngine::new().with_sink(Arc::new(move |d: &Diagnostic| {
        log.lock().unwrap().push(d.clone());
    }));
    (engine, seen)
}

#[test]
fn test_end_to_end_order() {
    let (engine, seen) = collecting_engine();
    let rows = MemoryRowSet::with_columns(&[("ID", TypeTag::INT32), ("Name", TypeTag::STRING)])
        .with_row(vec![Value::I32(1), Value::String("hello".to_string())])
        .unwrap();

    let orders: Vec<Order> = engine.project_all(rows.rows()).unwrap();
    assert_eq!(
        orders,
        vec![Order {
            order_id: 1,
            name: "hello".to_string()
        }]
    );
    assert!(seen.lock().unwrap().is_empty(), "every member and column should map");
}

#[test]
fn test_spelling_variants_all_map() {
    let engine = ProjectionEngine::new();
    for id_column in ["OrderId", "Order_ID", "ORDERID", "order_id"] {
        let rows = MemoryRowSet::with_columns(&[(id_column, TypeTag::INT32), ("NAME", TypeTag::STRING)])
            .with_row(vec![Value::I32(9), Value::String("n".to_string())])
            .unwrap();
        let order: Order = engine.project(&rows.row(0).unwrap()).unwrap();
        assert_eq!(order.order_id, 9, "column {}", id_column);
        assert_eq!(order.name, "n");
    }
}

#[test]
fn test_scalar_target_null_is_zero() {
    let engine = ProjectionEngine::new();
    let rows = MemoryRowSet::with_columns(&[("Total", TypeTag::INT32.nullable())])
        .with_row(vec![Value::Null])
        .unwrap()
        .with_row(vec![Value::I32(12)])
        .unwrap();

    let totals: Vec<i32> = engine.project_all(rows.rows()).unwrap();
    assert_eq!(totals, vec![0, 12]);

    let optional: Vec<Option<i64>> = engine.project_all(rows.rows()).unwrap();
    assert_eq!(optional, vec![None, Some(12)]);
}

#[test]
fn test_composite_nulls_and_row_version() {
    let engine = ProjectionEngine::new();
    let rows = MemoryRowSet::with_columns(&[
        ("ShipmentId", TypeTag::INT64),
        ("Status", TypeTag::INT32.nullable()),
        ("Weight", TypeTag::FLOAT32.nullable()),
        ("Version", TypeTag::fixed_binary(10)),
    ])
    .with_row(vec![
        Value::I64(5),
        Value::I32(2),
        Value::F32(1.5),
        Value::Bytes(vec![0, 0, 0, 0, 0, 0, 0, 7, 0xAA, 0xBB]),
    ])
    .unwrap()
    .with_row(vec![Value::I64(6), Value::Null, Value::Null, Value::Null])
    .unwrap();

    let shipments: Vec<Shipment> = engine.project_all(rows.rows()).unwrap();

    assert_eq!(shipments[0].status, Status::Closed);
    assert_eq!(shipments[0].weight, Some(1.5));
    assert_eq!(shipments[0].version, RowVersion([0, 0, 0, 0, 0, 0, 0, 7]));
    assert_eq!(shipments[0].version.to_u64(), 7);

    assert_eq!(shipments[1].shipment_id, 6);
    assert_eq!(shipments[1].status, Status::Open);
    assert_eq!(shipments[1].weight, None);
    assert_eq!(shipments[1].version, RowVersion::default());
}

#[test]
fn test_unknown_enum_discriminant_fails_the_row() {
    let engine = ProjectionEngine::new();
    let rows = MemoryRowSet::with_columns(&[("Status", TypeTag::INT32)])
        .with_row(vec![Value::I32(42)])
        .unwrap();

    let err = engine.project::<Status, _>(&rows.row(0).unwrap()).unwrap_err();
    assert!(matches!(err, ProjectionError::Conversion { .. }));
}

#[test]
fn test_incompatible_column_is_reported_not_assigned() {
    let (engine, seen) = collecting_engine();
    let rows = MemoryRowSet::with_columns(&[("OrderId", TypeTag::STRING), ("Name", TypeTag::STRING)])
        .with_row(vec![Value::String("x".to_string()), Value::String("y".to_string())])
        .unwrap();

    let order: Order = engine.project(&rows.row(0).unwrap()).unwrap();
    assert_eq!(order.order_id, 0);
    assert_eq!(order.name, "y");

    let seen = seen.lock().unwrap();
    let member = seen
        .iter()
        .find(|d| d.kind == DiagnosticKind::UnmappedMember)
        .unwrap();
    assert_eq!(member.name, "order_id");
    assert_eq!(member.incompatible_with.as_deref(), Some("OrderId"));
    assert!(seen
        .iter()
        .any(|d| d.kind == DiagnosticKind::UnmappedColumn && d.name == "OrderId"));
}

#[test]
fn test_diagnostics_are_emitted_once_per_shape() {
    let (engine, seen) = collecting_engine();
    let rows = MemoryRowSet::with_columns(&[("Name", TypeTag::STRING), ("Extra", TypeTag::BOOL)])
        .with_row(vec![Value::String("a".to_string()), Value::Bool(true)])
        .unwrap();

    for _ in 0..3 {
        let _: Vec<Order> = engine.project_all(rows.rows()).unwrap();
    }
    // order_id and Extra, reported when the projector was built
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(engine.cache_stats().builds, 1);
}

#[tokio::test]
async fn test_diagnostics_stream_subscribers() {
    let stream = Arc::new(DiagnosticsStream::new());
    let mut early = stream.subscribe();
    let engine = ProjectionEngine::new().with_sink(stream.clone());

    let rows = MemoryRowSet::with_columns(&[("Name", TypeTag::STRING)])
        .with_row(vec![Value::String("a".to_string())])
        .unwrap();
    let _: Vec<Order> = engine.project_all(rows.rows()).unwrap();
    stream.complete();

    match early.next().await {
        Some(Notice::Message(text)) => assert!(text.contains("order_id"), "{}", text),
        other => panic!("expected a message, got {:?}", other),
    }
    assert_eq!(early.next().await, Some(Notice::Completed));

    let mut late = stream.subscribe();
    assert_eq!(late.next().await, Some(Notice::Completed));
}

#[derive(Debug)]
struct Sealed {
    code: i32,
}

impl Projectable for Sealed {
    fn descriptor() -> TypeDescriptor<Self> {
        TypeDescriptor::composite("Sealed").setter("code", |s: &mut Sealed, v: i32| s.code = v)
    }
}

#[test]
fn test_missing_constructor_is_cached_error() {
    let engine = ProjectionEngine::new();
    let rows = MemoryRowSet::with_columns(&[("Code", TypeTag::INT32)])
        .with_row(vec![Value::I32(1)])
        .unwrap();

    for _ in 0..2 {
        let err = engine.project::<Sealed, _>(&rows.row(0).unwrap()).unwrap_err();
        assert_eq!(err, ProjectionError::missing_constructor("Sealed"));
    }
    assert_eq!(engine.cache_stats().builds, 1);
}

#[test]
fn test_column_prefix() {
    let mut config = MapperConfig::default();
    config.matching.column_prefix = Some("o_".to_string());
    let engine = ProjectionEngine::with_config(config);
    let rows = MemoryRowSet::with_columns(&[("o_OrderId", TypeTag::INT32), ("o_Name", TypeTag::STRING)])
        .with_row(vec![Value::I32(3), Value::String("p".to_string())])
        .unwrap();

    let order: Order = engine.project(&rows.row(0).unwrap()).unwrap();
    assert_eq!(order.order_id, 3);
    assert_eq!(order.name, "p");

    let unprefixed = engine
        .get_or_build_projector_with_prefix::<Order>(&rows, None)
        .unwrap();
    assert_eq!(unprefixed.plan().len(), 0);
    assert_eq!(engine.cache_stats().shapes, 2);
}

#[test]
fn test_bind_parameters_converts_to_parameter_types() {
    let engine = ProjectionEngine::new();
    let shipment = Shipment {
        shipment_id: 11,
        status: Status::Shipped,
        weight: None,
        version: RowVersion([1; 8]),
    };
    let params = vec![
        Column::new(0, "Status", TypeTag::INT64),
        Column::new(1, "ShipmentId", TypeTag::INT64),
        Column::new(2, "Weight", TypeTag::FLOAT64.nullable()),
    ];

    let values = engine.bind_parameters(&params, &shipment).unwrap();
    assert_eq!(values, vec![Value::I64(1), Value::I64(11), Value::Null]);
}

#[test]
fn test_bind_row_version_to_wider_fixed_binary() {
    let engine = ProjectionEngine::new();
    let shipment = Shipment {
        shipment_id: 3,
        version: RowVersion([1; 8]),
        ..Shipment::default()
    };
    let params = vec![
        Column::new(0, "Version", TypeTag::fixed_binary(16)),
        Column::new(1, "ShipmentId", TypeTag::INT64),
    ];

    let values = engine.bind_parameters(&params, &shipment).unwrap();
    assert_eq!(values, vec![Value::RowVersion([1; 8]), Value::I64(3)]);
}

#[test]
fn test_arrow_batch_projection() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("SHIPMENT_ID", DataType::Int64, false),
        Field::new("Status", DataType::Int32, true),
        Field::new("Version", DataType::FixedSizeBinary(8), true),
    ]));
    let versions = FixedSizeBinaryArray::try_from_sparse_iter_with_size(
        vec![Some(vec![0u8, 0, 0, 0, 0, 0, 0, 1]), None, Some(vec![0u8, 0, 0, 0, 0, 0, 0, 3])].into_iter(),
        8,
    )
    .unwrap();
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(Int32Array::from(vec![Some(0), Some(1), None])),
            Arc::new(versions),
        ],
    )
    .unwrap();

    let engine = ProjectionEngine::new();
    let shipments: Vec<Shipment> = engine.project_batch(&batch).unwrap();

    assert_eq!(shipments.len(), 3);
    assert_eq!(shipments[1].shipment_id, 2);
    assert_eq!(shipments[1].status, Status::Shipped);
    assert_eq!(shipments[1].version, RowVersion::default());
    assert_eq!(shipments[2].status, Status::Open);
    assert_eq!(shipments[2].version.to_u64(), 3);
}

#[test]
fn test_arrow_unsupported_type_is_row_access_error() {
    let schema = Arc::new(Schema::new(vec![Field::new("When", DataType::Date32, false)]));
    let batch = RecordBatch::try_new(
        schema,
        vec![Arc::new(arrow::array::Date32Array::from(vec![1]))],
    )
    .unwrap();

    let err = ProjectionEngine::new().project_batch::<Order>(&batch).unwrap_err();
    assert!(matches!(err, ProjectionError::RowAccess { .. }));
}

#[test]
fn test_dynamic_rows_and_grouping() {
    let engine = ProjectionEngine::new();
    let mut rows = MemoryRowSet::with_columns(&[("OrderId", TypeTag::INT32), ("Name", TypeTag::STRING)]);
    for (id, name) in [(1, "x"), (2, "y"), (3, "x"), (4, "z")] {
        rows.push_row(vec![Value::I32(id), Value::String(name.to_string())]).unwrap();
    }

    let dynamic = DynamicRow::from_accessor(&rows.row(2).unwrap()).unwrap();
    assert_eq!(dynamic["orderid"], Value::I32(3));

    let groups = engine.group_by(rows.rows(), |o: &Order| o.name.clone()).unwrap();
    let summary: Vec<(String, Vec<i32>)> = groups
        .iter()
        .map(|(name, orders)| (name.clone(), orders.iter().map(|o| o.order_id).collect()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("x".to_string(), vec![1, 3]),
            ("y".to_string(), vec![2]),
            ("z".to_string(), vec![4]),
        ]
    );
}

#[test]
fn test_config_file_disables_type_name_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mapper.json");
    std::fs::write(&path, r#"{ "matching": { "strip_type_name_prefix": false } }"#).unwrap();

    let engine = ProjectionEngine::with_config(MapperConfig::from_json_file(&path).unwrap());
    let rows = MemoryRowSet::with_columns(&[("ID", TypeTag::INT32), ("Name", TypeTag::STRING)])
        .with_row(vec![Value::I32(1), Value::String("hello".to_string())])
        .unwrap();

    let order: Order = engine.project(&rows.row(0).unwrap()).unwrap();
    assert_eq!(order.order_id, 0);
    assert_eq!(order.name, "hello");
}
