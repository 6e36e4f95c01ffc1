//! Integration tests for the serialize and hydrate paths.

use pointmap::entity::{Arguments, Constructor, Entity, EntityType, Param, PropertyDecl, Role};
use pointmap::error::{HydrateError, Result};
use pointmap::value::{Metrics, Value, ValueType};
use pointmap::{
    MapError, Point, Row, RowErrorPolicy, build_schema, hydrate, hydrate_all, serialize,
};

const CPU_LOAD: EntityType = EntityType::new("CpuLoad")
    .with_measurement("cpu_load")
    .with_properties(&[
        PropertyDecl::new("host", &[Role::Tag("host", ValueType::String)]),
        PropertyDecl::new("core", &[Role::Tag("core", ValueType::Int)]),
        PropertyDecl::new("cpu", &[Role::TypedField("cpu", ValueType::Float)]),
        PropertyDecl::new("idle", &[Role::Field("idle")]),
        PropertyDecl::new("load", &[Role::Value]),
        PropertyDecl::new("extra", &[Role::ArrayOfMetrics]),
        PropertyDecl::new("at", &[Role::Timestamp]),
    ]);

const CPU_LOAD_PARAMS: &[Param] = &[
    Param::required("host"),
    Param::optional("core"),
    Param::required("cpu"),
    Param::optional("idle"),
    Param::optional("load"),
    Param::optional("extra"),
    Param::optional("at"),
];

#[derive(Debug, Clone, PartialEq)]
struct CpuLoad {
    host: String,
    core: Option<i64>,
    cpu: f64,
    idle: Option<bool>,
    load: Option<f64>,
    extra: Metrics,
    at: Option<i64>,
}

impl CpuLoad {
    fn sample() -> Self {
        Self {
            host: "web 1".to_string(),
            core: Some(3),
            cpu: 0.25,
            idle: Some(false),
            load: Some(1.5),
            extra: [("temp", Value::Integer(61))].into_iter().collect(),
            at: Some(1_609_459_200),
        }
    }
}

impl Entity for CpuLoad {
    const TYPE: &'static EntityType = &CPU_LOAD;

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "host" => Some(self.host.clone().into()),
            "core" => Some(self.core.into()),
            "cpu" => Some(self.cpu.into()),
            "idle" => Some(self.idle.into()),
            "load" => Some(self.load.into()),
            "at" => Some(self.at.into()),
            _ => None,
        }
    }

    // `extra` is only reachable through its accessor.
    fn accessor(&self, name: &str) -> Option<Value> {
        match name {
            "extra" => Some(Value::Metrics(self.extra.clone())),
            _ => None,
        }
    }

    fn constructor() -> Option<Constructor<Self>> {
        Some(Constructor::new(CPU_LOAD_PARAMS, |args: &mut Arguments| {
            Ok(CpuLoad {
                host: args.take()?,
                core: args.take()?,
                cpu: args.take()?,
                idle: args.take()?,
                load: args.take()?,
                extra: args.take()?,
                at: args.take()?,
            })
        }))
    }
}

/// Shapes a point the way a store returns it: RFC 3339 time, tags as
/// strings, fields and value as written.
fn as_query_row(point: &Point, time: &str) -> Row {
    let mut row = Row::new().with("time", time);
    for (key, value) in &point.tags {
        row.push(key.as_str(), value.to_string());
    }
    for (key, value) in &point.fields {
        row.push(key.as_str(), value.clone());
    }
    if let Some(value) = &point.value {
        row.push("value", value.clone());
    }
    row
}

#[test]
fn test_serialize_without_value_role() {
    const NO_VALUE: EntityType = EntityType::new("NoValue")
        .with_measurement("m")
        .with_properties(&[PropertyDecl::new("x", &[Role::Field("x")])]);

    struct NoValue;

    impl Entity for NoValue {
        const TYPE: &'static EntityType = &NO_VALUE;

        fn property(&self, name: &str) -> Option<Value> {
            (name == "x").then_some(Value::Integer(1))
        }
    }

    let schema = build_schema::<NoValue>().unwrap();
    let point = serialize(&schema, &NoValue).unwrap();
    assert_eq!(point.value, None);
    assert_eq!(point.fields["x"], Value::Integer(1));
}

#[test]
fn test_serialize_with_value_role() {
    let schema = build_schema::<CpuLoad>().unwrap();
    let point = serialize(&schema, &CpuLoad::sample()).unwrap();

    assert_eq!(point.measurement, "cpu_load");
    assert_eq!(point.value, Some(Value::Float(1.5)));
    assert_eq!(point.tags["host"], Value::from("web 1"));
    assert_eq!(point.tags["core"], Value::Integer(3));
    assert_eq!(point.fields["cpu"], Value::Float(0.25));
    assert_eq!(point.fields["temp"], Value::Integer(61));
    assert_eq!(point.timestamp, Some(1_609_459_200));

    assert_eq!(
        point.to_line_protocol().unwrap(),
        r"cpu_load,core=3,host=web\ 1 cpu=0.25,idle=false,temp=61i,value=1.5 1609459200"
    );
}

#[test]
fn test_round_trip() {
    let schema = build_schema::<CpuLoad>().unwrap();
    let original = CpuLoad::sample();
    let point = serialize(&schema, &original).unwrap();

    let row = as_query_row(&point, "2021-01-01T00:00:00Z");
    let restored: CpuLoad = hydrate(&schema, &row).unwrap();
    assert_eq!(restored, original);
}

#[test]
fn test_round_trip_drops_sub_second_time() {
    let schema = build_schema::<CpuLoad>().unwrap();
    let original = CpuLoad::sample();
    let point = serialize(&schema, &original).unwrap();

    let row = as_query_row(&point, "2021-01-01T00:00:00.750Z");
    let restored: CpuLoad = hydrate(&schema, &row).unwrap();
    assert_eq!(restored.at, original.at);
}

#[test]
fn test_hydrate_reference_row() {
    let schema = build_schema::<CpuLoad>().unwrap();
    let row = Row::from_json(serde_json::json!({
        "time": "2021-01-01T00:00:00Z",
        "host": "a",
        "cpu": "0.5",
    }))
    .unwrap();

    let load: CpuLoad = hydrate(&schema, &row).unwrap();
    assert_eq!(load.host, "a");
    assert!((load.cpu - 0.5).abs() < f64::EPSILON);
    assert_eq!(load.at, Some(1_609_459_200));
    assert_eq!(load.core, None);
    assert!(load.extra.is_empty());
}

#[test]
fn test_hydrate_all_skips_failed_row() {
    let schema = build_schema::<CpuLoad>().unwrap();
    let rows = [
        Row::new().with("time", 1_i64).with("host", "first").with("cpu", 0.1),
        // No `host` column: the required parameter cannot be matched.
        Row::new().with("time", 2_i64).with("cpu", 0.2),
        Row::new().with("time", 3_i64).with("host", "third").with("cpu", 0.3),
    ];

    let loads: Vec<CpuLoad> = hydrate_all(&schema, &rows, RowErrorPolicy::Skip).unwrap();
    let hosts: Vec<_> = loads.iter().map(|l| l.host.as_str()).collect();
    assert_eq!(hosts, ["first", "third"]);
    assert_eq!(loads[1].at, Some(3));
}

#[test]
fn test_hydrate_all_propagates_when_asked() {
    let schema = build_schema::<CpuLoad>().unwrap();
    let rows = [
        Row::new().with("time", 1_i64).with("host", "first").with("cpu", 0.1),
        Row::new().with("time", 2_i64).with("cpu", 0.2),
    ];

    let err = hydrate_all::<CpuLoad>(&schema, &rows, RowErrorPolicy::Propagate).unwrap_err();
    assert!(matches!(
        err,
        MapError::Hydrate(HydrateError::MissingConstructorArgument { ref parameter, .. })
            if parameter == "host"
    ));
}

#[test]
fn test_unknown_columns_keep_their_keys() -> Result<()> {
    let schema = build_schema::<CpuLoad>()?;
    let row = Row::new()
        .with("time", "2021-01-01 00:00:00")
        .with("host", "a")
        .with("cpu", 0.5)
        .with("fan_rpm", 1200_i64)
        .with("throttled", true);

    let load: CpuLoad = hydrate(&schema, &row)?;
    let keys: Vec<_> = load.extra.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, ["fan_rpm", "throttled"]);
    assert_eq!(load.extra.get("throttled"), Some(&Value::Boolean(true)));
    Ok(())
}
