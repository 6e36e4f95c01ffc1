//! The host-metrics entity the CLI maps.

use pointmap::entity::{Arguments, Constructor, Entity, EntityType, Param, PropertyDecl, Role};
use pointmap::error::HydrateError;
use pointmap::value::{Metrics, Value, ValueType};
use serde::{Deserialize, Serialize};

const HOST_SAMPLE: EntityType = EntityType::new("HostSample").with_measurement("host");

const HOST_CPU: EntityType = EntityType::new("HostCpu")
    .with_parent(&HOST_SAMPLE)
    .with_properties(&[
        PropertyDecl::new("host", &[Role::Tag("host", ValueType::String)]),
        PropertyDecl::new("core", &[Role::Tag("core", ValueType::Int)]),
        PropertyDecl::new("usage", &[Role::Value]),
        PropertyDecl::new("steal", &[Role::TypedField("steal", ValueType::Float)]),
        PropertyDecl::new("extra", &[Role::ArrayOfMetrics]),
        PropertyDecl::new("time", &[Role::Timestamp]),
    ]);

const HOST_CPU_PARAMS: &[Param] = &[
    Param::required("host"),
    Param::optional("core"),
    Param::required("usage"),
    Param::optional("steal"),
    Param::optional("extra"),
    Param::optional("time"),
];

/// CPU usage of one host core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostCpu {
    /// Host name (tag `host`).
    pub host: String,
    /// Core index (tag `core`).
    #[serde(default)]
    pub core: Option<i64>,
    /// Usage percentage, written as the point value.
    pub usage: f64,
    /// Steal time percentage (field `steal`).
    #[serde(default)]
    pub steal: Option<f64>,
    /// Any other per-sample metrics, folded into the point's fields.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
    /// Epoch timestamp in the configured precision.
    #[serde(default)]
    pub time: Option<i64>,
}

impl Entity for HostCpu {
    const TYPE: &'static EntityType = &HOST_CPU;

    fn property(&self, name: &str) -> Option<Value> {
        match name {
            "host" => Some(self.host.clone().into()),
            "core" => Some(self.core.into()),
            "usage" => Some(self.usage.into()),
            "steal" => Some(self.steal.into()),
            "time" => Some(self.time.into()),
            _ => None,
        }
    }

    fn accessor(&self, name: &str) -> Option<Value> {
        match name {
            "extra" => Some(
                self.extra
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value.clone())))
                    .collect::<Metrics>()
                    .into(),
            ),
            _ => None,
        }
    }

    fn constructor() -> Option<Constructor<Self>> {
        Some(Constructor::new(HOST_CPU_PARAMS, |args: &mut Arguments| {
            Ok(HostCpu {
                host: args.take()?,
                core: args.take()?,
                usage: args.take()?,
                steal: args.take()?,
                extra: to_json_map(args.take()?)?,
                time: args.take()?,
            })
        }))
    }
}

fn to_json_map(metrics: Metrics) -> pointmap::Result<serde_json::Map<String, serde_json::Value>> {
    metrics
        .into_iter()
        .map(|(key, value)| {
            let json = serde_json::to_value(&value).map_err(|_| HydrateError::ArgumentType {
                parameter: format!("extra.{key}"),
                expected: "a JSON value",
                found: value.kind(),
            })?;
            Ok((key, json))
        })
        .collect()
}
