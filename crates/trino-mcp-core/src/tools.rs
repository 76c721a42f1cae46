//! Tool catalog and typed tool calls.
//!
//! The catalog is a static table of [`ToolSpec`]s: name, description and
//! argument specs. It is used for two things only: advertising tools to the
//! client, and filling defaults / checking presence and types of incoming
//! arguments. Everything past that boundary works with [`ToolCall`], a closed
//! union carrying one strongly-typed argument record per tool.

use crate::config::{MAX_LIMIT, ToolDefaults};
use crate::error::ToolError;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::fmt;

/// Every tool the gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ExecuteSql,
    QueryLogs,
    QuerySpans,
    QueryMetrics,
    ListServices,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::ExecuteSql,
        ToolKind::QueryLogs,
        ToolKind::QuerySpans,
        ToolKind::QueryMetrics,
        ToolKind::ListServices,
    ];

    /// Look a tool up by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn spec(self) -> &'static ToolSpec {
        match self {
            ToolKind::ExecuteSql => &EXECUTE_SQL,
            ToolKind::QueryLogs => &QUERY_LOGS,
            ToolKind::QuerySpans => &QUERY_SPANS,
            ToolKind::QueryMetrics => &QUERY_METRICS,
            ToolKind::ListServices => &LIST_SERVICES,
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// JSON type of a tool argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Integer,
    StringArray,
}

impl ArgType {
    fn schema(self) -> Value {
        match self {
            ArgType::String => json!({ "type": "string" }),
            ArgType::Integer => json!({ "type": "integer", "minimum": 1, "maximum": MAX_LIMIT }),
            ArgType::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
        }
    }
}

/// Where an argument's default comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgDefault {
    None,
    Str(&'static str),
    /// [`ToolDefaults::time_range`].
    TimeRange,
    /// [`ToolDefaults::limit`].
    Limit,
}

impl ArgDefault {
    fn resolve(self, defaults: &ToolDefaults) -> Option<Value> {
        match self {
            ArgDefault::None => None,
            ArgDefault::Str(s) => Some(Value::String(s.to_string())),
            ArgDefault::TimeRange => Some(Value::String(defaults.time_range.clone())),
            ArgDefault::Limit => Some(Value::from(defaults.limit)),
        }
    }
}

/// One argument of a tool.
#[derive(Debug, Clone, Copy)]
pub struct ArgSpec {
    pub name: &'static str,
    pub arg_type: ArgType,
    pub required: bool,
    pub default: ArgDefault,
    pub description: &'static str,
}

/// Static description of a tool.
#[derive(Debug)]
pub struct ToolSpec {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub args: &'static [ArgSpec],
}

impl ToolSpec {
    /// JSON schema of the tool's arguments, with configured defaults filled in.
    pub fn input_schema(&self, defaults: &ToolDefaults) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for arg in self.args {
            let mut schema = arg.arg_type.schema();
            if let Value::Object(obj) = &mut schema {
                obj.insert("description".to_string(), json!(arg.description));
                if let Some(default) = arg.default.resolve(defaults) {
                    obj.insert("default".to_string(), default);
                }
            }
            properties.insert(arg.name.to_string(), schema);
            if arg.required {
                required.push(arg.name);
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

const TIME_RANGE: ArgSpec = ArgSpec {
    name: "time_range",
    arg_type: ArgType::String,
    required: false,
    default: ArgDefault::TimeRange,
    description: "Look-back window ending now: <integer><m|h|d>, e.g. 15m, 24h, 7d",
};

const LIMIT: ArgSpec = ArgSpec {
    name: "limit",
    arg_type: ArgType::Integer,
    required: false,
    default: ArgDefault::Limit,
    description: "Maximum number of rows to return",
};

const COLUMNS: ArgSpec = ArgSpec {
    name: "columns",
    arg_type: ArgType::StringArray,
    required: false,
    default: ArgDefault::None,
    description: "Columns to return; all columns when omitted",
};

const GROUP_BY: ArgSpec = ArgSpec {
    name: "group_by",
    arg_type: ArgType::String,
    required: false,
    default: ArgDefault::None,
    description: "Field to group by; returns one row per value with a count",
};

const SERVICE: ArgSpec = ArgSpec {
    name: "service",
    arg_type: ArgType::String,
    required: false,
    default: ArgDefault::None,
    description: "Restrict results to this service",
};

static EXECUTE_SQL: ToolSpec = ToolSpec {
    kind: ToolKind::ExecuteSql,
    name: "execute_sql",
    description: "Execute a read-only SQL statement against Trino. A LIMIT is appended when the statement has none.",
    args: &[
        ArgSpec {
            name: "sql",
            arg_type: ArgType::String,
            required: true,
            default: ArgDefault::None,
            description: "SQL statement to execute",
        },
        LIMIT,
    ],
};

static QUERY_LOGS: ToolSpec = ToolSpec {
    kind: ToolKind::QueryLogs,
    name: "query_logs",
    description: "Search Datadog logs with a log search query over a relative time range.",
    args: &[
        ArgSpec {
            name: "query",
            arg_type: ArgType::String,
            required: false,
            default: ArgDefault::Str("*"),
            description: "Log search query, e.g. service:web status:error",
        },
        TIME_RANGE,
        COLUMNS,
        GROUP_BY,
        LIMIT,
    ],
};

static QUERY_SPANS: ToolSpec = ToolSpec {
    kind: ToolKind::QuerySpans,
    name: "query_spans",
    description: "Search APM spans with a span search query over a relative time range.",
    args: &[
        ArgSpec {
            name: "query",
            arg_type: ArgType::String,
            required: false,
            default: ArgDefault::Str("*"),
            description: "Span search query, e.g. resource_name:GET* @http.status_code:500",
        },
        SERVICE,
        TIME_RANGE,
        COLUMNS,
        GROUP_BY,
        LIMIT,
    ],
};

static QUERY_METRICS: ToolSpec = ToolSpec {
    kind: ToolKind::QueryMetrics,
    name: "query_metrics",
    description: "Evaluate a Datadog metric query. Pass a full metric query, or a metric name with optional aggregation, service and group_by.",
    args: &[
        ArgSpec {
            name: "query",
            arg_type: ArgType::String,
            required: false,
            default: ArgDefault::None,
            description: "Full metric query, e.g. avg:system.cpu.user{*} by {host}",
        },
        ArgSpec {
            name: "metric",
            arg_type: ArgType::String,
            required: false,
            default: ArgDefault::None,
            description: "Metric name, used when query is omitted",
        },
        ArgSpec {
            name: "aggregation",
            arg_type: ArgType::String,
            required: false,
            default: ArgDefault::Str("avg"),
            description: "Space aggregation: avg, sum, min, max or count",
        },
        SERVICE,
        GROUP_BY,
        TIME_RANGE,
        LIMIT,
    ],
};

static LIST_SERVICES: ToolSpec = ToolSpec {
    kind: ToolKind::ListServices,
    name: "list_services",
    description: "List services ranked by span volume over a relative time range.",
    args: &[TIME_RANGE, LIMIT],
};

/// Metric space aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Avg,
    Sum,
    Min,
    Max,
    Count,
}

impl Aggregation {
    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Avg => "avg",
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Count => "count",
        }
    }
}

/// Arguments of `execute_sql`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExecuteSqlArgs {
    pub sql: String,
    pub limit: u64,
}

/// Arguments of `query_logs`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogQueryArgs {
    pub query: String,
    pub time_range: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub group_by: Option<String>,
    pub limit: u64,
}

/// Arguments of `query_spans`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpanQueryArgs {
    pub query: String,
    #[serde(default)]
    pub service: Option<String>,
    pub time_range: String,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub group_by: Option<String>,
    pub limit: u64,
}

/// Arguments of `query_metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricQueryArgs {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub metric: Option<String>,
    pub aggregation: Aggregation,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub group_by: Option<String>,
    pub time_range: String,
    pub limit: u64,
}

/// Arguments of `list_services`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListServicesArgs {
    pub time_range: String,
    pub limit: u64,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ExecuteSql(ExecuteSqlArgs),
    QueryLogs(LogQueryArgs),
    QuerySpans(SpanQueryArgs),
    QueryMetrics(MetricQueryArgs),
    ListServices(ListServicesArgs),
}

impl ToolCall {
    /// Resolve a tool name and raw JSON arguments into a typed call.
    ///
    /// Missing optional arguments take their catalog defaults; unknown
    /// argument names are ignored; `null` counts as absent.
    pub fn parse(name: &str, arguments: &Value, defaults: &ToolDefaults) -> Result<Self, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_string(),
        })?;
        let spec = kind.spec();
        let filled = fill_arguments(spec, arguments, defaults)?;

        let call = match kind {
            ToolKind::ExecuteSql => ToolCall::ExecuteSql(decode(spec, filled)?),
            ToolKind::QueryLogs => ToolCall::QueryLogs(decode(spec, filled)?),
            ToolKind::QuerySpans => ToolCall::QuerySpans(decode(spec, filled)?),
            ToolKind::QueryMetrics => ToolCall::QueryMetrics(decode(spec, filled)?),
            ToolKind::ListServices => ToolCall::ListServices(decode(spec, filled)?),
        };
        call.validate()?;
        Ok(call)
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::ExecuteSql(_) => ToolKind::ExecuteSql,
            ToolCall::QueryLogs(_) => ToolKind::QueryLogs,
            ToolCall::QuerySpans(_) => ToolKind::QuerySpans,
            ToolCall::QueryMetrics(_) => ToolKind::QueryMetrics,
            ToolCall::ListServices(_) => ToolKind::ListServices,
        }
    }

    /// Requested row limit.
    pub fn limit(&self) -> u64 {
        match self {
            ToolCall::ExecuteSql(a) => a.limit,
            ToolCall::QueryLogs(a) => a.limit,
            ToolCall::QuerySpans(a) => a.limit,
            ToolCall::QueryMetrics(a) => a.limit,
            ToolCall::ListServices(a) => a.limit,
        }
    }

    fn validate(&self) -> Result<(), ToolError> {
        let tool = self.kind().name();
        let limit = self.limit();
        if limit == 0 || limit > MAX_LIMIT {
            return Err(ToolError::invalid(
                tool,
                format!("limit must be between 1 and {}, got {}", MAX_LIMIT, limit),
            ));
        }

        match self {
            ToolCall::ExecuteSql(args) if crate::sql::trim_statement(&args.sql).is_empty() => {
                Err(ToolError::invalid(tool, "sql must not be empty"))
            }
            ToolCall::QueryMetrics(args) if args.query.is_none() && args.metric.is_none() => {
                Err(ToolError::invalid(tool, "either query or metric is required"))
            }
            ToolCall::QueryLogs(LogQueryArgs { group_by: Some(g), .. })
            | ToolCall::QuerySpans(SpanQueryArgs { group_by: Some(g), .. })
                if g.is_empty() =>
            {
                Err(ToolError::invalid(tool, "group_by must not be empty"))
            }
            _ => Ok(()),
        }
    }
}

fn fill_arguments(
    spec: &ToolSpec,
    arguments: &Value,
    defaults: &ToolDefaults,
) -> Result<Map<String, Value>, ToolError> {
    let provided = match arguments {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        other => {
            return Err(ToolError::invalid(
                spec.name,
                format!("arguments must be an object, got {}", json_type(other)),
            ));
        }
    };

    let mut filled = Map::new();
    for arg in spec.args {
        let value = match provided.get(arg.name) {
            Some(Value::Null) | None => arg.default.resolve(defaults),
            Some(value) => Some(check_type(spec, arg, value)?),
        };
        match value {
            Some(value) => {
                filled.insert(arg.name.to_string(), value);
            }
            None if arg.required => {
                return Err(ToolError::invalid(
                    spec.name,
                    format!("missing required argument '{}'", arg.name),
                ));
            }
            None => {}
        }
    }
    Ok(filled)
}

fn check_type(spec: &ToolSpec, arg: &ArgSpec, value: &Value) -> Result<Value, ToolError> {
    let mismatch = |expected: &str| {
        ToolError::invalid(
            spec.name,
            format!(
                "argument '{}' must be {}, got {}",
                arg.name,
                expected,
                json_type(value)
            ),
        )
    };

    match (arg.arg_type, value) {
        (ArgType::String, Value::String(_)) => Ok(value.clone()),
        (ArgType::String, _) => Err(mismatch("a string")),
        (ArgType::Integer, Value::Number(n)) if n.is_u64() => Ok(value.clone()),
        // Some clients send numbers as strings.
        (ArgType::Integer, Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| mismatch("a non-negative integer")),
        (ArgType::Integer, _) => Err(mismatch("a non-negative integer")),
        (ArgType::StringArray, Value::Array(items)) if items.iter().all(Value::is_string) => {
            Ok(value.clone())
        }
        (ArgType::StringArray, _) => Err(mismatch("an array of strings")),
    }
}

fn decode<T: for<'de> Deserialize<'de>>(
    spec: &ToolSpec,
    filled: Map<String, Value>,
) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(filled))
        .map_err(|e| ToolError::invalid(spec.name, e.to_string()))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
