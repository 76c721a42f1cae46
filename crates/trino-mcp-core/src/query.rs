//! Query compilation.
//!
//! Each tool has one template function. All of them share the same shape:
//! resolve the time range into a negative offset, pick a template from the
//! grouping and filter arguments, and interpolate identifiers and literals
//! through the helpers in [`crate::sql`].
//!
//! Templated tools always end in exactly one `LIMIT`. Only `execute_sql`
//! takes caller-written SQL, and it gets a `LIMIT` appended on its own line
//! only when the statement does not already contain one. The line break keeps
//! a trailing `--` comment from swallowing the appended clause.

use crate::sql::{column_list, existing_limit, has_limit_clause, quote_ident, quote_literal, trim_statement};
use crate::time_range::to_offset_seconds;
use crate::tools::{
    ExecuteSqlArgs, ListServicesArgs, LogQueryArgs, MetricQueryArgs, SpanQueryArgs, ToolCall,
};

/// SQL text ready for execution, plus the row limit it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub sql: String,
    /// `None` when caller-written SQL carries a LIMIT we could not read.
    pub declared_limit: Option<u64>,
}

impl CompiledQuery {
    fn limited(sql: String, limit: u64) -> Self {
        Self {
            sql: format!("{} LIMIT {}", sql, limit),
            declared_limit: Some(limit),
        }
    }

    fn capped_statement(sql: &str, limit: u64) -> Self {
        Self {
            sql: format!("{}\nLIMIT {}", sql, limit),
            declared_limit: Some(limit),
        }
    }
}

/// Data sources exposed as table functions by the engine's Datadog connector.
#[derive(Debug, Clone, Copy)]
enum Source {
    Logs,
    Spans,
    Metrics,
}

impl Source {
    fn function(self) -> &'static str {
        match self {
            Source::Logs => "logs",
            Source::Spans => "spans",
            Source::Metrics => "metrics",
        }
    }
}

/// Compiles typed tool calls into SQL.
pub struct QueryCompiler;

impl QueryCompiler {
    /// Compile a tool call. Deterministic: the same call always yields the same text.
    pub fn compile(call: &ToolCall) -> CompiledQuery {
        match call {
            ToolCall::ExecuteSql(args) => Self::execute_sql(args),
            ToolCall::QueryLogs(args) => Self::query_logs(args),
            ToolCall::QuerySpans(args) => Self::query_spans(args),
            ToolCall::QueryMetrics(args) => Self::query_metrics(args),
            ToolCall::ListServices(args) => Self::list_services(args),
        }
    }

    fn execute_sql(args: &ExecuteSqlArgs) -> CompiledQuery {
        let statement = trim_statement(&args.sql);
        if has_limit_clause(statement) {
            CompiledQuery {
                sql: statement.to_string(),
                declared_limit: existing_limit(statement),
            }
        } else {
            CompiledQuery::capped_statement(statement, args.limit)
        }
    }

    fn query_logs(args: &LogQueryArgs) -> CompiledQuery {
        let source = table_function(Source::Logs, &args.query, &args.time_range);
        event_select(
            &source,
            args.columns.as_deref(),
            args.group_by.as_deref(),
            None,
            args.limit,
        )
    }

    fn query_spans(args: &SpanQueryArgs) -> CompiledQuery {
        let source = table_function(Source::Spans, &args.query, &args.time_range);
        let filter = args
            .service
            .as_deref()
            .map(|service| format!("{} = {}", quote_ident("service"), quote_literal(service)));
        event_select(
            &source,
            args.columns.as_deref(),
            args.group_by.as_deref(),
            filter.as_deref(),
            args.limit,
        )
    }

    fn query_metrics(args: &MetricQueryArgs) -> CompiledQuery {
        let query = match (&args.query, &args.metric) {
            (Some(query), _) => query.clone(),
            (None, Some(metric)) => metric_query(
                args.aggregation.as_str(),
                metric,
                args.service.as_deref(),
                args.group_by.as_deref(),
            ),
            // Rejected during argument validation.
            (None, None) => "*".to_string(),
        };
        let source = table_function(Source::Metrics, &query, &args.time_range);
        CompiledQuery::limited(format!("SELECT * FROM {}", source), args.limit)
    }

    fn list_services(args: &ListServicesArgs) -> CompiledQuery {
        let source = table_function(Source::Spans, "*", &args.time_range);
        let service = quote_ident("service");
        let count = quote_ident("span_count");
        CompiledQuery::limited(
            format!(
                "SELECT {service}, COUNT(*) AS {count} FROM {source} GROUP BY {service} ORDER BY {count} DESC"
            ),
            args.limit,
        )
    }
}

/// `TABLE(<fn>(QUERY => '<q>', MIN_TIMESTAMP => <offset>, MAX_TIMESTAMP => 0))`
fn table_function(source: Source, query: &str, time_range: &str) -> String {
    format!(
        "TABLE({}(QUERY => {}, MIN_TIMESTAMP => {}, MAX_TIMESTAMP => 0))",
        source.function(),
        quote_literal(query),
        to_offset_seconds(time_range)
    )
}

fn event_select(
    source: &str,
    columns: Option<&[String]>,
    group_by: Option<&str>,
    filter: Option<&str>,
    limit: u64,
) -> CompiledQuery {
    let where_clause = filter.map(|f| format!(" WHERE {}", f)).unwrap_or_default();
    let sql = match group_by {
        Some(field) => {
            let field = quote_ident(field);
            let count = quote_ident("count");
            format!(
                "SELECT {field}, COUNT(*) AS {count} FROM {source}{where_clause} GROUP BY {field} ORDER BY {count} DESC"
            )
        }
        None => format!("SELECT {} FROM {}{}", column_list(columns), source, where_clause),
    };
    CompiledQuery::limited(sql, limit)
}

/// Build a metric query string such as `avg:trace.http.request.hits{service:web} by {host}`.
fn metric_query(
    aggregation: &str,
    metric: &str,
    service: Option<&str>,
    group_by: Option<&str>,
) -> String {
    let scope = service
        .map(|s| format!("service:{}", s))
        .unwrap_or_else(|| "*".to_string());
    let mut query = format!("{}:{}{{{}}}", aggregation, metric, scope);
    if let Some(group) = group_by {
        query.push_str(&format!(" by {{{}}}", group));
    }
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolDefaults;
    use serde_json::json;

    fn compile(name: &str, args: serde_json::Value) -> CompiledQuery {
        let call = ToolCall::parse(name, &args, &ToolDefaults::default()).unwrap();
        QueryCompiler::compile(&call)
    }

    fn limit_count(sql: &str) -> usize {
        sql.to_ascii_uppercase().matches("LIMIT").count()
    }

    #[test]
    fn test_query_logs_scenario() {
        let compiled = compile(
            "query_logs",
            json!({ "query": "message:*", "time_range": "24h", "limit": 50 }),
        );
        assert_eq!(
            compiled.sql,
            "SELECT * FROM TABLE(logs(QUERY => 'message:*', MIN_TIMESTAMP => -86400, MAX_TIMESTAMP => 0)) LIMIT 50"
        );
        assert!(compiled.sql.contains("MIN_TIMESTAMP => -86400"));
        assert!(compiled.sql.contains("MAX_TIMESTAMP => 0"));
        assert_eq!(compiled.sql.matches("LIMIT 50").count(), 1);
        assert_eq!(compiled.declared_limit, Some(50));
    }

    #[test]
    fn test_query_logs_columns_and_group_by() {
        let compiled = compile(
            "query_logs",
            json!({ "query": "status:error", "columns": ["timestamp", "message"] }),
        );
        assert_eq!(
            compiled.sql,
            "SELECT \"timestamp\", \"message\" FROM TABLE(logs(QUERY => 'status:error', MIN_TIMESTAMP => -3600, MAX_TIMESTAMP => 0)) LIMIT 100"
        );

        let compiled = compile("query_logs", json!({ "group_by": "host", "limit": 10 }));
        assert_eq!(
            compiled.sql,
            "SELECT \"host\", COUNT(*) AS \"count\" FROM TABLE(logs(QUERY => '*', MIN_TIMESTAMP => -3600, MAX_TIMESTAMP => 0)) GROUP BY \"host\" ORDER BY \"count\" DESC LIMIT 10"
        );
    }

    #[test]
    fn test_query_spans_service_filter() {
        let compiled = compile(
            "query_spans",
            json!({ "service": "o'brien", "time_range": "30m", "group_by": "resource_name" }),
        );
        assert_eq!(
            compiled.sql,
            "SELECT \"resource_name\", COUNT(*) AS \"count\" FROM TABLE(spans(QUERY => '*', MIN_TIMESTAMP => -1800, MAX_TIMESTAMP => 0)) WHERE \"service\" = 'o''brien' GROUP BY \"resource_name\" ORDER BY \"count\" DESC LIMIT 100"
        );
    }

    #[test]
    fn test_query_metrics_from_metric_name() {
        let compiled = compile(
            "query_metrics",
            json!({ "metric": "trace.http.request.hits", "aggregation": "sum", "service": "web", "group_by": "host", "time_range": "7d" }),
        );
        assert_eq!(
            compiled.sql,
            "SELECT * FROM TABLE(metrics(QUERY => 'sum:trace.http.request.hits{service:web} by {host}', MIN_TIMESTAMP => -604800, MAX_TIMESTAMP => 0)) LIMIT 100"
        );
    }

    #[test]
    fn test_query_metrics_explicit_query_wins() {
        let compiled = compile(
            "query_metrics",
            json!({ "query": "max:system.load.1{*}", "metric": "ignored" }),
        );
        assert!(compiled.sql.contains("QUERY => 'max:system.load.1{*}'"));
        assert!(!compiled.sql.contains("ignored"));
    }

    #[test]
    fn test_list_services() {
        let compiled = compile("list_services", json!({ "limit": 5 }));
        assert_eq!(
            compiled.sql,
            "SELECT \"service\", COUNT(*) AS \"span_count\" FROM TABLE(spans(QUERY => '*', MIN_TIMESTAMP => -3600, MAX_TIMESTAMP => 0)) GROUP BY \"service\" ORDER BY \"span_count\" DESC LIMIT 5"
        );
    }

    #[test]
    fn test_malformed_time_range_uses_one_hour() {
        let compiled = compile("query_logs", json!({ "time_range": "yesterday" }));
        assert!(compiled.sql.contains("MIN_TIMESTAMP => -3600"));
    }

    #[test]
    fn test_execute_sql_appends_limit_once() {
        let compiled = compile("execute_sql", json!({ "sql": "SELECT 1;", "limit": 7 }));
        assert_eq!(compiled.sql, "SELECT 1\nLIMIT 7");
        assert_eq!(compiled.declared_limit, Some(7));

        let compiled = compile("execute_sql", json!({ "sql": "SELECT 1" }));
        assert_eq!(compiled.sql, "SELECT 1\nLIMIT 100");
    }

    #[test]
    fn test_execute_sql_limit_survives_trailing_line_comment() {
        let compiled = compile(
            "execute_sql",
            json!({ "sql": "SELECT * FROM big -- all rows", "limit": 10 }),
        );
        assert_eq!(compiled.sql, "SELECT * FROM big -- all rows\nLIMIT 10");
        assert_eq!(compiled.declared_limit, Some(10));

        let last_line = compiled.sql.lines().last().unwrap();
        assert_eq!(last_line, "LIMIT 10");
    }

    #[test]
    fn test_execute_sql_keeps_existing_limit() {
        for sql in [
            "SELECT * FROM t LIMIT 10",
            "select * from t limit 10",
            "SELECT * FROM t\nLiMiT 10",
            "SELECT * FROM t LIMIT ALL",
        ] {
            let compiled = compile("execute_sql", json!({ "sql": sql, "limit": 500 }));
            assert_eq!(compiled.sql, sql);
            assert_eq!(limit_count(&compiled.sql), 1, "sql {:?}", sql);
            assert!(!compiled.sql.contains("500"));
        }
        let compiled = compile("execute_sql", json!({ "sql": "SELECT 1 LIMIT 3" }));
        assert_eq!(compiled.declared_limit, Some(3));
        let compiled = compile("execute_sql", json!({ "sql": "SELECT 1 LIMIT ALL" }));
        assert_eq!(compiled.declared_limit, None);
    }

    #[test]
    fn test_templated_tools_have_exactly_one_limit() {
        let calls = [
            ("query_logs", json!({})),
            ("query_logs", json!({ "group_by": "status" })),
            ("query_spans", json!({ "service": "web" })),
            ("query_metrics", json!({ "metric": "m" })),
            ("list_services", json!({})),
        ];
        for (name, args) in calls {
            let compiled = compile(name, args);
            assert_eq!(limit_count(&compiled.sql), 1, "{}: {}", name, compiled.sql);
        }
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let args = json!({ "query": "env:prod", "service": "api", "columns": ["a", "b"], "limit": 12 });
        let first = compile("query_spans", args.clone());
        let second = compile("query_spans", args);
        assert_eq!(first, second);
    }

    #[test]
    fn test_literals_and_identifiers_are_escaped() {
        let compiled = compile(
            "query_logs",
            json!({ "query": "msg:'x'); DROP TABLE t; --", "columns": ["a\"b"] }),
        );
        assert!(compiled.sql.contains("QUERY => 'msg:''x''); DROP TABLE t; --'"));
        assert!(compiled.sql.starts_with("SELECT \"a\"\"b\" FROM"));
    }
}
