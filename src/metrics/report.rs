use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use tracing::warn;

use super::SlowQueryMetrics;
use crate::error::AppResult;

// ─── Graph definition ────────────────────────────────────────────

/// Environment variable the monitoring agent sets when it wants the
/// graph definition instead of values.
pub const META_ENV: &str = "MACKEREL_AGENT_PLUGIN_META";

const META_HEADER: &str = "# mackerel-agent-plugin";

pub const GRAPH_NAME: &str = "slow_queries";

#[derive(Debug, Serialize)]
pub struct GraphDefinition {
    pub graphs: BTreeMap<String, Graph>,
}

#[derive(Debug, Serialize)]
pub struct Graph {
    pub label: &'static str,
    pub unit: &'static str,
    pub metrics: Vec<GraphMetric>,
}

#[derive(Debug, Serialize)]
pub struct GraphMetric {
    pub name: &'static str,
    pub label: &'static str,
    pub stacked: bool,
}

impl GraphDefinition {
    pub fn slow_queries(prefix: &str) -> Self {
        let metric = |name, label| GraphMetric {
            name,
            label,
            stacked: false,
        };
        let graph = Graph {
            label: "MongoDB Slow Queries",
            unit: "integer",
            metrics: vec![
                metric("count", "Slow Queries"),
                metric("total_time", "Total Time (ms)"),
                metric("average_time", "Average Time (ms)"),
            ],
        };

        Self {
            graphs: BTreeMap::from([(format!("{prefix}.{GRAPH_NAME}"), graph)]),
        }
    }
}

// ─── Writers ─────────────────────────────────────────────────────

/// Print the agent's meta header followed by the graph JSON.
pub fn write_meta<W: Write>(out: &mut W, prefix: &str) -> AppResult<()> {
    let json = serde_json::to_string(&GraphDefinition::slow_queries(prefix))?;
    writeln!(out, "{META_HEADER}")?;
    writeln!(out, "{json}")?;
    Ok(())
}

/// One `key\tvalue\tepoch` line per gauge.
pub fn write_values<W: Write>(
    out: &mut W,
    prefix: &str,
    metrics: &SlowQueryMetrics,
    epoch: i64,
) -> std::io::Result<()> {
    for (name, value) in metrics.values() {
        let key = format!("{prefix}.{GRAPH_NAME}.{name}");
        if !value.is_finite() {
            warn!(%key, value, "skipping non-finite metric");
            continue;
        }
        writeln!(out, "{key}\t{value:.6}\t{epoch}")?;
    }
    Ok(())
}
