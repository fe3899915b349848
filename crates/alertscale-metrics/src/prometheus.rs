//! Prometheus text exposition format.
//!
//! Renders the scaling counters and the replica bounds of every registered
//! function for scraping by a Prometheus server or compatible agent.

use alertscale_state::FunctionReplicas;

use crate::collector::ScaleCounters;

/// Render counters and per-function gauges into Prometheus text format.
///
/// Counters carry no labels except `alertscale_alerts_received_total`
/// (`alertname`); gauges are labelled `function_name="name.namespace"`.
pub fn render_prometheus(counters: &ScaleCounters, functions: &[FunctionReplicas]) -> String {
    let mut out = String::new();

    out.push_str("# HELP alertscale_alerts_received_total Alerts received by alert name.\n");
    out.push_str("# TYPE alertscale_alerts_received_total counter\n");
    for (name, count) in &counters.alerts_received {
        out.push_str(&format!(
            "alertscale_alerts_received_total{{alertname=\"{}\"}} {}\n",
            escape_label(name),
            count
        ));
    }

    counter(
        &mut out,
        "alertscale_scale_ups_total",
        "Replica increases applied.",
        counters.scale_ups,
    );
    counter(
        &mut out,
        "alertscale_scale_downs_total",
        "Replica decreases applied.",
        counters.scale_downs,
    );
    counter(
        &mut out,
        "alertscale_unchanged_total",
        "Alerts that left the replica count unchanged.",
        counters.unchanged,
    );
    counter(
        &mut out,
        "alertscale_ignored_total",
        "Alerts with no resolvable function name.",
        counters.ignored,
    );
    counter(
        &mut out,
        "alertscale_read_failures_total",
        "Replica reads that failed.",
        counters.read_failures,
    );
    counter(
        &mut out,
        "alertscale_write_failures_total",
        "Replica writes that failed.",
        counters.write_failures,
    );

    gauge(
        &mut out,
        "alertscale_function_replicas",
        "Current replica count for function.",
        functions,
        |f| f.replicas,
    );
    gauge(
        &mut out,
        "alertscale_function_min_replicas",
        "Minimum replicas for function.",
        functions,
        |f| f.min_replicas,
    );
    gauge(
        &mut out,
        "alertscale_function_max_replicas",
        "Maximum replicas for function.",
        functions,
        |f| f.max_replicas,
    );

    out
}

fn counter(out: &mut String, name: &str, help: &str, value: u64) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} counter\n"));
    out.push_str(&format!("{name} {value}\n"));
}

fn gauge(
    out: &mut String,
    name: &str,
    help: &str,
    functions: &[FunctionReplicas],
    value: impl Fn(&FunctionReplicas) -> u64,
) {
    out.push_str(&format!("# HELP {name} {help}\n"));
    out.push_str(&format!("# TYPE {name} gauge\n"));
    for f in functions {
        out.push_str(&format!(
            "{name}{{function_name=\"{}\"}} {}\n",
            escape_label(&f.qualified_name()),
            value(f)
        ));
    }
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
