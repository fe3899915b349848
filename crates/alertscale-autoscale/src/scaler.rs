//! Autoscaler — per-alert scaling decisions and batch dispatch.
//!
//! For every alert the autoscaler resolves the target function, reads its
//! replica bounds through the [`ServiceQuery`], asks the replica policy for
//! a desired count, and writes it back when it differs. A batch is handled
//! sequentially; one alert failing never stops the rest.

use std::sync::{Arc, Mutex, PoisonError};

use alertscale_core::{PrometheusInnerAlert, get_namespace};
use alertscale_metrics::ScaleMetrics;
use alertscale_state::function_key;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::error::ScaleError;
use crate::policy::calculate_replicas;
use crate::query::ServiceQuery;

/// What a single alert did to its function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// The alert's function name resolved to an empty name.
    Ignored,
    /// The replica read failed; the alert is dropped until it fires again.
    ReadFailed,
    /// Desired count equals the current count, nothing written.
    Unchanged { replicas: u64 },
    /// A new replica count was written.
    Scaled { from: u64, to: u64 },
}

/// Applies alerts to the replica counts behind a [`ServiceQuery`].
///
/// Reads and writes for the same function are serialized by a
/// per-function lease, so concurrent dispatches sharing one autoscaler
/// never interleave a read and a write on that function.
pub struct Autoscaler<Q> {
    service: Q,
    default_namespace: String,
    metrics: Arc<ScaleMetrics>,
    /// Per-function leases keyed by `{namespace}/{name}`.
    leases: DashMap<String, Arc<Mutex<()>>>,
}

impl<Q: ServiceQuery> Autoscaler<Q> {
    /// Create an autoscaler resolving unqualified function names into
    /// `default_namespace`.
    pub fn new(service: Q, default_namespace: impl Into<String>) -> Self {
        Self {
            service,
            default_namespace: default_namespace.into(),
            metrics: Arc::new(ScaleMetrics::new()),
            leases: DashMap::new(),
        }
    }

    /// Share an existing metrics sink instead of a private one.
    pub fn with_metrics(mut self, metrics: Arc<ScaleMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn service(&self) -> &Q {
        &self.service
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    pub fn metrics(&self) -> &Arc<ScaleMetrics> {
        &self.metrics
    }

    /// Apply every alert in order and collect the write failures.
    ///
    /// Never short-circuits and never retries; an empty result means every
    /// alert was either applied or deliberately skipped.
    pub fn handle_alerts(&self, alerts: &[PrometheusInnerAlert]) -> Vec<ScaleError> {
        let mut errors = Vec::new();
        for alert in alerts {
            if let Err(e) = self.scale_service(alert) {
                warn!(error = %e, "alert could not be applied");
                errors.push(e);
            }
        }
        debug!(alerts = alerts.len(), failed = errors.len(), "alert batch handled");
        errors
    }

    /// Apply a single alert.
    ///
    /// Only a failed replica write is an error. An unresolvable name or a
    /// failed read is logged and reported as an `Ok` outcome, since the
    /// alert will fire again if the condition persists.
    pub fn scale_service(&self, alert: &PrometheusInnerAlert) -> Result<ScaleOutcome, ScaleError> {
        let alert_name = &alert.labels.alert_name;
        self.metrics.record_alert(alert_name.metric_label());

        let (service_name, namespace) =
            get_namespace(&self.default_namespace, &alert.labels.function_name);
        if service_name.is_empty() {
            warn!(
                alert = %alert_name,
                function_name = %alert.labels.function_name,
                "alert has no resolvable function name, ignoring"
            );
            self.metrics.record_ignored();
            return Ok(ScaleOutcome::Ignored);
        }

        let key = function_key(&service_name, &namespace);
        let lease = self.lease(&key);
        let result = {
            let _held = lease.lock().unwrap_or_else(PoisonError::into_inner);
            self.scale_leased(alert, service_name, namespace)
        };
        self.release(&key, &lease);
        result
    }

    /// Read, decide and write for one resolved function. Runs with the
    /// function's lease held.
    fn scale_leased(
        &self,
        alert: &PrometheusInnerAlert,
        service_name: String,
        namespace: String,
    ) -> Result<ScaleOutcome, ScaleError> {
        let alert_name = &alert.labels.alert_name;

        let query = match self.service.get_replicas(&service_name, &namespace) {
            Ok(query) => query,
            Err(e) => {
                warn!(
                    function = %service_name,
                    %namespace,
                    error = %e,
                    "unable to read replicas, skipping alert"
                );
                self.metrics.record_read_failure();
                return Ok(ScaleOutcome::ReadFailed);
            }
        };

        let new_replicas = calculate_replicas(
            alert_name,
            alert.status,
            query.replicas,
            query.max_replicas,
            query.min_replicas,
            query.scaling_factor,
        );

        info!(
            function = %service_name,
            %namespace,
            alert = %alert_name,
            status = %alert.status,
            from = query.replicas,
            to = new_replicas,
            "scale"
        );

        if new_replicas == query.replicas {
            self.metrics.record_unchanged();
            return Ok(ScaleOutcome::Unchanged {
                replicas: new_replicas,
            });
        }

        if let Err(source) = self
            .service
            .set_replicas(&service_name, &namespace, new_replicas)
        {
            self.metrics.record_write_failure();
            return Err(ScaleError {
                function: service_name,
                namespace,
                replicas: new_replicas,
                source,
            });
        }

        self.metrics.record_scaled(query.replicas, new_replicas);
        Ok(ScaleOutcome::Scaled {
            from: query.replicas,
            to: new_replicas,
        })
    }

    fn lease(&self, key: &str) -> Arc<Mutex<()>> {
        self.leases.entry(key.to_string()).or_default().clone()
    }

    /// Drop the lease entry once no other dispatch holds or awaits it.
    ///
    /// The map's reference plus `lease` make a count of two. Entry lookups
    /// take the same shard lock as `remove_if`, so no new holder can appear
    /// while the count is checked.
    fn release(&self, key: &str, lease: &Arc<Mutex<()>>) {
        self.leases
            .remove_if(key, |_, held| Arc::ptr_eq(held, lease) && Arc::strong_count(held) == 2);
    }
}

/// Render errors as `[index] message` lines, one per failed alert.
pub fn format_errors(errors: &[ScaleError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, e)| format!("[{i}] {e}\n"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alertscale_core::{AlertName, AlertStatus};
    use alertscale_state::{FunctionReplicas, StateStore};

    use crate::error::QueryError;
    use crate::query::ServiceQueryResponse;

    const NS: &str = "openfaas-fn";

    /// Wraps a `StateStore`, counting writes and failing them for chosen
    /// functions.
    struct RecordingQuery {
        store: StateStore,
        writes: AtomicUsize,
        fail_writes_for: HashSet<String>,
        fail_reads: bool,
    }

    impl RecordingQuery {
        fn new(store: StateStore) -> Self {
            Self {
                store,
                writes: AtomicUsize::new(0),
                fail_writes_for: HashSet::new(),
                fail_reads: false,
            }
        }

        fn failing_writes_for(mut self, name: &str) -> Self {
            self.fail_writes_for.insert(name.to_string());
            self
        }

        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    impl ServiceQuery for RecordingQuery {
        fn get_replicas(
            &self,
            service: &str,
            namespace: &str,
        ) -> Result<ServiceQueryResponse, QueryError> {
            if self.fail_reads {
                return Err(QueryError::Other(anyhow::anyhow!("orchestrator unavailable")));
            }
            ServiceQuery::get_replicas(&self.store, service, namespace)
        }

        fn set_replicas(
            &self,
            service: &str,
            namespace: &str,
            count: u64,
        ) -> Result<(), QueryError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes_for.contains(service) {
                return Err(QueryError::Other(anyhow::anyhow!("update rejected")));
            }
            ServiceQuery::set_replicas(&self.store, service, namespace, count)
        }
    }

    fn register(store: &StateStore, name: &str, replicas: u64, max: u64, factor: u64) {
        store
            .put_function(&FunctionReplicas {
                name: name.to_string(),
                namespace: NS.to_string(),
                replicas,
                min_replicas: 1,
                max_replicas: max,
                scaling_factor: factor,
                available_replicas: replicas,
                updated_at: 1000,
            })
            .unwrap();
    }

    fn replicas(store: &StateStore, name: &str) -> u64 {
        store
            .get_function(&function_key(name, NS))
            .unwrap()
            .unwrap()
            .replicas
    }

    fn high_rate(function: &str) -> PrometheusInnerAlert {
        PrometheusInnerAlert::new(AlertName::HighInvocationRate, AlertStatus::Firing, function)
    }

    fn scaler(store: &StateStore) -> Autoscaler<RecordingQuery> {
        Autoscaler::new(RecordingQuery::new(store.clone()), NS)
    }

    #[test]
    fn high_rate_alert_scales_up() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 4, 10, 50);
        let scaler = scaler(&store);

        let outcome = scaler.scale_service(&high_rate("figlet")).unwrap();

        assert_eq!(outcome, ScaleOutcome::Scaled { from: 4, to: 9 });
        assert_eq!(replicas(&store, "figlet"), 9);
    }

    #[test]
    fn qualified_function_name_is_resolved() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 4, 10, 50);
        let scaler = Autoscaler::new(RecordingQuery::new(store.clone()), "elsewhere");

        let outcome = scaler
            .scale_service(&high_rate("figlet.openfaas-fn"))
            .unwrap();

        assert_eq!(outcome, ScaleOutcome::Scaled { from: 4, to: 9 });
    }

    #[test]
    fn instance_down_halves_replicas() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 7, 10, 50);
        let scaler = scaler(&store);

        let alert =
            PrometheusInnerAlert::new(AlertName::InstanceDown, AlertStatus::Firing, "figlet");
        let outcome = scaler.scale_service(&alert).unwrap();

        assert_eq!(outcome, ScaleOutcome::Scaled { from: 7, to: 3 });
    }

    #[test]
    fn resolved_alert_returns_to_min() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 6, 10, 50);
        let scaler = scaler(&store);

        let alert = PrometheusInnerAlert::new(
            AlertName::HighInvocationRate,
            AlertStatus::Resolved,
            "figlet",
        );
        let outcome = scaler.scale_service(&alert).unwrap();

        assert_eq!(outcome, ScaleOutcome::Scaled { from: 6, to: 1 });
    }

    #[test]
    fn unchanged_replicas_skip_write() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 10, 10, 50);
        let scaler = scaler(&store);

        let outcome = scaler.scale_service(&high_rate("figlet")).unwrap();

        assert_eq!(outcome, ScaleOutcome::Unchanged { replicas: 10 });
        assert_eq!(scaler.service().writes(), 0);
    }

    #[test]
    fn repeated_alert_writes_once() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 5, 10, 50);
        let scaler = scaler(&store);
        let alert = PrometheusInnerAlert::new(
            AlertName::Other("HighMemory".to_string()),
            AlertStatus::Firing,
            "figlet",
        );

        assert_eq!(
            scaler.scale_service(&alert).unwrap(),
            ScaleOutcome::Scaled { from: 5, to: 1 }
        );
        assert_eq!(
            scaler.scale_service(&alert).unwrap(),
            ScaleOutcome::Unchanged { replicas: 1 }
        );
        assert_eq!(scaler.service().writes(), 1);
    }

    #[test]
    fn empty_function_name_is_ignored() {
        let store = StateStore::open_in_memory().unwrap();
        let scaler = scaler(&store);

        let outcome = scaler.scale_service(&high_rate("")).unwrap();

        assert_eq!(outcome, ScaleOutcome::Ignored);
        assert_eq!(scaler.metrics().snapshot().ignored, 1);
    }

    #[test]
    fn unknown_function_is_skipped() {
        let store = StateStore::open_in_memory().unwrap();
        let scaler = scaler(&store);

        let outcome = scaler.scale_service(&high_rate("ghost")).unwrap();

        assert_eq!(outcome, ScaleOutcome::ReadFailed);
        assert_eq!(scaler.service().writes(), 0);
    }

    #[test]
    fn read_failure_is_not_an_error() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 4, 10, 50);
        let mut query = RecordingQuery::new(store.clone());
        query.fail_reads = true;
        let scaler = Autoscaler::new(query, NS);

        let errors = scaler.handle_alerts(&[high_rate("figlet")]);

        assert!(errors.is_empty());
        assert_eq!(replicas(&store, "figlet"), 4);
        assert_eq!(scaler.metrics().snapshot().read_failures, 1);
    }

    #[test]
    fn write_failure_is_reported() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 4, 10, 50);
        let scaler = Autoscaler::new(
            RecordingQuery::new(store.clone()).failing_writes_for("figlet"),
            NS,
        );

        let err = scaler.scale_service(&high_rate("figlet")).unwrap_err();

        assert_eq!(err.function, "figlet");
        assert_eq!(err.namespace, NS);
        assert_eq!(err.replicas, 9);
        assert!(err.to_string().contains("update rejected"));
        assert_eq!(replicas(&store, "figlet"), 4);
    }

    #[test]
    fn batch_continues_past_failures() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "broken", 4, 10, 50);
        register(&store, "figlet", 4, 10, 50);
        register(&store, "nodeinfo", 2, 10, 50);
        let scaler = Autoscaler::new(
            RecordingQuery::new(store.clone()).failing_writes_for("broken"),
            NS,
        );

        let errors = scaler.handle_alerts(&[
            high_rate("broken"),
            high_rate("figlet"),
            high_rate(""),
            high_rate("ghost"),
            high_rate("nodeinfo"),
        ]);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].function, "broken");
        assert_eq!(replicas(&store, "figlet"), 9);
        assert_eq!(replicas(&store, "nodeinfo"), 7);

        let counters = scaler.metrics().snapshot();
        assert_eq!(counters.alerts_total(), 5);
        assert_eq!(counters.scale_ups, 2);
        assert_eq!(counters.write_failures, 1);
        assert_eq!(counters.ignored, 1);
        assert_eq!(counters.read_failures, 1);
    }

    #[test]
    fn errors_keep_batch_order() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "a", 4, 10, 50);
        register(&store, "b", 4, 10, 50);
        let scaler = Autoscaler::new(
            RecordingQuery::new(store.clone())
                .failing_writes_for("a")
                .failing_writes_for("b"),
            NS,
        );

        let errors = scaler.handle_alerts(&[high_rate("b"), high_rate("a")]);

        let order: Vec<_> = errors.iter().map(|e| e.function.as_str()).collect();
        assert_eq!(order, ["b", "a"]);

        let text = format_errors(&errors);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[0] unable to scale function b"));
        assert!(lines[1].starts_with("[1] unable to scale function a"));
    }

    #[test]
    fn empty_batch_succeeds() {
        let store = StateStore::open_in_memory().unwrap();
        let scaler = scaler(&store);
        assert!(scaler.handle_alerts(&[]).is_empty());
        assert_eq!(format_errors(&[]), "");
    }

    #[test]
    fn concurrent_dispatch_does_not_lose_updates() {
        let store = StateStore::open_in_memory().unwrap();
        // step = ceil(100 * 1 / 100) = 1
        register(&store, "figlet", 1, 100, 1);
        let scaler = Arc::new(scaler(&store));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let scaler = Arc::clone(&scaler);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        assert!(scaler.handle_alerts(&[high_rate("figlet")]).is_empty());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(replicas(&store, "figlet"), 81);
        assert_eq!(scaler.service().writes(), 80);
        assert!(scaler.leases.is_empty());
    }

    #[test]
    fn leases_are_released_after_batch() {
        let store = StateStore::open_in_memory().unwrap();
        register(&store, "figlet", 4, 10, 50);
        let scaler = scaler(&store);

        let batch: Vec<_> = (0..100)
            .map(|i| high_rate(&format!("ghost{i}")))
            .chain([high_rate("figlet")])
            .collect();
        assert!(scaler.handle_alerts(&batch).is_empty());

        assert!(scaler.leases.is_empty());
        assert_eq!(replicas(&store, "figlet"), 9);
    }

    #[test]
    fn unknown_alert_names_share_one_counter() {
        let store = StateStore::open_in_memory().unwrap();
        let scaler = scaler(&store);

        let batch: Vec<_> = (0..50)
            .map(|i| {
                PrometheusInnerAlert::new(
                    AlertName::Other(format!("Junk{i}")),
                    AlertStatus::Firing,
                    "",
                )
            })
            .chain([high_rate("")])
            .collect();
        scaler.handle_alerts(&batch);

        let counters = scaler.metrics().snapshot();
        assert_eq!(counters.alerts_received.len(), 2);
        assert_eq!(counters.alerts_received["other"], 50);
        assert_eq!(counters.alerts_received["APIHighInvocationRate"], 1);
    }
}
