//! Workload namespace resolution.

/// Split a possibly namespace-qualified function name into `(name, namespace)`.
///
/// `"figlet.openfaas-fn"` resolves to `("figlet", "openfaas-fn")`. The split
/// happens on the last `.`; an unqualified name falls back to
/// `default_namespace`.
pub fn get_namespace(default_namespace: &str, full_name: &str) -> (String, String) {
    match full_name.rsplit_once('.') {
        Some((name, namespace)) => (name.to_string(), namespace.to_string()),
        None => (full_name.to_string(), default_namespace.to_string()),
    }
}
