//! Replica policy — maps an alert and the observed replica bounds to a
//! desired replica count. Pure; no I/O.

use alertscale_core::{AlertName, AlertStatus};
use tracing::debug;

/// Scale-up step: `ceil(max_replicas * scaling_factor / 100)`.
pub fn scale_step(max_replicas: u64, scaling_factor: u64) -> u64 {
    max_replicas.saturating_mul(scaling_factor).div_ceil(100)
}

/// Decide the replica count a function should run with after `alert_name`
/// transitioned to `status`.
///
/// Total over its inputs. `InstanceDown` halves while the alert is
/// `firing`; its `resolved` transition falls through to `min_replicas`.
pub fn calculate_replicas(
    alert_name: &AlertName,
    status: AlertStatus,
    current_replicas: u64,
    max_replicas: u64,
    min_replicas: u64,
    scaling_factor: u64,
) -> u64 {
    let step = scale_step(max_replicas, scaling_factor);

    let desired = match (alert_name, status) {
        (AlertName::HighInvocationRate, AlertStatus::Firing) if step > 0 => {
            current_replicas.saturating_add(step).min(max_replicas)
        }
        (AlertName::InstanceDown, AlertStatus::Firing) => current_replicas / 2,
        // Zero step: scale-up disabled for this function.
        (AlertName::HighInvocationRate, AlertStatus::Firing) => min_replicas,
        (AlertName::HighInvocationRate | AlertName::InstanceDown, AlertStatus::Resolved)
        | (AlertName::Other(_), _) => min_replicas,
    };

    debug!(
        alert = %alert_name,
        %status,
        current = current_replicas,
        step,
        desired,
        "replica policy evaluated"
    );
    desired
}
