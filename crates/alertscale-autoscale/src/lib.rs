//! alertscale-autoscale — alert-driven replica scaling.
//!
//! Consumes Alertmanager alerts, reads the target function's replica
//! bounds through a [`ServiceQuery`], and writes a new replica count when
//! the policy asks for one.
//!
//! # Replica Policy
//!
//! ```text
//! step = ceil(max_replicas * scaling_factor / 100)
//!
//! APIHighInvocationRate, firing, step > 0:
//!     desired = min(current + step, max_replicas)
//!
//! InstanceDown, firing:
//!     desired = current / 2
//!
//! anything else:
//!     desired = min_replicas
//! ```
//!
//! A write is issued only when `desired != current`. Read failures and
//! unresolvable function names are skipped; only write failures are
//! reported back to the caller, one [`ScaleError`] per failed alert.

pub mod error;
pub mod policy;
pub mod query;
pub mod scaler;

pub use error::{QueryError, ScaleError};
pub use policy::{calculate_replicas, scale_step};
pub use query::{ServiceQuery, ServiceQueryResponse};
pub use scaler::{Autoscaler, ScaleOutcome, format_errors};
