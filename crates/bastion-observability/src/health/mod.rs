//! Health reporting: per-subsystem checks folded into one [`HealthReport`].

mod reporter;
mod subsystem_checks;

pub use reporter::{HealthReporter, HealthSnapshot};
pub use subsystem_checks::SubsystemChecker;

pub use bastion_core::models::HealthReport;
