mod severity_policy;

pub use severity_policy::{RiskLevel, SeverityPolicy};
