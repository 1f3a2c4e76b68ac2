//! Optional observability interfaces implemented by contention-aware
//! components: flow patterns and utilisation snapshots consumed by
//! external flow analysers / dashboards.
//!
//! A trait-based "contract" shape applied here to
//! `FlowAnalyzable`/`UtilizationProvider`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A conditional outflow entry: under some condition, a fraction of flow
/// diverts to a different downstream target at a different rate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionalFlow {
    pub condition: String,
    pub target: String,
    pub rate: f64,
}

/// A snapshot of how a component's input rate fans out to its
/// dependencies, along with its own success rate and amplification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowPattern {
    pub outflows: HashMap<String, f64>,
    pub success_rate: f64,
    pub amplification: f64,
    pub service_time: f64,
    pub conditional_flows: Vec<ConditionalFlow>,
}

impl FlowPattern {
    pub fn new(service_time: f64) -> Self {
        Self {
            outflows: HashMap::new(),
            success_rate: 1.0,
            amplification: 1.0,
            service_time,
            conditional_flows: Vec::new(),
        }
    }

    pub fn with_outflow(mut self, target: impl Into<String>, rate: f64) -> Self {
        self.outflows.insert(target.into(), rate);
        self
    }

    pub fn with_success_rate(mut self, success_rate: f64) -> Self {
        self.success_rate = success_rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_amplification(mut self, amplification: f64) -> Self {
        self.amplification = amplification;
        self
    }
}

/// A utilisation snapshot for one resource within a component hierarchy.
/// `utilisation` is normally in `[0, 1]` but may exceed `1.0` for an
/// unstable/overloaded resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtilizationInfo {
    pub resource_name: String,
    pub component_path: String,
    pub utilization: f64,
    pub capacity: f64,
    pub current_load: f64,
    pub warning_threshold: f64,
    pub critical_threshold: f64,
    pub is_bottleneck: bool,
}

impl UtilizationInfo {
    pub fn new(resource_name: impl Into<String>, capacity: f64, current_load: f64) -> Self {
        let utilization = if capacity > 0.0 {
            current_load / capacity
        } else {
            f64::INFINITY
        };
        Self {
            resource_name: resource_name.into(),
            component_path: String::new(),
            utilization,
            capacity,
            current_load,
            warning_threshold: 0.7,
            critical_threshold: 0.9,
            is_bottleneck: false,
        }
    }

    /// Prefixes `component_path` with `parent`, used by hierarchical
    /// components propagating a child's utilisation snapshot upward.
    pub fn under(mut self, parent: &str) -> Self {
        self.component_path = if self.component_path.is_empty() {
            parent.to_string()
        } else {
            format!("{parent}.{}", self.component_path)
        };
        self
    }

    pub fn bottleneck(mut self, is_bottleneck: bool) -> Self {
        self.is_bottleneck = is_bottleneck;
        self
    }
}

/// Implemented by components whose operations can be described as a flow
/// pattern for a given method and input rate.
pub trait FlowAnalyzable {
    fn get_flow_pattern(&self, method_name: &str, input_rate: f64) -> FlowPattern;
}

/// Implemented by components that can report utilisation snapshots for
/// their owned resources (and, transitively, their dependencies').
pub trait UtilizationProvider {
    fn get_utilization_info(&self) -> Vec<UtilizationInfo>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_info_computes_ratio() {
        let info = UtilizationInfo::new("pool", 10.0, 5.0);
        assert!((info.utilization - 0.5).abs() < 1e-9);
    }

    #[test]
    fn utilization_info_path_prefixing() {
        let info = UtilizationInfo::new("disk", 1.0, 0.5).under("index").under("service");
        assert_eq!(info.component_path, "service.index");
    }

    #[test]
    fn flow_pattern_builder_chains() {
        let fp = FlowPattern::new(0.01)
            .with_outflow("disk", 1.0)
            .with_success_rate(0.99)
            .with_amplification(2.0);
        assert_eq!(fp.outflows.get("disk"), Some(&1.0));
        assert!((fp.success_rate - 0.99).abs() < 1e-9);
    }
}
