use meter_core::ResourceUsage;

/// One independently-queried usage dimension. gpu and private_ip exist in
/// the record schema but have no query, so they stay zero on the collector
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Cpu,
    Memory,
    Storage,
    PublicIp,
    TrafficIn,
    TrafficOut,
}

impl Dimension {
    /// Fixed processing order. Merge is commutative per field, but a stable
    /// order keeps runs reproducible.
    pub const COLLECTED: [Dimension; 6] = [
        Dimension::Cpu,
        Dimension::Memory,
        Dimension::Storage,
        Dimension::PublicIp,
        Dimension::TrafficIn,
        Dimension::TrafficOut,
    ];

    pub fn query(self) -> &'static str {
        match self {
            Self::Cpu => "sum(kube_pod_container_resource_requests{resource=\"cpu\"})by(namespace)",
            Self::Memory => {
                "sum(kube_pod_container_resource_requests{resource=\"memory\"})by(namespace)"
            }
            Self::Storage => {
                "sum(kube_persistentvolumeclaim_resource_requests_storage_bytes)by(namespace)"
            }
            Self::PublicIp => "count(kube_service_spec_type{type=\"LoadBalancer\"})by(namespace)",
            Self::TrafficIn => "sum(rate(container_network_receive_bytes_total[1m]))by(namespace)",
            Self::TrafficOut => {
                "sum(rate(container_network_transmit_bytes_total[1m]))by(namespace)"
            }
        }
    }

    /// Set this dimension's field from a sample value string. Unparseable
    /// values leave the field at zero; no error is surfaced.
    pub fn apply(self, usage: &mut ResourceUsage, value: &str) {
        match self {
            Self::Cpu => usage.cpu = value.parse().unwrap_or_default(),
            Self::Memory => usage.memory = value.parse().unwrap_or_default(),
            Self::Storage => usage.storage = value.parse().unwrap_or_default(),
            Self::PublicIp => usage.public_ip = value.parse().unwrap_or_default(),
            Self::TrafficIn => usage.traffic_in = value.parse().unwrap_or_default(),
            Self::TrafficOut => usage.traffic_out = value.parse().unwrap_or_default(),
        }
    }
}
