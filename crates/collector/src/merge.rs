use std::collections::BTreeMap;

use meter_core::ResourceUsage;

use crate::client::Sample;
use crate::dimension::Dimension;

/// Fold one dimension's samples into the per-namespace map. A namespace seen
/// for the first time gets a zeroed record with only this dimension's field
/// set; an existing record has only this field updated.
pub fn merge_samples(
    map: &mut BTreeMap<String, ResourceUsage>,
    dimension: Dimension,
    samples: &[Sample],
) {
    for sample in samples {
        let usage = map.entry(sample.namespace.clone()).or_default();
        dimension.apply(usage, &sample.value);
    }
}
