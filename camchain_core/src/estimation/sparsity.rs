// camchain_core/src/estimation/sparsity.rs

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::SensorConfigDescriptor;

/// Presence flags for one chain's link geometry and gearing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainSparsity {
    /// One `[theta, alpha, a, d]` presence row per link.
    pub dh: Vec<[u8; 4]>,
    pub gearing: Vec<u8>,
}

/// Which calibrated parameters a residual block can depend on.
///
/// Purely structural: every entry is `1` when present, never a derivative
/// magnitude, so the map depends only on configuration shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SparsityMap {
    pub transforms: BTreeMap<String, [u8; 6]>,
    pub dh_chains: BTreeMap<String, ChainSparsity>,
    pub rectified_cams: BTreeMap<String, BTreeMap<String, u8>>,
}

impl SparsityMap {
    /// Builds the map for one camera sensor.
    ///
    /// The chain section is only filled when the model actually carries a
    /// chain reading; fixed transforms and the camera are always present.
    pub fn report(
        config: &SensorConfigDescriptor,
        chain_present: bool,
        camera_param_names: &[String],
    ) -> Self {
        let mut sparsity = Self::default();

        for name in config.transform_names() {
            sparsity.transforms.insert(name.to_string(), [1; 6]);
        }

        if chain_present {
            if let Some(chain_id) = &config.chain.chain_id {
                let num_links = config.chain.dh_link_num;
                sparsity.dh_chains.insert(
                    chain_id.clone(),
                    ChainSparsity {
                        dh: vec![[1; 4]; num_links],
                        gearing: vec![1; num_links],
                    },
                );
            }
        }

        sparsity.rectified_cams.insert(
            config.camera_id.clone(),
            camera_param_names
                .iter()
                .map(|name| (name.clone(), 1))
                .collect(),
        );

        sparsity
    }

    /// Unions `other` into `self`, so the result marks every parameter that
    /// either map marks.
    pub fn merge(&mut self, other: &SparsityMap) {
        for (name, flags) in &other.transforms {
            let entry = self.transforms.entry(name.clone()).or_insert([0; 6]);
            for (a, b) in entry.iter_mut().zip(flags) {
                *a |= *b;
            }
        }

        for (chain_id, chain) in &other.dh_chains {
            let entry = self.dh_chains.entry(chain_id.clone()).or_default();
            if entry.dh.len() < chain.dh.len() {
                entry.dh.resize(chain.dh.len(), [0; 4]);
            }
            if entry.gearing.len() < chain.gearing.len() {
                entry.gearing.resize(chain.gearing.len(), 0);
            }
            for (row, other_row) in entry.dh.iter_mut().zip(&chain.dh) {
                for (a, b) in row.iter_mut().zip(other_row) {
                    *a |= *b;
                }
            }
            for (a, b) in entry.gearing.iter_mut().zip(&chain.gearing) {
                *a |= *b;
            }
        }

        for (camera_id, params) in &other.rectified_cams {
            let entry = self.rectified_cams.entry(camera_id.clone()).or_default();
            for (name, flag) in params {
                *entry.entry(name.clone()).or_insert(0) |= *flag;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainDescriptor;

    fn names() -> Vec<String> {
        vec!["f_shift".to_string(), "cx_shift".to_string()]
    }

    fn arm_camera() -> SensorConfigDescriptor {
        SensorConfigDescriptor {
            camera_id: "forearm_cam".into(),
            sensor_id: None,
            chain: ChainDescriptor {
                before_chain: vec!["shoulder".into()],
                chain_id: Some("right_arm".into()),
                after_chain: vec!["cam_mount".into(), "optical".into()],
                dh_link_num: 3,
            },
        }
    }

    #[test]
    fn test_chain_bearing_report() {
        let map = SparsityMap::report(&arm_camera(), true, &names());
        assert_eq!(map.transforms.len(), 3);
        assert_eq!(map.transforms["optical"], [1; 6]);
        let chain = &map.dh_chains["right_arm"];
        assert_eq!(chain.dh, vec![[1; 4]; 3]);
        assert_eq!(chain.gearing, vec![1; 3]);
        assert_eq!(map.rectified_cams["forearm_cam"].len(), 2);
        assert_eq!(map.rectified_cams["forearm_cam"]["f_shift"], 1);
    }

    #[test]
    fn test_chain_absent_keeps_fixed_transforms() {
        let map = SparsityMap::report(&arm_camera(), false, &names());
        assert!(map.dh_chains.is_empty());
        assert_eq!(map.transforms.len(), 3);
        assert!(map.rectified_cams.contains_key("forearm_cam"));
    }

    #[test]
    fn test_merge_is_a_union() {
        let mut a = SparsityMap::report(&arm_camera(), false, &names());
        let mut other_config = arm_camera();
        other_config.camera_id = "head_cam".into();
        other_config.chain.before_chain = vec!["torso".into()];
        let b = SparsityMap::report(&other_config, true, &["baseline_shift".to_string()]);

        a.merge(&b);
        assert_eq!(a.transforms.len(), 4);
        assert!(a.transforms.contains_key("torso"));
        assert_eq!(a.dh_chains["right_arm"].gearing, vec![1; 3]);
        assert_eq!(a.rectified_cams.len(), 2);
        assert_eq!(a.rectified_cams["head_cam"]["baseline_shift"], 1);

        // Merging is idempotent.
        let before = a.clone();
        a.merge(&b);
        assert_eq!(a, before);
    }
}
