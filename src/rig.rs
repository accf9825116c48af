//! Rig joints produced by the content provider.
//!
//! A rig is a flat joint list whose parent references must form a single
//! rooted tree. [`validate_rig`] checks every structural rule and reports the
//! first violation found.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::RigError;

/// One joint of a generated rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigJoint {
    pub name: String,
    /// `None` for the root joint
    #[serde(default)]
    pub parent: Option<String>,
    /// Position relative to the parent joint
    #[serde(default)]
    pub position: [f32; 3],
}

impl RigJoint {
    pub fn new(name: impl Into<String>, parent: Option<&str>, position: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            parent: parent.map(str::to_string),
            position,
        }
    }
}

/// Resolves every joint's parent to an index into `joints`.
///
/// Fails on empty or duplicate names, unknown parents, missing or multiple
/// roots, and parent cycles.
pub fn resolve_parents(joints: &[RigJoint]) -> Result<Vec<Option<usize>>, RigError> {
    if joints.is_empty() {
        return Err(RigError::Empty);
    }

    let mut index_of: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, joint) in joints.iter().enumerate() {
        if joint.name.trim().is_empty() {
            return Err(RigError::EmptyName);
        }
        if index_of.insert(joint.name.as_str(), i).is_some() {
            return Err(RigError::DuplicateName(joint.name.clone()));
        }
    }

    let mut parents = Vec::with_capacity(joints.len());
    let mut roots = Vec::new();
    for joint in joints {
        match joint.parent.as_deref() {
            None => {
                roots.push(joint.name.clone());
                parents.push(None);
            }
            Some(parent) => {
                let index = index_of.get(parent).copied().ok_or_else(|| {
                    RigError::UnknownParent {
                        joint: joint.name.clone(),
                        parent: parent.to_string(),
                    }
                })?;
                parents.push(Some(index));
            }
        }
    }

    match roots.len() {
        0 => return Err(RigError::NoRoot),
        1 => {}
        _ => return Err(RigError::MultipleRoots(roots)),
    }

    // A single root does not rule out a detached loop among the other joints
    for (start, joint) in joints.iter().enumerate() {
        let mut current = parents[start];
        let mut steps = 0;
        while let Some(i) = current {
            steps += 1;
            if i == start || steps > joints.len() {
                return Err(RigError::Cycle(joint.name.clone()));
            }
            current = parents[i];
        }
    }

    Ok(parents)
}

/// Checks that `joints` form exactly one rooted, acyclic tree.
pub fn validate_rig(joints: &[RigJoint]) -> Result<(), RigError> {
    resolve_parents(joints).map(|_| ())
}

/// Joint names in declaration order.
#[must_use]
pub fn bone_names(joints: &[RigJoint]) -> Vec<String> {
    joints.iter().map(|j| j.name.clone()).collect()
}
