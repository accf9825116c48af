use kiln::errors::RigError;
use kiln::rig::{RigJoint, bone_names, validate_rig};

fn joint(name: &str, parent: Option<&str>) -> RigJoint {
    RigJoint::new(name, parent, [0.0, 0.0, 0.0])
}

// ============================================================================
// Valid rigs
// ============================================================================

#[test]
fn test_single_rooted_tree_is_valid() {
    let rig = vec![
        joint("hips", None),
        joint("spine", Some("hips")),
        joint("head", Some("spine")),
        joint("leg_l", Some("hips")),
        joint("leg_r", Some("hips")),
    ];
    assert!(validate_rig(&rig).is_ok());
    assert_eq!(bone_names(&rig), vec!["hips", "spine", "head", "leg_l", "leg_r"]);
}

#[test]
fn test_parent_may_be_listed_after_child() {
    let rig = vec![joint("spine", Some("hips")), joint("hips", None)];
    assert!(validate_rig(&rig).is_ok());
}

// ============================================================================
// Structural violations
// ============================================================================

#[test]
fn test_empty_rig_rejected() {
    assert_eq!(validate_rig(&[]), Err(RigError::Empty));
}

#[test]
fn test_no_root_rejected() {
    let rig = vec![joint("a", Some("b")), joint("b", Some("a"))];
    assert_eq!(validate_rig(&rig), Err(RigError::NoRoot));
}

#[test]
fn test_two_roots_rejected() {
    let rig = vec![joint("hips", None), joint("tail", None)];
    assert!(matches!(validate_rig(&rig), Err(RigError::MultipleRoots(roots)) if roots.len() == 2));
}

#[test]
fn test_unknown_parent_rejected() {
    let rig = vec![joint("hips", None), joint("arm", Some("shoulder"))];
    assert_eq!(
        validate_rig(&rig),
        Err(RigError::UnknownParent {
            joint: "arm".to_string(),
            parent: "shoulder".to_string(),
        })
    );
}

#[test]
fn test_detached_cycle_rejected() {
    let rig = vec![
        joint("hips", None),
        joint("a", Some("b")),
        joint("b", Some("a")),
    ];
    assert!(matches!(validate_rig(&rig), Err(RigError::Cycle(_))));
}

#[test]
fn test_duplicate_and_empty_names_rejected() {
    let dup = vec![joint("hips", None), joint("hips", Some("hips"))];
    assert_eq!(validate_rig(&dup), Err(RigError::DuplicateName("hips".to_string())));

    let blank = vec![joint("hips", None), joint("  ", Some("hips"))];
    assert_eq!(validate_rig(&blank), Err(RigError::EmptyName));
}
