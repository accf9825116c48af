use crate::scene::NodeHandle;

/// Vector component addressed by a scalar track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            "x" | "0" => Some(Axis::X),
            "y" | "1" => Some(Axis::Y),
            "z" | "2" => Some(Axis::Z),
            _ => None,
        }
    }
}

/// Node property a track writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    /// `transform.position`
    Translation,
    /// `transform.rotation`
    Rotation,
    /// `transform.scale`
    Scale,
    /// One component of `transform.position`
    TranslationAxis(Axis),
    /// One XYZ Euler component of `transform.rotation`
    RotationAxis(Axis),
    /// One component of `transform.scale`
    ScaleAxis(Axis),
}

/// Maps track `track_index` of a clip to a node in the scene.
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    pub track_index: usize,
    pub node_handle: NodeHandle,
    pub target: TargetPath,
}

/// A parsed track name: which node and which property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTarget {
    pub node_name: String,
    pub path: TargetPath,
    /// Property name as written (`position`, `quaternion`, `rotation`, `scale`)
    pub property: &'static str,
}

const PROPERTIES: [&str; 4] = ["position", "quaternion", "rotation", "scale"];

/// Parses `node.property`, `node.property.x`, `node.property[x]` and
/// `.bones[node].property` track names.
pub fn parse_track_name(name: &str) -> Result<TrackTarget, String> {
    let (node_name, rest) = if let Some(inner) = name.strip_prefix(".bones[") {
        let close = inner
            .find(']')
            .ok_or_else(|| "unterminated `.bones[` selector".to_string())?;
        let rest = inner[close + 1..]
            .strip_prefix('.')
            .ok_or_else(|| "missing property after bone selector".to_string())?;
        (&inner[..close], rest)
    } else {
        split_node_and_property(name)?
    };

    if node_name.is_empty() {
        return Err("track does not name a node".to_string());
    }

    let property = PROPERTIES
        .iter()
        .copied()
        .find(|p| rest.starts_with(p) && matches!(rest.as_bytes().get(p.len()), None | Some(b'.' | b'[')))
        .ok_or_else(|| format!("unknown property `{rest}`"))?;

    let suffix = &rest[property.len()..];
    let axis = if suffix.is_empty() {
        None
    } else {
        let component = suffix
            .strip_prefix('.')
            .or_else(|| suffix.strip_prefix('[').and_then(|s| s.strip_suffix(']')))
            .ok_or_else(|| format!("malformed component selector `{suffix}`"))?;
        Some(Axis::parse(component).ok_or_else(|| format!("unknown component `{component}`"))?)
    };

    let path = match (property, axis) {
        ("position", None) => TargetPath::Translation,
        ("position", Some(a)) => TargetPath::TranslationAxis(a),
        ("quaternion" | "rotation", None) => TargetPath::Rotation,
        ("rotation", Some(a)) => TargetPath::RotationAxis(a),
        ("scale", None) => TargetPath::Scale,
        ("scale", Some(a)) => TargetPath::ScaleAxis(a),
        (p, Some(_)) => return Err(format!("`{p}` has no addressable components")),
        (p, None) => return Err(format!("unknown property `{p}`")),
    };

    Ok(TrackTarget {
        node_name: node_name.to_string(),
        path,
        property,
    })
}

/// Splits at the `.` that starts a known property, so node names may
/// themselves contain dots.
fn split_node_and_property(name: &str) -> Result<(&str, &str), String> {
    name.match_indices('.')
        .map(|(i, _)| (&name[..i], &name[i + 1..]))
        .find(|(_, rest)| PROPERTIES.iter().any(|p| rest.starts_with(p)))
        .ok_or_else(|| format!("`{name}` does not name a node property"))
}
