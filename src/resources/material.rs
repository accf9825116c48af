use glam::Vec3;
use uuid::Uuid;

/// Physically based "standard" material: the only material kind generated
/// scene sources are asked to use.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub uuid: Uuid,
    pub name: String,
    /// sRGB base color in `[0, 1]`
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub emissive: Vec3,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: String::new(),
            color: Vec3::ONE,
            roughness: 1.0,
            metalness: 0.0,
            emissive: Vec3::ZERO,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
        }
    }
}

impl Material {
    #[must_use]
    pub fn new_standard(color: Vec3) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }
}

/// Converts a packed `0xRRGGBB` integer into a normalized color.
#[must_use]
pub fn color_from_hex(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

/// Parses `#RRGGBB`, `RRGGBB`, `#RGB` or `0xRRGGBB` color strings.
#[must_use]
pub fn parse_color(text: &str) -> Option<Vec3> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix('#')
        .or_else(|| trimmed.strip_prefix("0x"))
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };

    u32::from_str_radix(&expanded, 16).ok().map(color_from_hex)
}
