use serde::{Deserialize, Serialize};

/// Animation directive attached to a structural edit
///
/// The coordinator only carries the directive through to the surface; what
/// each variant looks like is up to the surface.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RowAnimation {
    #[default]
    Automatic,
    None,
    Fade,
    Top,
    Bottom,
    Left,
    Right,
    Middle,
}

impl std::fmt::Display for RowAnimation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RowAnimation::Automatic => "automatic",
            RowAnimation::None => "none",
            RowAnimation::Fade => "fade",
            RowAnimation::Top => "top",
            RowAnimation::Bottom => "bottom",
            RowAnimation::Left => "left",
            RowAnimation::Right => "right",
            RowAnimation::Middle => "middle",
        };
        f.write_str(name)
    }
}
