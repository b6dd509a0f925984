use trainwatch_model::BerthName;

/// Per-node data carried by a [`crate::BerthGraph`] through building,
/// cleaning, and layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BerthNode {
    pub name: BerthName,
    /// Whether this node has an authoritative, collector-immutable coordinate.
    pub fixed: bool,
    /// Present iff `fixed`, until the layout solver fills in non-fixed nodes.
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl BerthNode {
    #[must_use]
    pub fn fixed(name: BerthName, lat: f64, lon: f64) -> Self {
        Self {
            name,
            fixed: true,
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    #[must_use]
    pub fn unfixed(name: BerthName) -> Self {
        Self {
            name,
            fixed: false,
            lat: None,
            lon: None,
        }
    }

    #[must_use]
    pub fn has_position(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }
}
