use serde::{Deserialize, Serialize};

/// Basemap styles a display can draw the track on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapLayer {
    Streets,
    Topo,
    Satellite,
}

impl MapLayer {
    /// Offline mode uses the plain street map, otherwise the hiking friendly topo map.
    pub fn for_display_mode(offline_mode: bool) -> Self {
        if offline_mode {
            MapLayer::Streets
        } else {
            MapLayer::Topo
        }
    }

    pub fn tile_url(&self) -> &'static str {
        match self {
            MapLayer::Streets => "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            MapLayer::Topo => "https://{s}.tile.opentopomap.org/{z}/{x}/{y}.png",
            MapLayer::Satellite => "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
        }
    }

    pub fn max_zoom(&self) -> u8 {
        match self {
            MapLayer::Streets | MapLayer::Satellite => 19,
            MapLayer::Topo => 17,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MapLayer::Streets => "streets",
            MapLayer::Topo => "topo",
            MapLayer::Satellite => "satellite",
        }
    }
}

#[test]
fn display_mode_selects_layer() {
    assert_eq!(MapLayer::for_display_mode(true), MapLayer::Streets);
    assert_eq!(MapLayer::for_display_mode(false), MapLayer::Topo);
    assert_eq!(MapLayer::Topo.max_zoom(), 17);
}
