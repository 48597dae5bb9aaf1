use summit_track_lib::{
    format::{format_altitude, format_distance, format_speed},
    map_layer::MapLayer,
    track_state::TrackState,
};

/// Whatever shows the track to the user.
pub trait TrackDisplay: Send {
    /// Called after every change of the track or the display mode. The
    /// display mode only selects the basemap.
    fn render(&mut self, state: &TrackState, offline_mode: bool);

    fn show_advice(&mut self, advice: &str);

    fn hide_advice(&mut self);

    /// Problems the user has to know about, like tracking failing to start.
    fn notify(&mut self, message: &str);
}

/// Prints the watch face overlay as a line of text.
#[derive(Default)]
pub struct ConsoleDisplay {
    last_line: String,
    layer: Option<MapLayer>,
}

impl TrackDisplay for ConsoleDisplay {
    fn render(&mut self, state: &TrackState, offline_mode: bool) {
        let layer = MapLayer::for_display_mode(offline_mode);
        if self.layer != Some(layer) {
            println!("{}", basemap_line(layer));
            self.layer = Some(layer);
        }

        let line = overlay_line(state, offline_mode);
        // Repeated fixes at a standstill would spam the terminal.
        if line != self.last_line {
            println!("{line}");
            self.last_line = line;
        }
    }

    fn show_advice(&mut self, advice: &str) {
        println!(">> {advice}");
    }

    fn hide_advice(&mut self) {
        self.last_line.clear();
    }

    fn notify(&mut self, message: &str) {
        println!("!! {message}");
    }
}

pub fn overlay_line(state: &TrackState, offline_mode: bool) -> String {
    let layer = MapLayer::for_display_mode(offline_mode);
    let status = if state.tracking { "TRACKING" } else { "PAUSED" };
    let position = match state.current_location.as_ref().map(|location| location.position()) {
        Some(position) => format!("{:.5},{:.5}", position.y(), position.x()),
        None => "no fix".into(),
    };

    let mut line = format!(
        "[{status}] Dist {} | Speed {} | Alt {} | {} pts | {position} | {}",
        format_distance(state.distance),
        format_speed(state.speed()),
        format_altitude(state.altitude()),
        state.path.len(),
        layer.name(),
    );
    if offline_mode {
        line.push_str(" | OFFLINE");
    }
    line
}

pub fn basemap_line(layer: MapLayer) -> String {
    format!("Basemap {} (max zoom {}): {}", layer.name(), layer.max_zoom(), layer.tile_url())
}
