//! Plain-text rendering of the widget.

use std::{
    fmt,
    io::{self, Write},
};

use wttr_core::{DisplayState, Measure, WeatherRecord};

pub fn render(state: &DisplayState) -> Vec<String> {
    let mut lines = Vec::with_capacity(8);

    let location = state
        .record
        .as_ref()
        .and_then(|r| r.location.city.known().cloned())
        .unwrap_or_else(|| state.city.clone());
    lines.push(format!("{}  City: {}", state.icon.glyph(), location));

    match &state.record {
        Some(record) => lines.extend(record_lines(record)),
        None => {
            lines.push("Temperature: ...".to_string());
            lines.push("Weather: ...".to_string());
        }
    }

    let last_update = state
        .last_update
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "...".to_string());
    lines.push(format!("Latest update: {last_update}"));

    if let Some(error) = &state.error_text {
        lines.push(error.clone());
    }

    let button = if state.button.enabled {
        format!("[ {} ]  (Enter to update, q to quit)", state.button.label)
    } else {
        format!("[ {} ]", state.button.label)
    };
    lines.push(button);

    lines
}

/// `15°C` for a known reading, a bare `N/A` otherwise.
fn with_unit<T: fmt::Display>(measure: &Measure<T>, unit: &str) -> String {
    match measure {
        Measure::Known(v) => format!("{v}{unit}"),
        Measure::Unknown => measure.to_string(),
    }
}

fn record_lines(record: &WeatherRecord) -> Vec<String> {
    vec![
        format!(
            "Temperature: {} (feels like {})",
            with_unit(&record.temperature.celsius, "°C"),
            with_unit(&record.feels_like.celsius, "°C"),
        ),
        format!("Weather: {}", record.description),
        format!(
            "Humidity: {}  Wind: {}  Pressure: {}  UV: {}",
            with_unit(&record.humidity, "%"),
            with_unit(&record.wind_speed.kmh, " km/h"),
            with_unit(&record.pressure.mb, " mb"),
            record.uv_index
        ),
    ]
}

/// One-shot summary used by `show`.
pub fn summary(record: &WeatherRecord) -> Vec<String> {
    let loc = &record.location;
    let mut lines = vec![format!(
        "{}  {}, {}, {}",
        record.icon().glyph(),
        loc.city,
        loc.region,
        loc.country
    )];
    lines.extend(record_lines(record));
    lines.push(format!(
        "Visibility: {}  Wind: {}  Pressure: {}",
        with_unit(&record.visibility.km, " km"),
        with_unit(&record.wind_speed.mph, " mph"),
        with_unit(&record.pressure.inches, " inHg"),
    ));
    lines
}

/// Redraws only when the state revision moves.
pub struct TextView<W: Write> {
    out: W,
    drawn_revision: Option<u64>,
}

impl<W: Write> TextView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            drawn_revision: None,
        }
    }

    pub fn draw(&mut self, state: &DisplayState) -> io::Result<()> {
        if self.drawn_revision == Some(state.revision) {
            return Ok(());
        }
        self.drawn_revision = Some(state.revision);

        writeln!(self.out)?;
        for line in render(state) {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    /// A one-off line between redraws, e.g. a hint about bad input.
    pub fn note(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wttr_core::{
        ButtonState, ConditionIcon,
        model::{Location, Temperature},
    };

    fn poltava(celsius: i32) -> WeatherRecord {
        WeatherRecord {
            temperature: Temperature {
                celsius: Measure::Known(celsius),
                fahrenheit: Measure::Unknown,
            },
            description: Measure::Known("Sunny".into()),
            location: Location {
                city: Measure::Known("Poltava".into()),
                ..Location::default()
            },
            ..WeatherRecord::default()
        }
    }

    #[test]
    fn renders_placeholder_before_first_update() {
        let state = DisplayState {
            city: "Poltava".into(),
            ..DisplayState::default()
        };
        let lines = render(&state);
        assert_eq!(lines[0], "·  City: Poltava");
        assert_eq!(lines[1], "Temperature: ...");
        assert!(lines.contains(&"Latest update: ...".to_string()));
    }

    #[test]
    fn renders_temperature_and_unknowns() {
        let record = poltava(15);
        let state = DisplayState {
            city: "Poltava".into(),
            icon: record.icon(),
            record: Some(record),
            ..DisplayState::default()
        };
        let lines = render(&state);
        assert_eq!(lines[0], "☀  City: Poltava");
        assert_eq!(lines[1], "Temperature: 15°C (feels like N/A)");
        assert_eq!(lines[2], "Weather: Sunny");
        assert_eq!(lines[3], "Humidity: N/A  Wind: N/A  Pressure: N/A  UV: N/A");
    }

    #[test]
    fn known_readings_carry_their_units() {
        let mut record = poltava(15);
        record.humidity = Measure::Known(71);
        record.pressure.inches = Measure::Known(30.0);

        let lines = summary(&record);
        assert!(lines[3].starts_with("Humidity: 71%  Wind: N/A"), "{}", lines[3]);
        assert_eq!(lines[4], "Visibility: N/A  Wind: N/A  Pressure: 30 inHg");
    }

    #[test]
    fn renders_error_and_busy_button() {
        let state = DisplayState {
            city: "Poltava".into(),
            error_text: Some("Error: network error: timeout".into()),
            button: ButtonState::busy(),
            icon: ConditionIcon::Default,
            ..DisplayState::default()
        };
        let lines = render(&state);
        assert!(lines.contains(&"Error: network error: timeout".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("[ Updating... ]"));
    }

    #[test]
    fn draw_skips_unchanged_revision() {
        let mut view = TextView::new(Vec::new());
        let mut state = DisplayState {
            city: "Poltava".into(),
            ..DisplayState::default()
        };

        view.draw(&state).unwrap();
        let first_len = view.out.len();
        view.draw(&state).unwrap();
        assert_eq!(view.out.len(), first_len);

        state.revision += 1;
        view.draw(&state).unwrap();
        assert!(view.out.len() > first_len);
    }

    #[test]
    fn note_goes_through_the_view_without_forcing_a_redraw() {
        let mut view = TextView::new(Vec::new());
        let state = DisplayState::default();

        view.draw(&state).unwrap();
        view.note("Unknown command \"x\"").unwrap();
        view.draw(&state).unwrap();

        let out = String::from_utf8(view.out).unwrap();
        assert!(out.ends_with("Unknown command \"x\"\n"));
    }

    #[test]
    fn summary_lists_location_and_details() {
        let lines = summary(&poltava(-2));
        assert_eq!(lines[0], "☀  Poltava, N/A, N/A");
        assert!(lines[1].starts_with("Temperature: -2°C"));
    }
}
