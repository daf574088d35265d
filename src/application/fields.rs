//! Field tables: which markers each dashboard value is written between.

use crate::domain::{
    forecast::{CurrentConditions, DailyConditions, Forecast},
    patch::PatchSpec,
    render::{Renderer, Value},
    word::WordOfDay,
};

/// Name and marker pair of one patchable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMarkers {
    pub field: String,
    pub start: String,
    pub stop: String,
}

impl FieldMarkers {
    pub fn new(
        field: impl Into<String>,
        start: impl Into<String>,
        stop: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            start: start.into(),
            stop: stop.into(),
        }
    }

    pub fn spec(&self, value: impl Into<String>) -> PatchSpec {
        PatchSpec::new(&self.field, &self.start, &self.stop, value)
    }
}

/// A field that produced no spec, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    pub field: String,
    pub reason: String,
}

/// Specs ready to apply, plus the fields whose values were unavailable.
#[derive(Debug, Clone, Default)]
pub struct SpecBatch {
    pub specs: Vec<PatchSpec>,
    pub missing: Vec<MissingField>,
}

impl SpecBatch {
    fn push(&mut self, renderer: &Renderer, markers: FieldMarkers, value: Option<Value>) {
        let Some(value) = value else {
            self.missing.push(MissingField {
                field: markers.field,
                reason: "value not present in response".to_string(),
            });
            return;
        };
        match renderer.render(&value) {
            Ok(rendered) => self.specs.push(markers.spec(rendered)),
            Err(err) => self.missing.push(MissingField {
                field: markers.field,
                reason: err.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentField {
    Temperature,
    Humidity,
    WindSpeed,
    Visibility,
}

impl CurrentField {
    pub const ALL: [Self; 4] = [
        Self::Temperature,
        Self::Humidity,
        Self::WindSpeed,
        Self::Visibility,
    ];

    pub fn markers(self) -> FieldMarkers {
        match self {
            Self::Temperature => {
                FieldMarkers::new("currentTemp", r#"<span id="currentTemp">"#, " &#8457")
            }
            Self::Humidity => FieldMarkers::new(
                "currentHumidity",
                r#"<br> <span id="currentHumidity">"#,
                " %</span>",
            ),
            Self::WindSpeed => FieldMarkers::new(
                "currentWindSpeed",
                r#"<br> <span id="currentWindSpeed">"#,
                " mph</span>",
            ),
            Self::Visibility => FieldMarkers::new(
                "currentVisibility",
                r#"<br> <span id="currentVisibility">"#,
                " mi.</span>",
            ),
        }
    }

    fn value(self, current: &CurrentConditions) -> Option<Value> {
        match self {
            Self::Temperature => current.temperature.map(Value::Number),
            Self::Humidity => current.humidity.map(Value::Percentage),
            Self::WindSpeed => current.wind_speed.map(Value::Number),
            Self::Visibility => current.visibility.map(Value::Number),
        }
    }
}

/// Fields repeated for each forecast day; markers are numbered by day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayField {
    Weekday,
    Low,
    High,
    Humidity,
    WindSpeed,
    Visibility,
}

impl DayField {
    pub const ALL: [Self; 6] = [
        Self::Weekday,
        Self::Low,
        Self::High,
        Self::Humidity,
        Self::WindSpeed,
        Self::Visibility,
    ];

    /// Markers for `day`, counted from 1.
    pub fn markers(self, day: usize) -> FieldMarkers {
        match self {
            Self::Weekday => FieldMarkers::new(
                format!("day{day}"),
                format!(r#"<h2><span id="day{day}">"#),
                format!("<!--d{day}--></span></h2>"),
            ),
            // Low and high temperatures share one comment sequence: 1,2 then 3,4 then 5,6.
            Self::Low => FieldMarkers::new(
                format!("lowTemp{day}"),
                format!(r#"<span id="lowTemp{day}">"#),
                format!(" &#8457;<!--{}--></span>", 2 * day - 1),
            ),
            Self::High => FieldMarkers::new(
                format!("highTemp{day}"),
                format!(r#"<span id="highTemp{day}">"#),
                format!(" &#8457;<!--{}--></span>", 2 * day),
            ),
            Self::Humidity => FieldMarkers::new(
                format!("humidity{day}"),
                format!(r#"<br> <span id="humidity{day}">"#),
                format!(" %<!--{day}--></span>"),
            ),
            Self::WindSpeed => FieldMarkers::new(
                format!("windspeed{day}"),
                format!(r#"<br> <span id="windspeed{day}">"#),
                format!(" mph<!--{day}--></span>"),
            ),
            Self::Visibility => FieldMarkers::new(
                format!("visibility{day}"),
                format!(r#"<br> <span id="visibility{day}">"#),
                format!(" mi.<!--{day}--></span>"),
            ),
        }
    }

    fn value(self, daily: &DailyConditions) -> Option<Value> {
        match self {
            Self::Weekday => daily.time.map(Value::Weekday),
            Self::Low => daily.temperature_low.map(Value::Number),
            Self::High => daily.temperature_high.map(Value::Number),
            Self::Humidity => daily.humidity.map(Value::Percentage),
            Self::WindSpeed => daily.wind_speed.map(Value::Number),
            Self::Visibility => daily.visibility.map(Value::Number),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordField {
    Word,
    Pronunciation,
    PartOfSpeech,
    Definitions,
}

impl WordField {
    pub const ALL: [Self; 4] = [
        Self::Word,
        Self::Pronunciation,
        Self::PartOfSpeech,
        Self::Definitions,
    ];

    pub fn markers(self) -> FieldMarkers {
        match self {
            Self::Word => {
                FieldMarkers::new("word", r#"<span id="word">"#, ":&nbsp;<!--w1--></span>")
            }
            Self::Pronunciation => FieldMarkers::new(
                "pronounce",
                r#"<span id="pronounce">[&nbsp;"#,
                "&nbsp;]<!--w2--></span>",
            ),
            Self::PartOfSpeech => {
                FieldMarkers::new("pos", r#"<span id="pos">"#, "<!--w3--></span>")
            }
            Self::Definitions => {
                FieldMarkers::new("defs", r#"<span id="defs">"#, "<!--w4--></span>")
            }
        }
    }
}

/// Marker pairs for every field written into the HTML document.
pub fn html_markers() -> Vec<FieldMarkers> {
    let mut markers: Vec<FieldMarkers> =
        CurrentField::ALL.iter().map(|field| field.markers()).collect();
    for day in 1..=crate::domain::forecast::FORECAST_DAYS {
        markers.extend(DayField::ALL.iter().map(|field| field.markers(day)));
    }
    markers.extend(WordField::ALL.iter().map(|field| field.markers()));
    markers
}

/// Specs for the current conditions and each forecast day, in document order.
pub fn weather_specs(forecast: &Forecast, renderer: &Renderer) -> SpecBatch {
    let mut batch = SpecBatch::default();
    for field in CurrentField::ALL {
        batch.push(renderer, field.markers(), field.value(&forecast.currently));
    }

    let days = forecast.upcoming_days();
    for day in 1..=crate::domain::forecast::FORECAST_DAYS {
        let conditions = days.get(day - 1);
        for field in DayField::ALL {
            batch.push(
                renderer,
                field.markers(day),
                conditions.and_then(|daily| field.value(daily)),
            );
        }
    }
    batch
}

/// Specs for the word of the day. An entry without definitions clears the list.
pub fn word_specs(word: &WordOfDay, renderer: &Renderer) -> SpecBatch {
    let mut batch = SpecBatch::default();
    batch.push(
        renderer,
        WordField::Word.markers(),
        Some(Value::Text(word.word.clone())),
    );
    batch.push(
        renderer,
        WordField::Pronunciation.markers(),
        word.pronunciation
            .as_deref()
            .map(|pronunciation| Value::Text(format!("&nbsp;{pronunciation}"))),
    );
    batch.push(
        renderer,
        WordField::PartOfSpeech.markers(),
        word.part_of_speech
            .as_deref()
            .map(|part| Value::Text(format!("&nbsp;{part}"))),
    );

    let mut definitions = String::new();
    for (index, definition) in word.definitions.iter().enumerate() {
        definitions.push_str(&format!(
            "&nbsp;&nbsp;&nbsp;Definition {}) &nbsp;{}<br>",
            index + 1,
            renderer.definition(definition)
        ));
    }
    batch.specs.push(WordField::Definitions.markers().spec(definitions));
    batch
}

/// Spec replacing the photo named in the stylesheet.
pub fn photo_spec(photo: &str, start_marker: &str, stop_marker: &str) -> PatchSpec {
    FieldMarkers::new("photo", start_marker, stop_marker).spec(photo)
}
