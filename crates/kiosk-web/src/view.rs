//! Access rows as the dashboard presents them.

use chrono::NaiveDateTime;
use kiosk_store::AccessEvent;
use serde::Serialize;
use std::path::Path;

/// Tried in order; the stored format carries microseconds.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

pub const FACES_ROUTE: &str = "/faces";

pub const STATUS_ALLOWED: &str = "Permitido";
pub const STATUS_DENIED: &str = "No autorizado";
pub const NO_PERSON_ID: &str = "No identificado";

#[derive(Debug, Clone, PartialEq)]
pub enum Timestamp {
    Parsed(NaiveDateTime),
    Raw(String),
}

impl Timestamp {
    pub fn parse(raw: &str) -> Self {
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(Timestamp::Parsed)
            .unwrap_or_else(|| Timestamp::Raw(raw.to_string()))
    }

    pub fn display(&self) -> String {
        match self {
            Timestamp::Parsed(t) => t.format(DISPLAY_FORMAT).to_string(),
            Timestamp::Raw(raw) => raw.clone(),
        }
    }
}

/// One dashboard row; serializes to the `/api/accesos` JSON shape.
#[derive(Debug, Clone, Serialize)]
pub struct AccessView {
    pub id: i64,
    pub nombre: String,
    pub persona_id: String,
    /// Stored string, unparsed.
    pub timestamp: String,
    pub estado: &'static str,
    pub imagen: Option<String>,
    #[serde(skip)]
    pub when: Timestamp,
}

impl From<AccessEvent> for AccessView {
    fn from(event: AccessEvent) -> Self {
        let person_id = event.person_id.filter(|id| !id.is_empty());
        Self {
            id: event.id,
            nombre: event.name,
            estado: if person_id.is_some() { STATUS_ALLOWED } else { STATUS_DENIED },
            persona_id: person_id.unwrap_or_else(|| NO_PERSON_ID.to_string()),
            when: Timestamp::parse(&event.timestamp),
            timestamp: event.timestamp,
            imagen: event.face_image_path.as_deref().and_then(face_url),
        }
    }
}

/// `/any/dir/Carlos_ab12cd34.jpg` → `/faces/Carlos_ab12cd34.jpg`.
pub fn face_url(path: &str) -> Option<String> {
    let file_name = Path::new(path).file_name()?.to_str()?;
    Some(format!("{FACES_ROUTE}/{file_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn event(person_id: Option<&str>, timestamp: &str, path: Option<&str>) -> AccessEvent {
        AccessEvent {
            id: 3,
            name: "Carlos".into(),
            person_id: person_id.map(String::from),
            timestamp: timestamp.into(),
            face_image_path: path.map(String::from),
        }
    }

    #[test]
    fn test_timestamp_with_microseconds() {
        let Timestamp::Parsed(t) = Timestamp::parse("2024-03-05 14:07:09.123456") else {
            panic!("expected parsed timestamp");
        };
        assert_eq!(t.date(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(t.nanosecond(), 123_456_000);
        assert_eq!(Timestamp::parse("2024-03-05 14:07:09.123456").display(), "05/03/2024 14:07:09");
    }

    #[test]
    fn test_timestamp_seconds_only() {
        assert_eq!(Timestamp::parse("2024-03-05 14:07:09").display(), "05/03/2024 14:07:09");
    }

    #[test]
    fn test_timestamp_falls_back_to_raw() {
        assert_eq!(Timestamp::parse("ayer"), Timestamp::Raw("ayer".into()));
        assert_eq!(Timestamp::parse("ayer").display(), "ayer");
    }

    #[test]
    fn test_face_url() {
        assert_eq!(face_url("/x/y/z/Carlos_ab12cd34.jpg").as_deref(), Some("/faces/Carlos_ab12cd34.jpg"));
        assert_eq!(face_url("Carlos.jpg").as_deref(), Some("/faces/Carlos.jpg"));
        assert_eq!(face_url(""), None);
    }

    #[test]
    fn test_view_authorized() {
        let view = AccessView::from(event(Some("101"), "2024-01-01 10:00:00", Some("/data/a.jpg")));
        assert_eq!(view.persona_id, "101");
        assert_eq!(view.estado, STATUS_ALLOWED);
        assert_eq!(view.imagen.as_deref(), Some("/faces/a.jpg"));
    }

    #[test]
    fn test_view_unauthorized() {
        let view = AccessView::from(event(None, "2024-01-01 10:00:00", None));
        assert_eq!(view.persona_id, NO_PERSON_ID);
        assert_eq!(view.estado, STATUS_DENIED);
        assert_eq!(view.imagen, None);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["persona_id"], "No identificado");
        assert_eq!(json["timestamp"], "2024-01-01 10:00:00");
        assert!(json["imagen"].is_null());
        assert!(json.get("when").is_none());
    }
}
