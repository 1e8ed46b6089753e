// src/models/collection.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;

// Posição GPS enviada pelo coletor em campo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl GeoPosition {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ---
// Sessão de coleta: aberta (is_active, sem end_time) -> encerrada
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CollectionSession {
    pub id: Uuid,
    pub client_id: Uuid,
    pub user_id: Uuid,
    pub form_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub current_location: Option<Value>,
    pub is_active: bool,
}

impl CollectionSession {
    pub fn is_open(&self) -> bool {
        self.is_active && self.end_time.is_none()
    }

    /// Atualizações de posição e novas entradas só valem em sessão aberta.
    pub fn ensure_open(&self) -> Result<(), AppError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(AppError::SessionClosed)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CollectionEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub form_field_id: Uuid,
    pub value: Value,
    pub location: Value,
    pub timestamp: DateTime<Utc>,
}

// Entrada com o rótulo e tipo do campo (JOIN form_fields)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct EntryResponse {
    pub id: Uuid,
    pub field_label: String,
    pub field_type: crate::models::forms::FieldType,
    pub value: Value,
    pub location: Value,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: CollectionSession,
    pub form_name: String,
    pub entries: Vec<EntryResponse>,
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionPayload {
    #[serde(alias = "form")]
    pub form_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLocationPayload {
    // Lido cru: `{}` e null precisam virar "localização obrigatória", não erro de parsing
    #[schema(value_type = Option<GeoPosition>)]
    pub location: Option<Value>,
}

impl UpdateLocationPayload {
    pub fn into_position(self) -> Result<GeoPosition, AppError> {
        let raw = match self.location {
            None | Some(Value::Null) => return Err(AppError::MissingLocation),
            Some(Value::Object(ref fields)) if fields.is_empty() => {
                return Err(AppError::MissingLocation);
            }
            Some(raw) => raw,
        };
        let position: GeoPosition = serde_json::from_value(raw).map_err(|e| {
            AppError::InvalidPayload(format!("location inválida: {}", e))
        })?;
        if !position.is_valid() {
            return Err(AppError::InvalidPayload(
                "latitude/longitude fora dos limites.".to_string(),
            ));
        }
        Ok(position)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddEntryPayload {
    pub field_id: Option<Uuid>,
    // null chega aqui como None
    pub value: Option<Value>,
}

impl AddEntryPayload {
    /// Exige `field_id` e um `value` presente, não nulo e não vazio
    /// (`""`, `[]` e `{}` contam como vazios). `0` e `false` são valores legítimos de coleta.
    pub fn into_parts(self) -> Result<(Uuid, Value), AppError> {
        let field_id = self.field_id.ok_or(AppError::MissingEntryData)?;
        match self.value {
            None | Some(Value::Null) => Err(AppError::MissingEntryData),
            Some(Value::String(ref text)) if text.is_empty() => Err(AppError::MissingEntryData),
            Some(Value::Array(ref items)) if items.is_empty() => Err(AppError::MissingEntryData),
            Some(Value::Object(ref fields)) if fields.is_empty() => Err(AppError::MissingEntryData),
            Some(value) => Ok((field_id, value)),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session(is_active: bool, end_time: Option<DateTime<Utc>>, location: Option<Value>) -> CollectionSession {
        CollectionSession {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            form_id: Uuid::new_v4(),
            start_time: Utc::now(),
            end_time,
            current_location: location,
            is_active,
        }
    }

    #[test]
    fn open_session_accepts_updates() {
        assert!(session(true, None, None).ensure_open().is_ok());
    }

    #[test]
    fn closed_session_rejects_updates() {
        let closed = session(false, Some(Utc::now()), None);
        assert!(matches!(closed.ensure_open(), Err(AppError::SessionClosed)));
    }

    #[test]
    fn entry_requires_field_and_value() {
        let field_id = Uuid::new_v4();
        let entry = |value: Option<Value>| AddEntryPayload { field_id: Some(field_id), value };

        assert!(matches!(entry(None).into_parts(), Err(AppError::MissingEntryData)));
        assert!(matches!(entry(Some(Value::Null)).into_parts(), Err(AppError::MissingEntryData)));
        assert!(matches!(entry(Some(json!(""))).into_parts(), Err(AppError::MissingEntryData)));
        assert!(matches!(entry(Some(json!([]))).into_parts(), Err(AppError::MissingEntryData)));
        assert!(matches!(entry(Some(json!({}))).into_parts(), Err(AppError::MissingEntryData)));
        assert!(matches!(
            AddEntryPayload { field_id: None, value: Some(json!("ok")) }.into_parts(),
            Err(AppError::MissingEntryData)
        ));

        assert_eq!(entry(Some(json!(0))).into_parts().unwrap(), (field_id, json!(0)));
        assert_eq!(entry(Some(json!(false))).into_parts().unwrap(), (field_id, json!(false)));
        assert_eq!(entry(Some(json!(["a"]))).into_parts().unwrap(), (field_id, json!(["a"])));
    }

    #[test]
    fn explicit_null_value_deserializes_as_missing() {
        let payload: AddEntryPayload =
            serde_json::from_value(json!({ "field_id": Uuid::new_v4(), "value": null })).unwrap();
        assert!(matches!(payload.into_parts(), Err(AppError::MissingEntryData)));
    }

    #[test]
    fn location_is_required() {
        let missing = UpdateLocationPayload { location: None };
        assert!(matches!(missing.into_position(), Err(AppError::MissingLocation)));

        let here = GeoPosition { latitude: -23.5, longitude: -46.6, accuracy: None, altitude: None };
        let payload = UpdateLocationPayload { location: Some(json!({ "latitude": -23.5, "longitude": -46.6 })) };
        assert_eq!(payload.into_position().unwrap(), here);
    }

    #[test]
    fn empty_or_null_location_is_missing_not_malformed() {
        for body in [json!({ "location": {} }), json!({ "location": null }), json!({})] {
            let payload: UpdateLocationPayload = serde_json::from_value(body).unwrap();
            assert!(matches!(payload.into_position(), Err(AppError::MissingLocation)));
        }
    }

    #[test]
    fn location_without_longitude_is_invalid_payload() {
        let payload = UpdateLocationPayload { location: Some(json!({ "latitude": 1.0 })) };
        assert!(matches!(payload.into_position(), Err(AppError::InvalidPayload(_))));
    }

    #[test]
    fn out_of_bounds_location_is_invalid_payload() {
        let payload = UpdateLocationPayload { location: Some(json!({ "latitude": 95.0, "longitude": 0.0 })) };
        assert!(matches!(payload.into_position(), Err(AppError::InvalidPayload(_))));
    }

    #[test]
    fn position_bounds_are_checked() {
        let ok = GeoPosition { latitude: -23.5, longitude: -46.6, accuracy: Some(5.0), altitude: None };
        let bad = GeoPosition { latitude: 123.0, longitude: 0.0, accuracy: None, altitude: None };
        assert!(ok.is_valid());
        assert!(!bad.is_valid());
    }
}
