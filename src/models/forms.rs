// src/models/forms.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::auth::UserSummary;

// --- ENUMS ---

// Mapeia o CREATE TYPE field_type do banco.
// O núcleo não interpreta o tipo; ele só orienta a renderização no cliente.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "field_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Select,
    Multiselect,
    Checkbox,
    Radio,
    File,
    Image,
    Geometry, // Desenho de formas no mapa
}

// --- FORMULÁRIO (O Molde) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Form {
    pub id: Uuid,
    pub client_id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FormField {
    pub id: Uuid,
    pub form_id: Uuid,
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    // Opções para select/radio (Ex: ["A", "B"])
    pub options: Option<Value>,
    #[sqlx(rename = "field_order")]
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

// Campo ainda não persistido
#[derive(Debug, Clone, PartialEq)]
pub struct NewFormField {
    pub name: String,
    pub label: String,
    pub field_type: FieldType,
    pub required: bool,
    pub options: Option<Value>,
    pub order: i32,
}

impl NewFormField {
    /// Os dois campos GIS obrigatórios que todo formulário recebe ao nascer.
    pub fn gis_defaults() -> [NewFormField; 2] {
        [
            NewFormField {
                name: "latitude".to_string(),
                label: "Latitude".to_string(),
                field_type: FieldType::Number,
                required: true,
                options: None,
                order: 0,
            },
            NewFormField {
                name: "longitude".to_string(),
                label: "Longitude".to_string(),
                field_type: FieldType::Number,
                required: true,
                options: None,
                order: 1,
            },
        ]
    }
}

// Formulário com os seus campos ordenados
#[derive(Debug, Serialize, ToSchema)]
pub struct FormDetail {
    #[serde(flatten)]
    pub form: Form,
    pub fields: Vec<FormField>,
}

// --- SUBMISSÃO (O Dado) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct FormSubmission {
    pub id: Uuid,
    pub client_id: Uuid,
    pub form_id: Uuid,
    // Aqui vai o { "latitude": -23.5, "status": "ok", ... }
    pub data: Value,
    pub submitted_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// Linha de submissão já com o usuário que enviou (JOIN users)
#[derive(Debug, Clone, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub data: Value,
    pub submitted_by: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub id: Uuid,
    pub form: Uuid,
    pub data: Value,
    // { "Latitude": { "type": "number", "value": -23.5 } }
    pub form_data: Value,
    pub submitted_by: UserSummary,
    pub created_at: DateTime<Utc>,
}

impl SubmissionResponse {
    pub fn from_row(row: SubmissionRow, fields: &[FormField]) -> Self {
        let form_data = format_form_data(fields, &row.data);
        Self {
            id: row.id,
            form: row.form_id,
            form_data,
            data: row.data,
            submitted_by: UserSummary {
                id: row.submitted_by,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            created_at: row.created_at,
        }
    }
}

/// Reescreve um objeto `{nome_do_campo: valor}` como `{label: {type, value}}`,
/// mantendo apenas as chaves que correspondem a campos do formulário.
pub fn format_form_data(fields: &[FormField], data: &Value) -> Value {
    let mut formatted = Map::new();
    if let Some(object) = data.as_object() {
        for (key, value) in object {
            if let Some(field) = fields.iter().find(|f| &f.name == key) {
                formatted.insert(
                    field.label.clone(),
                    json!({ "type": field.field_type, "value": value }),
                );
            }
        }
    }
    Value::Object(formatted)
}

// --- PAYLOADS ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFormPayload {
    pub category_id: Uuid,
    #[validate(length(min = 1, max = 200, message = "O nome do formulário é obrigatório."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFormPayload {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddFieldPayload {
    #[validate(length(min = 1, max = 100, message = "O nome do campo é obrigatório."))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "O rótulo do campo é obrigatório."))]
    pub label: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    pub options: Option<Value>,
    #[serde(default)]
    pub order: i32,
}

impl From<AddFieldPayload> for NewFormField {
    fn from(payload: AddFieldPayload) -> Self {
        Self {
            name: payload.name,
            label: payload.label,
            field_type: payload.field_type,
            required: payload.required,
            options: payload.options,
            order: payload.order,
        }
    }
}

fn validate_object(data: &Value) -> Result<(), ValidationError> {
    if data.is_object() {
        Ok(())
    } else {
        let mut err = ValidationError::new("object");
        err.message = Some("data deve ser um objeto JSON.".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubmissionPayload {
    #[serde(alias = "form_id")]
    pub form: Uuid,
    #[validate(custom(function = "validate_object"))]
    pub data: Value,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FormFilter {
    pub category: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubmissionFilter {
    pub form: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, label: &str, field_type: FieldType, order: i32) -> FormField {
        FormField {
            id: Uuid::new_v4(),
            form_id: Uuid::nil(),
            name: name.into(),
            label: label.into(),
            field_type,
            required: false,
            options: None,
            order,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn every_form_starts_with_latitude_and_longitude() {
        let [lat, lng] = NewFormField::gis_defaults();
        assert_eq!((lat.name.as_str(), lat.order), ("latitude", 0));
        assert_eq!((lng.name.as_str(), lng.order), ("longitude", 1));
        assert_eq!(lat.field_type, FieldType::Number);
        assert_eq!(lng.field_type, FieldType::Number);
        assert!(lat.required && lng.required);
    }

    #[test]
    fn form_data_uses_labels_and_drops_unknown_keys() {
        let fields = vec![
            field("latitude", "Latitude", FieldType::Number, 0),
            field("pipe_status", "Pipe status", FieldType::Select, 2),
        ];
        let data = json!({ "latitude": -23.5, "pipe_status": "leaking", "extra": 1 });

        let formatted = format_form_data(&fields, &data);
        assert_eq!(formatted["Latitude"], json!({ "type": "number", "value": -23.5 }));
        assert_eq!(formatted["Pipe status"], json!({ "type": "select", "value": "leaking" }));
        assert!(formatted.get("extra").is_none());
    }

    #[test]
    fn form_data_of_non_object_is_empty() {
        let fields = vec![field("latitude", "Latitude", FieldType::Number, 0)];
        assert_eq!(format_form_data(&fields, &json!([1, 2])), json!({}));
    }

    #[test]
    fn submission_data_must_be_an_object() {
        let ok = CreateSubmissionPayload { form: Uuid::new_v4(), data: json!({ "latitude": 1.0 }) };
        let bad = CreateSubmissionPayload { form: Uuid::new_v4(), data: json!("text") };
        assert!(ok.validate().is_ok());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn field_type_is_serialized_lowercase() {
        assert_eq!(serde_json::to_value(FieldType::Multiselect).unwrap(), "multiselect");
        let parsed: FieldType = serde_json::from_value(json!("geometry")).unwrap();
        assert_eq!(parsed, FieldType::Geometry);
    }

    #[test]
    fn submission_response_carries_submitter_and_form_data() {
        let submitter = Uuid::new_v4();
        let row = SubmissionRow {
            id: Uuid::new_v4(),
            form_id: Uuid::new_v4(),
            data: json!({ "status": "vazando" }),
            submitted_by: submitter,
            username: "field.agent".into(),
            email: "agent@waterutility.com".into(),
            first_name: "Ana".into(),
            last_name: String::new(),
            created_at: Utc::now(),
        };
        let form_id = row.form_id;

        let response = SubmissionResponse::from_row(row, &[field("status", "Status", FieldType::Text, 2)]);
        assert_eq!(response.form, form_id);
        assert_eq!(response.submitted_by.id, submitter);
        assert_eq!(response.form_data["Status"]["value"], "vazando");
    }
}
