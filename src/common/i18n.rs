// src/common/i18n.rs

use std::collections::HashMap;

const FALLBACK_LANG: &str = "en";

// Catálogo de mensagens de erro por idioma.
// As chaves são as devolvidas por `AppError::message_key`.
const EN: &[(&str, &str)] = &[
    ("validation_failed", "One or more fields are invalid."),
    ("invalid_payload", "Invalid request payload."),
    ("invalid_plan", "Invalid plan"),
    ("invalid_field", "invalid field"),
    ("missing_entry_data", "field_id and value required"),
    ("missing_location", "location data required"),
    ("invalid_credentials", "Invalid username or password."),
    ("invalid_token", "Invalid or missing authentication token."),
    ("admin_required", "Admin access required"),
    ("user_not_found", "User not found."),
    ("no_tenant_link", "User is not associated with any client"),
    ("not_found", "Resource not found."),
    ("conflict", "Resource already exists."),
    ("session_closed", "Collection session already ended."),
    ("internal_error", "An unexpected error occurred."),
];

const PT: &[(&str, &str)] = &[
    ("validation_failed", "Um ou mais campos são inválidos."),
    ("invalid_payload", "Conteúdo da requisição inválido."),
    ("invalid_plan", "Plano inválido"),
    ("invalid_field", "Campo inválido"),
    ("missing_entry_data", "field_id e value são obrigatórios"),
    ("missing_location", "Dados de localização são obrigatórios"),
    ("invalid_credentials", "Usuário ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("admin_required", "Acesso de administrador necessário"),
    ("user_not_found", "Usuário não encontrado."),
    ("no_tenant_link", "Usuário não está associado a nenhum cliente"),
    ("not_found", "Recurso não encontrado."),
    ("conflict", "Este registro já existe."),
    ("session_closed", "A sessão de coleta já foi encerrada."),
    ("internal_error", "Ocorreu um erro inesperado."),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl I18nStore {
    pub fn new() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("en", EN.iter().copied().collect());
        catalogs.insert("pt", PT.iter().copied().collect());
        Self { catalogs }
    }

    /// Traduz a chave; idioma desconhecido cai para inglês e chave desconhecida
    /// é devolvida como está.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| {
                self.catalogs
                    .get(FALLBACK_LANG)
                    .and_then(|catalog| catalog.get(key))
            })
            .map(|msg| msg.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_language_falls_back_to_english() {
        let store = I18nStore::new();
        assert_eq!(store.translate("de", "invalid_plan"), "Invalid plan");
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::new();
        assert_eq!(store.translate("pt", "nao_existe"), "nao_existe");
    }

    #[test]
    fn every_english_key_has_portuguese_translation() {
        let pt: HashMap<_, _> = PT.iter().copied().collect();
        for (key, _) in EN {
            assert!(pt.contains_key(key), "falta tradução para {key}");
        }
    }
}
