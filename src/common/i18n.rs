// src/common/i18n.rs

use std::{collections::HashMap, sync::Arc};

use anyhow::Context;

const DEFAULT_LANG: &str = "en";

// Catálogos embutidos no binário: (idioma, json)
const CATALOGS: &[(&str, &str)] = &[
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas por idioma. Barato de clonar (Arc).
#[derive(Clone, Debug)]
pub struct I18nStore {
    catalogs: Arc<HashMap<String, HashMap<String, String>>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("catálogo de mensagens '{}' inválido", lang))?;
            catalogs.insert(lang.to_string(), messages);
        }
        tracing::debug!("🌐 {} catálogos de idioma carregados", catalogs.len());
        Ok(Self { catalogs: Arc::new(catalogs) })
    }

    /// Busca a chave no idioma pedido, cai para inglês e por fim devolve a própria chave.
    /// Parâmetros `{nome}` são substituídos pelo valor correspondente.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|messages| messages.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|m| m.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        params.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_has_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        let pt = &store.catalogs["pt"];
        for key in en.keys() {
            assert!(pt.contains_key(key), "chave '{}' ausente em pt", key);
        }
        assert_eq!(en.len(), pt.len());
    }

    #[test]
    fn falls_back_to_english_then_to_key() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("de", "invalid_credentials", &[]),
            store.translate("en", "invalid_credentials", &[])
        );
        assert_eq!(store.translate("pt", "chave.inexistente", &[]), "chave.inexistente");
    }

    #[test]
    fn interpolates_parameters() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate("pt", "vehicle_already_booked", &[("plate", "XYZ9A87")]);
        assert!(msg.contains("XYZ9A87"));
        assert!(!msg.contains("{plate}"));
    }
}
