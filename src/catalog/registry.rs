/// Target-app catalog
///
/// Immutable registry of the apps shortcuts can be generated for, built once at
/// startup and shared by reference with every handler. Lookups never lock.

use crate::error::ShortcutError;
use serde::Serialize;

/// Identifier of the LINE messenger, the only automation target today
pub const LINE_APP_ID: &str = "line";

/// Display metadata and setup instructions for one target app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetApp {
    /// Catalog identifier (e.g., "line")
    pub app_id: String,
    /// Human-readable app name
    pub app_name: String,
    /// iOS bundle identifier of the app the automation watches
    pub bundle_id: String,
    /// Whether shortcuts can currently be generated for this app
    pub supported: bool,
    /// Ordered steps the user follows to attach the shortcut to an automation
    pub instructions: Vec<String>,
}

/// Read-only catalog of target apps, in registration order
#[derive(Debug, Clone)]
pub struct CatalogRegistry {
    apps: Vec<TargetApp>,
}

impl CatalogRegistry {
    /// Create a catalog from explicit entries
    pub fn new(apps: Vec<TargetApp>) -> Self {
        Self { apps }
    }

    /// The catalog shipped with the service
    pub fn builtin() -> Self {
        Self::new(vec![TargetApp {
            app_id: LINE_APP_ID.to_string(),
            app_name: "LINE".to_string(),
            bundle_id: "jp.naver.line".to_string(),
            supported: true,
            instructions: [
                "ショートカットアプリを開く",
                "オートメーション → + ボタンをタップ",
                "アプリを選択 → LINEを選択",
                "「開いた」をチェック",
                "「次へ」→ アクションを追加",
                "ダウンロードしたショートカットをインポート",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }])
    }

    /// Find the catalog entry for `app_id`
    pub fn lookup(&self, app_id: &str) -> Result<&TargetApp, ShortcutError> {
        self.apps
            .iter()
            .find(|app| app.app_id == app_id)
            .ok_or_else(|| ShortcutError::AppNotFound {
                app_id: app_id.to_string(),
                supported: self.all_ids(),
            })
    }

    /// Find an entry shortcuts can be generated for
    ///
    /// Unknown ids and entries flagged unsupported both fail with `UnsupportedApp`.
    pub fn require_supported(&self, app_id: &str) -> Result<&TargetApp, ShortcutError> {
        match self.lookup(app_id) {
            Ok(app) if app.supported => Ok(app),
            _ => {
                tracing::warn!("⚠️ Shortcut requested for unsupported app: {}", app_id);
                Err(ShortcutError::UnsupportedApp {
                    app_id: app_id.to_string(),
                    supported: self.supported_ids(),
                })
            }
        }
    }

    /// Every catalog identifier, in catalog order
    pub fn all_ids(&self) -> Vec<String> {
        self.apps.iter().map(|app| app.app_id.clone()).collect()
    }

    /// Identifiers of entries flagged as supported
    pub fn supported_ids(&self) -> Vec<String> {
        self.apps
            .iter()
            .filter(|app| app.supported)
            .map(|app| app.app_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_line() {
        let catalog = CatalogRegistry::builtin();
        let line = catalog.lookup("line").unwrap();

        assert_eq!(line.app_name, "LINE");
        assert_eq!(line.bundle_id, "jp.naver.line");
        assert!(line.supported);
        assert_eq!(line.instructions.len(), 6);
        assert_eq!(catalog.all_ids(), vec!["line".to_string()]);
    }

    #[test]
    fn unknown_app_lists_catalog_ids() {
        let catalog = CatalogRegistry::builtin();
        match catalog.lookup("instagram") {
            Err(ShortcutError::AppNotFound { app_id, supported }) => {
                assert_eq!(app_id, "instagram");
                assert_eq!(supported, vec!["line".to_string()]);
            }
            other => panic!("expected AppNotFound, got {:?}", other),
        }
    }

    #[test]
    fn unsupported_entries_are_rejected_for_generation() {
        let mut catalog = CatalogRegistry::builtin();
        catalog.apps.push(TargetApp {
            app_id: "instagram".to_string(),
            app_name: "Instagram".to_string(),
            bundle_id: "com.burbn.instagram".to_string(),
            supported: false,
            instructions: Vec::new(),
        });

        assert!(catalog.lookup("instagram").is_ok());
        match catalog.require_supported("instagram") {
            Err(ShortcutError::UnsupportedApp { supported, .. }) => {
                assert_eq!(supported, vec!["line".to_string()]);
            }
            other => panic!("expected UnsupportedApp, got {:?}", other),
        }
        assert!(catalog.require_supported("line").is_ok());
    }

    #[test]
    fn entry_serializes_with_catalog_keys() {
        let catalog = CatalogRegistry::builtin();
        let value = serde_json::to_value(catalog.lookup("line").unwrap()).unwrap();

        assert_eq!(value["app_id"], "line");
        assert_eq!(value["supported"], true);
        assert_eq!(value["instructions"][0], "ショートカットアプリを開く");
    }
}
