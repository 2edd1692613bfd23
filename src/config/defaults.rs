//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [site] Section Defaults
// ============================================================================

pub mod site {
    pub fn title() -> String {
        "Micro World".into()
    }

    pub fn language() -> String {
        "ja".into()
    }

    pub fn base_path() -> String {
        "/".into()
    }

    pub fn home_label() -> String {
        "ホーム".into()
    }

    pub fn list_label() -> String {
        "一覧".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn store() -> PathBuf {
        "micro".into()
    }

    pub fn output() -> PathBuf {
        "generated".into()
    }

    pub fn legacy_posts() -> PathBuf {
        "content/posts".into()
    }

    pub fn legacy_root() -> PathBuf {
        "./".into()
    }

    pub fn routes_filename() -> String {
        "routes.json".into()
    }

    pub fn label() -> Option<String> {
        None
    }
}
