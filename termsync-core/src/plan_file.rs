//! Reading and writing serialized plans.
//!
//! Writes use the same atomic `.tmp` + rename pattern as the config
//! directory: a crashed write never leaves a truncated plan behind.

use std::path::Path;

use crate::error::{io_err, PlanError};
use crate::types::Plan;

/// Load a plan written by [`save`] (or by any tool emitting the same JSON).
pub fn load(path: &Path) -> Result<Plan, PlanError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save a plan as pretty JSON, atomically.
pub fn save(path: &Path, plan: &Plan) -> Result<(), PlanError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }
    let json = serde_json::to_string_pretty(plan)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::*;
    use crate::types::NewTerm;

    #[test]
    fn saved_plan_loads_back_identically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("plan.json");
        let plan = Plan::new(
            vec![NewTerm {
                term: "home.title".into(),
                context: "<h1>{t('home.title')}</h1>".into(),
                reference: "src/pages/home.tsx".into(),
                tags: vec!["react".into()],
                comment: String::new(),
            }],
            vec![],
            vec!["legacy.banner".into()],
            BTreeMap::new(),
            BTreeMap::new(),
        )
        .unwrap();

        save(&path, &plan).unwrap();
        let loaded = load(&path).unwrap();
        assert_eq!(loaded, plan);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, PlanError::Io { path: ref p, .. } if p == &path));
    }
}
