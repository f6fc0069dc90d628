use anyhow::{Context, Error, Result};
use change_impact::AnalysisOptions;
use serde::Deserialize;
use serde_json::error::Category;
use std::{fs::read_to_string, path::Path};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisOptions,
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = read_to_string(path).context("Failed to read config file")?;

    serde_json::from_str::<Config>(&content).map_err(|e| convert_json_err(e, "config"))
}

pub fn convert_json_err(e: serde_json::Error, what: &str) -> Error {
    let line = e.line();
    let column = e.column();

    let msg = match e.classify() {
        Category::Io => "io error",
        Category::Syntax => "syntax error",
        Category::Data => "unmatched data",
        Category::Eof => "unexpected eof",
    };
    Error::new(e).context(format!(
        "Failed to deserialize {} (json) file: {}: {}:{}",
        what, msg, line, column
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use change_impact::checker::CheckerKind;

    #[test]
    fn test_config_overrides_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "analysis": { "maxNodes": 10, "checkers": ["syncError"] } }"#,
        )
        .unwrap();
        assert_eq!(config.analysis.max_nodes, 10);
        assert_eq!(config.analysis.checkers, vec![CheckerKind::SyncError]);
        assert_eq!(
            config.analysis.max_steps_per_node,
            AnalysisOptions::default().max_steps_per_node
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = serde_json::from_str::<Config>(r#"{ "analysis": { "maxSteps": 1 } }"#)
            .map_err(|e| convert_json_err(e, "config"))
            .unwrap_err();
        assert!(err.to_string().contains("unmatched data"));
    }
}
