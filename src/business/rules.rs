//! Local detection rule file loading

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::core::{DetectRule, LOCAL_RULE_ID};
use crate::error::{ApiError, Result};
use crate::logger::log;

/// Load detection rules from a newline-delimited pattern file.
///
/// A missing path yields no rules. A file that cannot be opened or read is
/// logged and also yields no rules. Blank lines are skipped. A line that is
/// not a valid pattern is a configuration error.
pub fn load_local_rules(path: Option<&Path>) -> Result<Vec<DetectRule>> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(Vec::new()),
    };

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            log::warn!(path = %path.display(), error = %e, "Error when opening rule file");
            return Ok(Vec::new());
        }
    };

    let mut rules = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                log::warn!(path = %path.display(), error = %e, "Error while reading rule file");
                return Ok(Vec::new());
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let pattern = Regex::new(&line).map_err(|e| {
            ApiError::Config(format!(
                "invalid rule at {}:{}: {}",
                path.display(),
                index + 1,
                e
            ))
        })?;
        rules.push(DetectRule {
            id: LOCAL_RULE_ID,
            pattern,
        });
    }

    log::info!(path = %path.display(), count = rules.len(), "Local rules loaded");
    Ok(rules)
}
