//! Output formats and result shaping
//!
//! Copyright (c) 2025 Tessera Team
//! Licensed under the Apache-2.0 license

use super::results::ValidationResults;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How much of the result tree an evaluation keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Verdict only; composites short-circuit
    Flag,
    /// Root plus a flat list of failing leaves
    Basic,
    /// Failing branches only, single-child schema nodes collapsed
    #[default]
    Detailed,
    /// The complete tree
    Verbose,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Flag => "flag",
            OutputFormat::Basic => "basic",
            OutputFormat::Detailed => "detailed",
            OutputFormat::Verbose => "verbose",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flag" => Ok(OutputFormat::Flag),
            "basic" => Ok(OutputFormat::Basic),
            "detailed" => Ok(OutputFormat::Detailed),
            "verbose" => Ok(OutputFormat::Verbose),
            other => Err(format!(
                "Unknown output format '{other}'. Expected one of: flag, basic, detailed, verbose"
            )),
        }
    }
}

/// Reduce a complete result tree to the requested format
pub fn shape(results: ValidationResults, format: OutputFormat) -> ValidationResults {
    match format {
        OutputFormat::Verbose => results,
        OutputFormat::Detailed => condense(results),
        OutputFormat::Basic => flatten(results),
        OutputFormat::Flag => ValidationResults {
            nested_results: Vec::new(),
            ..results
        },
    }
}

fn condense(mut node: ValidationResults) -> ValidationResults {
    if node.is_valid {
        node.nested_results.clear();
        return node;
    }
    let mut failing: Vec<ValidationResults> = std::mem::take(&mut node.nested_results)
        .into_iter()
        .filter(|child| !child.is_valid)
        .map(condense)
        .collect();

    if failing.len() == 1 && node.keyword.is_none() && node.error_message.is_none() {
        if let Some(only) = failing.pop() {
            return only;
        }
    }
    node.nested_results = failing;
    node
}

fn flatten(results: ValidationResults) -> ValidationResults {
    let leaves: Vec<ValidationResults> = results
        .failing_leaves()
        .into_iter()
        .filter(|leaf| !std::ptr::eq(*leaf, &results))
        .map(|leaf| ValidationResults {
            nested_results: Vec::new(),
            ..leaf.clone()
        })
        .collect();
    ValidationResults {
        nested_results: leaves,
        ..results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::JsonPointer;
    use pretty_assertions::assert_eq;
    use serde_json::Map;

    fn node(keyword: Option<&str>, location: &str, valid: bool, nested: Vec<ValidationResults>) -> ValidationResults {
        ValidationResults {
            keyword: keyword.map(str::to_string),
            is_valid: valid,
            relative_location: JsonPointer::parse(location).unwrap(),
            absolute_location: None,
            instance_location: JsonPointer::root(),
            error_message: None,
            message_key: None,
            nested_results: nested,
            additional_info: Map::new(),
        }
    }

    fn sample() -> ValidationResults {
        node(
            None,
            "",
            false,
            vec![
                node(Some("type"), "/type", true, vec![]),
                node(
                    Some("properties"),
                    "/properties",
                    false,
                    vec![node(
                        None,
                        "/properties/a",
                        false,
                        vec![node(Some("minimum"), "/properties/a/minimum", false, vec![])],
                    )],
                ),
            ],
        )
    }

    #[test]
    fn test_verbose_keeps_everything() {
        assert_eq!(shape(sample(), OutputFormat::Verbose), sample());
    }

    #[test]
    fn test_detailed_prunes_and_collapses() {
        let detailed = shape(sample(), OutputFormat::Detailed);
        // the root has one failing child and collapses into it
        assert_eq!(detailed.keyword.as_deref(), Some("properties"));
        assert_eq!(detailed.nested_results.len(), 1);
        assert_eq!(detailed.nested_results[0].keyword.as_deref(), Some("minimum"));
    }

    #[test]
    fn test_basic_flattens_failing_leaves() {
        let basic = shape(sample(), OutputFormat::Basic);
        assert!(!basic.is_valid);
        assert!(basic.relative_location.is_root());
        let locations: Vec<String> = basic
            .nested_results
            .iter()
            .map(|leaf| leaf.relative_location.to_string())
            .collect();
        assert_eq!(locations, vec!["/properties/a/minimum".to_string()]);
    }

    #[test]
    fn test_flag_drops_detail() {
        let flag = shape(sample(), OutputFormat::Flag);
        assert!(!flag.is_valid);
        assert!(flag.nested_results.is_empty());
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("Verbose".parse::<OutputFormat>().unwrap(), OutputFormat::Verbose);
        assert!("tree".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default(), OutputFormat::Detailed);
    }
}
