//! Applying lookup tables to parsed sources.

use ctprot_model::Entry;

use crate::error::{IngestError, Result};
use crate::lookup::{LookupRule, LookupTable, MatchRule};
use crate::xml::Element;

fn value_from_lines(rule: &LookupRule, lines: &[&str]) -> Result<Option<String>> {
    let found = match rule.rule {
        MatchRule::LinePrefix => lines
            .iter()
            .find(|line| line.trim_start().starts_with(&rule.pattern))
            .and_then(|line| line.split_once(':'))
            .map(|(_, value)| value.trim().to_string()),
        MatchRule::LineContains => lines
            .iter()
            .find(|line| line.contains(&rule.pattern))
            .and_then(|line| line.split_once(':'))
            .map(|(_, value)| value.trim().to_string()),
        MatchRule::KeyEquals => lines
            .iter()
            .filter_map(|line| line.split_once('='))
            .find(|(key, _)| key.trim() == rule.pattern)
            .map(|(_, value)| value.trim().to_string()),
        MatchRule::TagText => {
            return Err(IngestError::UnsupportedRule {
                rule: rule.rule.name(),
                format: "line-based",
            });
        }
    };
    Ok(found)
}

/// Fill `entry` from a block of text lines, one field per table rule.
///
/// Every rule must match; a parameter absent from the block is a fatal
/// extraction error naming the parameter and the block.
pub(crate) fn line_table(
    table: &LookupTable,
    lines: &[&str],
    entry: &mut Entry,
    context: &str,
) -> Result<()> {
    for rule in &table.rules {
        let value =
            value_from_lines(rule, lines)?.ok_or_else(|| IngestError::MissingParameter {
                parameter: rule.display.clone(),
                context: context.to_string(),
            })?;
        entry.push(rule.display.clone(), value);
    }
    Ok(())
}

/// Fill `entry` from an XML element scope.
pub(crate) fn xml_table(
    table: &LookupTable,
    scope: &Element,
    entry: &mut Entry,
    context: &str,
) -> Result<()> {
    for rule in &table.rules {
        if rule.rule != MatchRule::TagText {
            return Err(IngestError::UnsupportedRule {
                rule: rule.rule.name(),
                format: "XML",
            });
        }
        let value =
            scope
                .descendant_text(&rule.pattern)
                .ok_or_else(|| IngestError::MissingParameter {
                    parameter: rule.display.clone(),
                    context: context.to_string(),
                })?;
        entry.push(rule.display.clone(), value);
    }
    Ok(())
}
