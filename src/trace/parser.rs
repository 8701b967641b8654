/// Trace line parsing
///
/// Each trace line is a JSON object `{"sql": ..., "results": [...]}`. The
/// parser extracts the literal arguments with three regexes (quoted string,
/// number, IN-list), normalises the SQL into a template and interns it.
/// `LIMIT n` / `OFFSET n` are masked before substitution and restored
/// verbatim, so their numbers are neither templated nor extracted.
use regex::Regex;

use crate::error::{ModelError, ModelResult};
use crate::trace::registry::TemplateRegistry;
use crate::trace::statement::Statement;
use crate::value::{UnorderedSet, Value};

const LIMIT_MASK: &str = "%%LIMIT_REPLACEMENT%%";
const OFFSET_MASK: &str = "%%OFFSET_REPLACEMENT%%";

/// Parser for JSON-per-line SQL traces
pub struct StatementParser {
    argument_pattern: Regex,
    scalar_pattern: Regex,
    string_pattern: Regex,
    number_pattern: Regex,
    unquoted_list_pattern: Regex,
    undigit_list_pattern: Regex,
    limit_pattern: Regex,
    offset_pattern: Regex,
}

impl Default for StatementParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementParser {
    pub fn new() -> Self {
        Self {
            argument_pattern: Regex::new(r"('[^']*'|\b\d+(\.\d+)?\b| IN \([^)]+\))")
                .expect("argument pattern is valid"),
            scalar_pattern: Regex::new(r"('[^']*'|\b\d+(\.\d+)?\b)")
                .expect("scalar pattern is valid"),
            string_pattern: Regex::new(r"'[^']*'").expect("string pattern is valid"),
            number_pattern: Regex::new(r"\b\d+(\.\d+)?\b").expect("number pattern is valid"),
            unquoted_list_pattern: Regex::new(r" IN \(([^)']+)\)")
                .expect("unquoted list pattern is valid"),
            undigit_list_pattern: Regex::new(r" IN \(([^)0-9]+)\)")
                .expect("undigit list pattern is valid"),
            limit_pattern: Regex::new(r"LIMIT \d+").expect("limit pattern is valid"),
            offset_pattern: Regex::new(r"OFFSET \d+").expect("offset pattern is valid"),
        }
    }

    /// Parse one trace line into a `Statement`, interning its template.
    pub fn parse_line(
        &self,
        registry: &mut TemplateRegistry,
        line: &str,
    ) -> ModelResult<Statement> {
        let json: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| ModelError::parse_with_line(e.to_string(), line))?;
        let sql = json
            .get("sql")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ModelError::parse_with_line("missing \"sql\" field", line))?;

        let result_rows = match json.get("results").and_then(|v| v.as_array()) {
            Some(rows) => rows.iter().map(|row| self.convert_row(row)).collect(),
            None => Vec::new(),
        };

        let template = self.to_template(sql);
        let template_id = registry.id(&template);

        let (masked, _, _) = self.mask_limits_and_offsets(sql.trim());
        let arguments = self.extract_arguments(&masked);
        let is_select = masked.trim_start().to_lowercase().starts_with("select");

        Ok(Statement::new(template_id, result_rows, arguments, is_select))
    }

    /// Normalise raw SQL into its template form.
    pub fn to_template(&self, sql: &str) -> String {
        let (mut template, limits, offsets) = self.mask_limits_and_offsets(sql.trim());
        template = self
            .string_pattern
            .replace_all(&template, "'?s'")
            .into_owned();
        template = self.number_pattern.replace_all(&template, "?d").into_owned();
        template = self
            .unquoted_list_pattern
            .replace_all(&template, " IN (?l)")
            .into_owned();
        template = self
            .undigit_list_pattern
            .replace_all(&template, " IN (?l)")
            .into_owned();
        for limit in limits {
            template = template.replacen(LIMIT_MASK, &limit, 1);
        }
        for offset in offsets {
            template = template.replacen(OFFSET_MASK, &offset, 1);
        }
        template
    }

    fn mask_limits_and_offsets(&self, sql: &str) -> (String, Vec<String>, Vec<String>) {
        let limits: Vec<String> = self
            .limit_pattern
            .find_iter(sql)
            .map(|m| m.as_str().to_string())
            .collect();
        let offsets: Vec<String> = self
            .offset_pattern
            .find_iter(sql)
            .map(|m| m.as_str().to_string())
            .collect();
        let masked = self.limit_pattern.replace_all(sql, LIMIT_MASK);
        let masked = self.offset_pattern.replace_all(&masked, OFFSET_MASK);
        (masked.into_owned(), limits, offsets)
    }

    fn extract_arguments(&self, sql: &str) -> Vec<Value> {
        self.argument_pattern
            .find_iter(sql)
            .map(|m| self.convert_argument(m.as_str()))
            .collect()
    }

    fn convert_argument(&self, raw: &str) -> Value {
        if raw.contains(" IN ") {
            let elements: Vec<Value> = self
                .scalar_pattern
                .find_iter(raw)
                .map(|m| self.convert_scalar(m.as_str()))
                .collect();
            Value::Set(UnorderedSet::from_values(elements))
        } else {
            self.convert_scalar(raw)
        }
    }

    fn convert_scalar(&self, raw: &str) -> Value {
        if raw.starts_with('\'') {
            Value::Str(raw[1..raw.len() - 1].to_string())
        } else {
            Value::Num(raw.parse::<f64>().unwrap_or(0.0))
        }
    }

    fn convert_row(&self, row: &serde_json::Value) -> Vec<Value> {
        match row.as_array() {
            Some(cells) => cells.iter().map(Self::convert_cell).collect(),
            // A bare scalar stands for a one-cell row.
            None => vec![Self::convert_cell(row)],
        }
    }

    fn convert_cell(cell: &serde_json::Value) -> Value {
        match cell {
            serde_json::Value::Number(n) => Value::Num(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            _ => Value::Null,
        }
    }
}
