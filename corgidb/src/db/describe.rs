//! Column definitions recovered from `SHOW CREATE TABLE` text.

use crate::ddl::unescape_literal;
use regex::Regex;
use std::sync::LazyLock;

//   `pl_name` varchar(13) NOT NULL COMMENT 'Planet name',
static COLUMN_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*`([^`]+)`\s+(.*?),?\s*$").expect("column line regex"));

static COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+COMMENT\s+'((?:[^'\\]|\\.|'')*)'").expect("comment regex")
});

/// One column as written in the table's DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    /// Type, nullability and defaults, with any comment removed.
    pub definition: String,
    pub comment: Option<String>,
}

impl ColumnDefinition {
    pub fn has_comment(&self) -> bool {
        self.comment.is_some()
    }
}

/// Extracts column lines from `CREATE TABLE` text. Key and constraint lines
/// do not start with a backtick and are skipped.
pub fn parse_create_table(ddl: &str) -> Vec<ColumnDefinition> {
    ddl.lines()
        .skip_while(|line| !line.trim_end().ends_with('('))
        .skip(1)
        .filter_map(|line| COLUMN_LINE_RE.captures(line))
        .map(|caps| {
            let name = caps[1].to_string();
            let rest = &caps[2];
            match COMMENT_RE.captures(rest) {
                Some(comment) => {
                    let whole = comment.get(0).map(|m| m.range()).unwrap_or(0..0);
                    let mut definition = rest[..whole.start].to_string();
                    definition.push_str(&rest[whole.end..]);
                    ColumnDefinition {
                        name,
                        definition: definition.trim().to_string(),
                        comment: Some(unescape_literal(&comment[1])),
                    }
                }
                None => ColumnDefinition {
                    name,
                    definition: rest.trim().to_string(),
                    comment: None,
                },
            }
        })
        .collect()
}
