use std::sync::OnceLock;

use regex::Regex;

/// Ordered rewrite rules applied to raw query text before tokenization.
/// Rules are independent of each other and of the dialect; each quirk is
/// simply inert on dialects that cannot produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CleanRule {
    /// Query-log exports escape newlines as the two-character sequence `\n`.
    UnescapeNewlines,
    /// Snowflake `COPY GRANTS` between the view name and `AS`.
    StripCopyGrants,
    /// `MERGE INTO ... USING (subquery)` keeps only the prefix up to the
    /// parenthesis closing the USING source; the `WHEN [NOT] MATCHED` arms
    /// carry nothing the clause grammar can read.
    TruncateMergeMatched,
    /// Bulk `COPY <target> FROM <source>` loads carry no column lineage:
    /// the whole statement is dropped.
    DiscardBulkCopy,
}

pub(crate) const CLEAN_RULES: &[CleanRule] = &[
    CleanRule::UnescapeNewlines,
    CleanRule::StripCopyGrants,
    CleanRule::TruncateMergeMatched,
    CleanRule::DiscardBulkCopy,
];

impl CleanRule {
    fn apply(&self, query: &str) -> Option<String> {
        match self {
            CleanRule::UnescapeNewlines => Some(query.replace("\\n", "\n")),
            CleanRule::StripCopyGrants => {
                static COPY_GRANTS_REGEX: OnceLock<Regex> = OnceLock::new();
                let re = COPY_GRANTS_REGEX
                    .get_or_init(|| Regex::new(r"(?i)\s+copy\s+grants\s+").expect("valid regex"));
                Some(re.replace_all(query, " ").into_owned())
            }
            CleanRule::TruncateMergeMatched => Some(truncate_merge(query)),
            CleanRule::DiscardBulkCopy => {
                static BULK_COPY_REGEX: OnceLock<Regex> = OnceLock::new();
                let re = BULK_COPY_REGEX
                    .get_or_init(|| Regex::new(r"(?is)^\s*copy\s+.+?\bfrom\b").expect("valid regex"));
                if re.is_match(query) {
                    None
                } else {
                    Some(query.to_owned())
                }
            }
        }
    }
}

/// Runs the rewrite pipeline over raw query text. `None` means the statement
/// carries no lineage at all (e.g. a bulk COPY load).
pub(crate) fn clean_raw_query(raw: &str) -> Option<String> {
    let mut query = raw.to_owned();
    for rule in CLEAN_RULES {
        let cleaned = rule.apply(&query)?;
        if cleaned != query {
            log::debug!("Clean rule {:?} rewrote the query", rule);
        }
        query = cleaned;
    }
    Some(query.trim().to_owned())
}

fn truncate_merge(query: &str) -> String {
    static MERGE_USING_REGEX: OnceLock<Regex> = OnceLock::new();
    let re = MERGE_USING_REGEX
        .get_or_init(|| Regex::new(r"(?is)\bmerge\s+into\b.*?\busing\b").expect("valid regex"));
    let Some(using) = re.find(query) else {
        return query.to_owned();
    };

    if let Some(cut) = subquery_end(&query[using.end()..]) {
        return query[..using.end() + cut].trim_end().to_owned();
    }

    // USING over a plain table: drop everything from the first WHEN arm on
    static WHEN_MATCHED_REGEX: OnceLock<Regex> = OnceLock::new();
    let when_re = WHEN_MATCHED_REGEX
        .get_or_init(|| Regex::new(r"(?i)\bwhen\s+(not\s+)?matched\b").expect("valid regex"));
    match when_re.find(query) {
        Some(when) => query[..when.start()].trim_end().to_owned(),
        None => query.to_owned(),
    }
}

/// Byte offset one past the parenthesis closing the first `(` in `tail`,
/// provided only whitespace precedes it. Parens inside string literals do
/// not count.
fn subquery_end(tail: &str) -> Option<usize> {
    let mut depth = 0u32;
    let mut in_string: Option<char> = None;
    for (i, c) in tail.char_indices() {
        if let Some(delimiter) = in_string {
            if c == delimiter {
                in_string = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => in_string = Some(c),
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            c if depth == 0 && !c.is_whitespace() => return None,
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unescape_newlines() {
        assert_eq!(
            CleanRule::UnescapeNewlines.apply("select *\\nfrom foo"),
            Some("select *\nfrom foo".to_owned())
        );
    }

    #[test]
    fn test_strip_copy_grants() {
        assert_eq!(
            clean_raw_query("create or replace view my_view copy grants as select * from my_table"),
            Some("create or replace view my_view as select * from my_table".to_owned())
        );
    }

    #[test]
    fn test_truncate_merge_with_subquery_source() {
        let query = "/* comment */ merge into table_1 using (select a, b from table_2) \
                     when matched update set t.a = 'value' \
                     when not matched insert (a, b) values ('value', 'value2')";
        assert_eq!(
            clean_raw_query(query),
            Some("/* comment */ merge into table_1 using (select a, b from table_2)".to_owned())
        );
    }

    #[test]
    fn test_truncate_merge_with_table_source() {
        assert_eq!(
            clean_raw_query("merge into t1 using t2 on t1.id = t2.id when matched then delete"),
            Some("merge into t1 using t2 on t1.id = t2.id".to_owned())
        );
    }

    #[test]
    fn test_discard_bulk_copy() {
        assert_eq!(
            clean_raw_query("COPY my_schema.my_table FROM 's3://bucket/path/object.csv'"),
            None
        );
    }

    #[test]
    fn test_clean_is_idempotent() {
        let cleaned = clean_raw_query(
            "merge into table_1 using (select a, b from table_2) when matched then delete",
        )
        .unwrap();
        assert_eq!(clean_raw_query(&cleaned), Some(cleaned.clone()));
    }

    #[test]
    fn test_clean_keeps_plain_select_untouched() {
        let query = "select a, b from t where a = 1";
        assert_eq!(clean_raw_query(query), Some(query.to_owned()));
    }

    #[test]
    fn test_merge_subquery_end_skips_string_parens() {
        let tail = " (select ')', a from t)";
        assert_eq!(subquery_end(tail), Some(tail.len()));
    }
}
