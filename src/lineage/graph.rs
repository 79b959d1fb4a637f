use indexmap::IndexMap;

use crate::ast::{ClauseSet, JoinCondition, Name, Token, TokenType};
use crate::lineage::binder::{AliasMap, ResolvedColumn};
use crate::lineage::{TableColumn, TableColumnJoin};

/// One column equality discovered in an ON clause, a USING list or a WHERE
/// conjunct, sides in source order.
pub(crate) struct Edge {
    pub(crate) left: ResolvedColumn,
    pub(crate) right: ResolvedColumn,
}

pub(crate) fn collect_edges(clauses: &ClauseSet, aliases: &AliasMap) -> Vec<Edge> {
    let mut edges = vec![];
    for (join_idx, item) in clauses.join_items.iter().enumerate() {
        match &item.condition {
            JoinCondition::On(predicate) => collect_predicate_edges(predicate, aliases, &mut edges),
            JoinCondition::Using(columns) => {
                collect_using_edges(clauses, join_idx, columns, aliases, &mut edges)
            }
            JoinCondition::None => {}
        }
    }
    if let Some(predicate) = &clauses.where_predicate {
        collect_predicate_edges(predicate, aliases, &mut edges);
    }
    edges
}

/// Walks the top-level AND conjuncts of a predicate and keeps the ones that
/// are a plain equality between two resolvable column references. Anything
/// else, a literal comparison, a function call, an OR, drops out.
fn collect_predicate_edges(predicate: &[Token], aliases: &AliasMap, edges: &mut Vec<Edge>) {
    for conjunct in split_conjuncts(predicate) {
        let conjunct = strip_enclosing_parens(conjunct);
        let Some((left, right)) = equality_sides(conjunct) else {
            continue;
        };
        let (Some(left), Some(right)) = (column_path(left), column_path(right)) else {
            continue;
        };
        let (Some(left), Some(right)) = (
            aliases.resolve_reference(&left),
            aliases.resolve_reference(&right),
        ) else {
            continue;
        };
        edges.push(Edge { left, right });
    }
}

/// A USING list equates each named column between the joined source and the
/// source immediately before it.
fn collect_using_edges(
    clauses: &ClauseSet,
    join_idx: usize,
    columns: &[Name],
    aliases: &AliasMap,
    edges: &mut Vec<Edge>,
) {
    let right_idx = clauses.from_items.len() + join_idx;
    let Some(left_idx) = right_idx.checked_sub(1) else {
        return;
    };
    let (Some(left_table), Some(right_table)) = (
        aliases.source_table(left_idx),
        aliases.source_table(right_idx),
    ) else {
        log::debug!("USING join touches a subquery source, skipping");
        return;
    };
    for column in columns {
        edges.push(Edge {
            left: ResolvedColumn {
                source_idx: left_idx,
                table: left_table.clone(),
                column: column.text.clone(),
            },
            right: ResolvedColumn {
                source_idx: right_idx,
                table: right_table.clone(),
                column: column.text.clone(),
            },
        });
    }
}

/// Groups edges by join source. The source side of an edge is the one whose
/// table appears earlier in FROM/JOIN order; on a tie the lexically left side
/// stays the source. Within a source table, edges sharing a source column
/// merge into one record and duplicate targets collapse.
pub(crate) fn group_edges(edges: Vec<Edge>) -> IndexMap<String, Vec<TableColumnJoin>> {
    let mut joins: IndexMap<String, Vec<TableColumnJoin>> = IndexMap::new();
    for edge in edges {
        let (source, target) = if edge.left.source_idx <= edge.right.source_idx {
            (edge.left, edge.right)
        } else {
            (edge.right, edge.left)
        };
        let target = TableColumn {
            table: target.table.clean(),
            column: target.column,
        };
        let records = joins.entry(source.table.clean()).or_default();
        match records
            .iter()
            .position(|record| record.table_column.column == source.column)
        {
            Some(pos) => {
                if !records[pos].joined_with.contains(&target) {
                    records[pos].joined_with.push(target);
                }
            }
            None => records.push(TableColumnJoin {
                table_column: TableColumn {
                    table: source.table.clean(),
                    column: source.column,
                },
                joined_with: vec![target],
            }),
        }
    }
    joins
}

fn split_conjuncts(tokens: &[Token]) -> Vec<&[Token]> {
    let mut conjuncts = vec![];
    let mut depth = 0u32;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenType::LeftParen => depth += 1,
            TokenType::RightParen => depth = depth.saturating_sub(1),
            TokenType::And if depth == 0 => {
                conjuncts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    conjuncts.push(&tokens[start..]);
    conjuncts
}

fn strip_enclosing_parens(mut tokens: &[Token]) -> &[Token] {
    while tokens.len() >= 2
        && matches!(tokens[0].kind, TokenType::LeftParen)
        && matches!(tokens[tokens.len() - 1].kind, TokenType::RightParen)
        && encloses(tokens)
    {
        tokens = &tokens[1..tokens.len() - 1];
    }
    tokens
}

/// True when the opening paren at position 0 closes at the last position.
fn encloses(tokens: &[Token]) -> bool {
    let mut depth = 0u32;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenType::LeftParen => depth += 1,
            TokenType::RightParen => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i < tokens.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    true
}

/// Accepts only `ident(.ident)*` runs, rejecting anything with a literal, an
/// operator or a call in it.
fn column_path(tokens: &[Token]) -> Option<Vec<Name>> {
    if tokens.is_empty() || tokens.len() % 2 == 0 {
        return None;
    }
    let mut parts = vec![];
    for (i, token) in tokens.iter().enumerate() {
        if i % 2 == 0 {
            match token.kind {
                TokenType::Identifier(_) | TokenType::QuotedIdentifier(_) => {
                    parts.push(Name::from_token(token));
                }
                _ => return None,
            }
        } else if !matches!(token.kind, TokenType::Dot) {
            return None;
        }
    }
    Some(parts)
}

fn equality_sides(tokens: &[Token]) -> Option<(&[Token], &[Token])> {
    let mut depth = 0u32;
    let mut split = None;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenType::LeftParen => depth += 1,
            TokenType::RightParen => depth = depth.saturating_sub(1),
            TokenType::Equal if depth == 0 => {
                if split.is_some() {
                    return None;
                }
                split = Some(i);
            }
            _ => {}
        }
    }
    let split = split?;
    if split == 0 || split == tokens.len() - 1 {
        return None;
    }
    Some((&tokens[..split], &tokens[split + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::parser::extract_clauses;

    fn collect(sql: &str) -> Vec<Edge> {
        let clauses = extract_clauses(sql, Dialect::Ansi).unwrap();
        let aliases = AliasMap::bind(&clauses);
        collect_edges(&clauses, &aliases)
    }

    #[test]
    fn test_on_and_where_equalities_collect() {
        let edges = collect("select a from t join u on t.a = u.a where t.b = u.b and u.c > 1");
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_or_and_literal_predicates_drop_out() {
        let edges = collect("select a from t join u on t.a = u.a or t.b = u.b where t.c = 'x'");
        assert!(edges.is_empty());
    }

    #[test]
    fn test_parenthesized_conjuncts_unwrap() {
        let edges = collect("select a from t join u on (t.a = u.a) and (t.b = u.b)");
        assert_eq!(edges.len(), 2);
    }

    #[test]
    fn test_using_joins_pair_adjacent_sources() {
        let edges = collect("select a from t join u using (id, code)");
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].left.table.clean(), "t");
        assert_eq!(edges[0].right.table.clean(), "u");
        assert_eq!(edges[0].left.column, "id");
    }

    #[test]
    fn test_group_edges_merges_records_by_source_column() {
        let edges = collect(
            "select a from foo f join g1 on f.x = g1.a join g2 on f.x = g2.b join g3 on f.y = g3.c",
        );
        let joins = group_edges(edges);
        let records = &joins["foo"];
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].table_column.column, "x");
        assert_eq!(records[0].joined_with.len(), 2);
        assert_eq!(records[1].table_column.column, "y");
    }

    #[test]
    fn test_duplicate_targets_collapse() {
        let edges = collect("select a from t join u on t.a = u.b where t.a = u.b");
        let joins = group_edges(edges);
        assert_eq!(joins["t"][0].joined_with.len(), 1);
    }
}
