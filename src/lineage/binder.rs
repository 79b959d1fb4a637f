use indexmap::IndexMap;

use crate::ast::{ClauseSet, Name, TableSource};
use crate::lineage::QualifiedTable;

/// A column reference resolved against one bound source.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedColumn {
    pub(crate) source_idx: usize,
    pub(crate) table: QualifiedTable,
    pub(crate) column: String,
}

/// Binding of alias keys to FROM/JOIN sources.
///
/// Every source occupies one slot in appearance order whether or not it is a
/// table; subqueries hold `None` so their aliases never reach column lineage.
/// An unaliased table binds under its bare name. Rebinding an existing key
/// keeps the key's position and replaces its target, so the last binding wins.
pub(crate) struct AliasMap {
    sources: Vec<Option<QualifiedTable>>,
    entries: IndexMap<String, usize>,
}

impl AliasMap {
    pub(crate) fn bind(clauses: &ClauseSet) -> AliasMap {
        let mut map = AliasMap {
            sources: vec![],
            entries: IndexMap::new(),
        };
        for item in &clauses.from_items {
            map.bind_source(&item.source, item.alias.as_ref());
        }
        for item in &clauses.join_items {
            map.bind_source(&item.source, item.alias.as_ref());
        }
        map
    }

    fn bind_source(&mut self, source: &TableSource, alias: Option<&Name>) {
        let idx = self.sources.len();
        self.sources.push(match source {
            TableSource::Table(path) => Some(QualifiedTable::from_path(path)),
            TableSource::Subquery => None,
        });

        let key = match (alias, source) {
            (Some(alias), _) => Some(alias.normalized()),
            (None, TableSource::Table(path)) => path.parts.last().map(|part| part.normalized()),
            (None, TableSource::Subquery) => None,
        };
        if let Some(key) = key {
            if self.entries.insert(key.clone(), idx).is_some() {
                log::warn!("Alias `{}` is bound more than once, keeping the last binding", key);
            }
        }
    }

    /// Bound tables in appearance order, duplicates included.
    pub(crate) fn tables(&self) -> impl Iterator<Item = &QualifiedTable> {
        self.sources.iter().flatten()
    }

    pub(crate) fn source_table(&self, idx: usize) -> Option<&QualifiedTable> {
        self.sources.get(idx)?.as_ref()
    }

    /// Alias to clean table string, in first-seen order. Subquery aliases are
    /// left out.
    pub(crate) fn alias_view(&self) -> IndexMap<String, String> {
        let mut view = IndexMap::new();
        for (key, idx) in &self.entries {
            if let Some(table) = &self.sources[*idx] {
                view.insert(key.clone(), table.clean());
            }
        }
        view
    }

    /// Resolves a dotted column path against the bound sources. `None` means
    /// the reference is ambiguous or unresolved and the predicate it came
    /// from should be skipped.
    pub(crate) fn resolve_reference(&self, parts: &[Name]) -> Option<ResolvedColumn> {
        let (column, qualifier) = parts.split_last()?;
        let source_idx = if qualifier.is_empty() {
            self.resolve_bare()?
        } else if qualifier.len() == 1 {
            match self.probe_alias(&qualifier[0]) {
                Some(idx) => idx,
                None => self.lookup_table(qualifier)?,
            }
        } else {
            self.lookup_table(qualifier)?
        };
        let Some(table) = self.sources[source_idx].clone() else {
            log::debug!("Column qualifier resolves to a subquery, skipping");
            return None;
        };
        Some(ResolvedColumn {
            source_idx,
            table,
            column: column.text.clone(),
        })
    }

    fn resolve_bare(&self) -> Option<usize> {
        if self.sources.len() == 1 && self.sources[0].is_some() {
            Some(0)
        } else {
            log::debug!("Bare column cannot be attributed to a single table, skipping");
            None
        }
    }

    /// Exact lookup under the binding's normalization, then a case-insensitive
    /// pass so an unquoted probe still reaches bindings that kept a quoted
    /// spelling.
    fn probe_alias(&self, qualifier: &Name) -> Option<usize> {
        let key = qualifier.normalized();
        if let Some(idx) = self.entries.get(&key) {
            return Some(*idx);
        }
        if qualifier.quoted {
            return None;
        }
        let mut matches = self
            .entries
            .iter()
            .filter(|(bound, _)| bound.eq_ignore_ascii_case(&key))
            .map(|(_, idx)| *idx);
        let first = matches.next()?;
        if matches.next().is_some() {
            log::warn!("Qualifier `{}` matches more than one binding, skipping", qualifier.text);
            return None;
        }
        Some(first)
    }

    /// Matches a qualifier against the tail of each bound table path, e.g.
    /// `schema.t` against `db.schema.t`.
    fn lookup_table(&self, qualifier: &[Name]) -> Option<usize> {
        let mut first_match: Option<usize> = None;
        for (idx, source) in self.sources.iter().enumerate() {
            let Some(table) = source else { continue };
            if !path_suffix_matches(table, qualifier) {
                continue;
            }
            match first_match {
                None => first_match = Some(idx),
                Some(prev) if self.sources[prev].as_ref() == Some(table) => {}
                Some(_) => {
                    log::warn!("Column qualifier matches more than one table, skipping");
                    return None;
                }
            }
        }
        if first_match.is_none() {
            log::debug!("Column qualifier does not match any bound table, skipping");
        }
        first_match
    }
}

fn path_suffix_matches(table: &QualifiedTable, qualifier: &[Name]) -> bool {
    let mut table_parts: Vec<&str> = vec![];
    if let Some(schema) = &table.schema {
        table_parts.extend(schema.split('.'));
    }
    table_parts.push(&table.name);
    if qualifier.len() > table_parts.len() {
        return false;
    }
    let tail = &table_parts[table_parts.len() - qualifier.len()..];
    qualifier.iter().zip(tail).all(|(part, bound)| {
        if part.quoted {
            part.text == *bound
        } else {
            part.text.eq_ignore_ascii_case(bound)
        }
    })
}
