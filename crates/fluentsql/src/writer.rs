//! Rendering target shared by expressions and queries.
//!
//! SQL text and argument slots are written in a single pass, so the n-th slot
//! always belongs to the n-th `?` in the text. A slot is `None` while its
//! placeholder is still waiting for a value.

use crate::param::{Param, ParamList};

#[derive(Debug, Default)]
pub(crate) struct SqlWriter {
    sql: String,
    slots: Vec<Option<Param>>,
}

impl SqlWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub(crate) fn push_char(&mut self, ch: char) -> &mut Self {
        self.sql.push(ch);
        self
    }

    /// Emit a `?` together with its value, if one is known.
    pub(crate) fn placeholder(&mut self, value: Option<Param>) -> &mut Self {
        self.sql.push('?');
        self.slots.push(value);
        self
    }

    /// Emit a raw fragment, pairing its `?` markers with `params` left to right.
    ///
    /// Markers beyond the supplied params are left unbound.
    pub(crate) fn push_raw(&mut self, sql: &str, params: &[Param]) -> &mut Self {
        let mut next = params.iter();
        let mut last = 0;
        for pos in placeholder_offsets(sql) {
            self.sql.push_str(&sql[last..pos]);
            self.placeholder(next.next().cloned());
            last = pos + 1;
        }
        self.sql.push_str(&sql[last..]);
        self
    }

    pub(crate) fn finish(self) -> (String, Vec<Option<Param>>) {
        (self.sql, self.slots)
    }

    /// Finish a render whose slots are all known to be bound.
    pub(crate) fn finish_bound(self) -> (String, ParamList) {
        let mut params = ParamList::new();
        params.extend_params(self.slots.into_iter().flatten());
        (self.sql, params)
    }
}

/// Byte offsets of `?` markers in raw SQL, skipping quoted literals and identifiers.
pub(crate) fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut quote: Option<char> = None;
    for (i, ch) in sql.char_indices() {
        match (quote, ch) {
            // A doubled quote closes and immediately reopens, which nets out the same.
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(ch),
            (None, '?') => offsets.push(i),
            (None, _) => {}
        }
    }
    offsets
}

/// Number of `?` markers in raw SQL.
pub(crate) fn count_placeholders(sql: &str) -> usize {
    placeholder_offsets(sql).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_markers_outside_literals() {
        assert_eq!(count_placeholders("a = ? AND b = ?"), 2);
        assert_eq!(count_placeholders("a = '?' AND b = ?"), 1);
        assert_eq!(count_placeholders("a = 'it''s?' AND \"q?\" = ?"), 1);
        assert_eq!(count_placeholders("no markers"), 0);
    }

    #[test]
    fn raw_fragment_pairs_params_in_order() {
        let mut w = SqlWriter::new();
        w.push("(").push_raw("x = ? OR y = ?", &[Param::from(1)]).push(")");
        let (sql, slots) = w.finish();
        assert_eq!(sql, "(x = ? OR y = ?)");
        assert_eq!(slots, vec![Some(Param::from(1)), None]);
    }
}
