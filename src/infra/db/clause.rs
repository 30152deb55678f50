//! Parameterized `SET` / `WHERE` clauses built from a sparse [`Song`].
//!
//! Placeholders are numbered `$1..$N` in descriptor order, one per set field. Callers appending
//! further parameters continue at [`Clause::next_placeholder`].

use sqlx::{
    Postgres,
    postgres::PgArguments,
    query::{Query, QueryAs},
};

use crate::domain::songs::{FieldValue, Song, SongField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Set,
    Where,
}

impl ClauseKind {
    fn keyword(self) -> &'static str {
        match self {
            ClauseKind::Set => "SET ",
            ClauseKind::Where => "WHERE ",
        }
    }

    fn joiner(self) -> &'static str {
        match self {
            ClauseKind::Set => ", ",
            ClauseKind::Where => " AND ",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clause {
    pub sql: String,
    pub args: Vec<FieldValue>,
}

impl Clause {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn next_placeholder(&self) -> usize {
        self.args.len() + 1
    }
}

/// Build a clause from the fields of `filter` that are set, visiting `fields` in order.
///
/// Returns an empty clause when nothing is set so callers never emit a bare keyword.
pub fn build_clause(kind: ClauseKind, filter: &Song, fields: &[SongField]) -> Clause {
    if filter.is_empty() {
        return Clause::default();
    }

    let mut args = Vec::with_capacity(fields.len());
    let mut fragments = Vec::with_capacity(fields.len());
    for field in fields {
        if let Some(value) = field.value(filter) {
            args.push(value);
            fragments.push(format!("{}=${}", field.column(), args.len()));
        }
    }

    if fragments.is_empty() {
        return Clause::default();
    }

    Clause {
        sql: format!("{}{}", kind.keyword(), fragments.join(kind.joiner())),
        args,
    }
}

pub(super) fn bind_query<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    args: &[FieldValue],
) -> Query<'q, Postgres, PgArguments> {
    for arg in args {
        query = match arg {
            FieldValue::BigInt(value) => query.bind(*value),
            FieldValue::Text(value) => query.bind(value.clone()),
            FieldValue::Date(value) => query.bind(*value),
        };
    }
    query
}

pub(super) fn bind_query_as<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    args: &[FieldValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for arg in args {
        query = match arg {
            FieldValue::BigInt(value) => query.bind(*value),
            FieldValue::Text(value) => query.bind(value.clone()),
            FieldValue::Date(value) => query.bind(*value),
        };
    }
    query
}
