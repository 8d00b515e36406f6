//! Order listing predicates.
//!
//! Each optional criterion of an [`OrderFilter`] has its own builder that
//! either yields a typed [`Predicate`] or nothing. The present predicates are
//! rendered to SQL fragments and joined with `AND`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value;
use storefront_types::api::OrderFilter;
use storefront_types::{OrderStatus, OrderType};

use crate::{FOLD_FN, TIMESTAMP_FORMAT, fold_case};

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring over order number, payment provider,
    /// buyer name and buyer email.
    Search(String),
    Status(OrderStatus),
    Type(OrderType),
    /// Inclusive lower amount bound.
    MinAmount(f64),
    /// Inclusive upper amount bound.
    MaxAmount(f64),
    /// Inclusive lower creation bound.
    CreatedFrom(NaiveDateTime),
    /// Exclusive upper creation bound.
    CreatedBefore(NaiveDateTime),
}

type Builder = fn(&OrderFilter) -> Option<Predicate>;

const BUILDERS: &[Builder] = &[
    search,
    status,
    order_type,
    min_price,
    max_price,
    date_from,
    date_to,
];

fn search(filter: &OrderFilter) -> Option<Predicate> {
    let term = filter.search.as_deref()?.trim();
    (!term.is_empty()).then(|| Predicate::Search(term.to_string()))
}

fn status(filter: &OrderFilter) -> Option<Predicate> {
    filter.status.map(Predicate::Status)
}

fn order_type(filter: &OrderFilter) -> Option<Predicate> {
    filter.order_type.map(Predicate::Type)
}

fn min_price(filter: &OrderFilter) -> Option<Predicate> {
    filter.min_price.map(Predicate::MinAmount)
}

fn max_price(filter: &OrderFilter) -> Option<Predicate> {
    filter.max_price.map(Predicate::MaxAmount)
}

fn date_from(filter: &OrderFilter) -> Option<Predicate> {
    filter.date_from.map(|d| Predicate::CreatedFrom(start_of(d)))
}

/// The end date is included in full: the bound is midnight of the next day.
/// `NaiveDate::MAX` has no next day and bounds nothing, so it yields no
/// predicate.
fn date_to(filter: &OrderFilter) -> Option<Predicate> {
    let next = filter.date_to?.succ_opt()?;
    Some(Predicate::CreatedBefore(start_of(next)))
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn predicates(filter: &OrderFilter) -> Vec<Predicate> {
    BUILDERS.iter().filter_map(|build| build(filter)).collect()
}

/// Escape `LIKE` wildcards so user input matches literally.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

impl Predicate {
    /// Render as a SQL fragment over the `o` (orders) and `u` (users)
    /// aliases, appending bound values to `params` in placeholder order.
    fn render(&self, params: &mut Vec<Value>) -> String {
        match self {
            Self::Search(term) => {
                let pattern = like_pattern(&fold_case(term));
                let columns = ["o.order_number", "o.payment_provider", "u.name", "u.email"];
                let parts: Vec<String> = columns
                    .iter()
                    .map(|col| {
                        params.push(Value::Text(pattern.clone()));
                        format!("{}({}) LIKE ? ESCAPE '\\'", FOLD_FN, col)
                    })
                    .collect();
                format!("({})", parts.join(" OR "))
            }
            Self::Status(status) => {
                params.push(Value::Text(status.as_str().to_string()));
                "o.status = ?".to_string()
            }
            Self::Type(kind) => match kind {
                OrderType::Component => "o.is_component = 1".to_string(),
                OrderType::Bundle => "o.is_bundle = 1".to_string(),
                OrderType::Pack => "o.is_pack = 1".to_string(),
            },
            Self::MinAmount(min) => {
                params.push(Value::Real(*min));
                "o.amount >= ?".to_string()
            }
            Self::MaxAmount(max) => {
                params.push(Value::Real(*max));
                "o.amount <= ?".to_string()
            }
            Self::CreatedFrom(ts) => {
                params.push(Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()));
                "o.created_at >= ?".to_string()
            }
            Self::CreatedBefore(ts) => {
                params.push(Value::Text(ts.format(TIMESTAMP_FORMAT).to_string()));
                "o.created_at < ?".to_string()
            }
        }
    }
}

/// A rendered `WHERE` clause (empty when no predicate applies) and its
/// positional parameters.
#[derive(Debug, Default)]
pub struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl WhereClause {
    pub fn from_predicates(predicates: &[Predicate]) -> Self {
        if predicates.is_empty() {
            return Self::default();
        }

        let mut params = Vec::new();
        let parts: Vec<String> = predicates.iter().map(|p| p.render(&mut params)).collect();
        Self {
            sql: format!(" WHERE {}", parts.join(" AND ")),
            params,
        }
    }

    pub fn build(filter: &OrderFilter) -> Self {
        Self::from_predicates(&predicates(filter))
    }
}
