//! Derivation of query text from finder-method names.
//!
//! The grammar is `<prefix><Subject>[By<Predicate>][OrderBy<Property>[Asc|Desc]]`
//! where `<Predicate>` is a sequence of property tokens joined by `And`/`Or`
//! keywords. Keyword matching is case-sensitive and boundary-sensitive: a
//! keyword only splits when the character after it is uppercase, so
//! `Organization` survives containing `Or`.

use std::sync::OnceLock;

use regex::Regex;

use crate::entity::EntityMeta;
use crate::method::QueryMethod;
use crate::page::Direction;
use crate::{Error, Result};

static PREFIX: OnceLock<Regex> = OnceLock::new();

fn prefix_re() -> &'static Regex {
    // longer alternatives first: leftmost-first semantics would otherwise
    // let `find` shadow `findBy`
    PREFIX.get_or_init(|| Regex::new(r"^(findBy|readBy|getBy|find|read|get)(\p{Lu}.*)$").unwrap())
}

/// Parses a derived-query method name into query text of the form
/// `select x from <Entity> x where ...`.
pub struct QueryCreator<'a> {
    method: &'a QueryMethod,
    meta: &'a EntityMeta,
}

impl<'a> QueryCreator<'a> {
    /// Creates a creator for the given method and entity metadata.
    pub fn new(method: &'a QueryMethod, meta: &'a EntityMeta) -> Self {
        QueryCreator { method, meta }
    }

    /// Derives the query text.
    ///
    /// Fails with [`Error::QueryCreation`] for modifying methods and
    /// malformed names, [`Error::NoSuchProperty`] for predicate tokens
    /// naming no entity property, and [`Error::ArgumentMismatch`] when the
    /// number of predicate terms differs from the number of bindable
    /// parameters the method declares.
    pub fn create(&self) -> Result<String> {
        if self.method.is_modifying() {
            return Err(self.creation_error(
                "modifying methods cannot be derived and require an explicitly declared query",
            ));
        }
        let name = self.method.name();
        let caps = prefix_re()
            .captures(name)
            .ok_or_else(|| self.creation_error("name does not start with a finder prefix"))?;
        let prefix = &caps[1];
        let rest = match caps.get(2) {
            Some(rest) => rest.as_str(),
            None => return Err(self.creation_error("name carries no subject")),
        };

        let (head, order_src) = split_order_by(rest);
        let order = match order_src {
            Some(src) => Some(self.parse_order(src)?),
            None => None,
        };
        // With a `By`-suffixed prefix the whole remainder is the
        // predicate; otherwise it starts after the first `By` boundary in
        // the subject.
        let predicate_src = if prefix.ends_with("By") {
            Some(head)
        } else {
            find_keyword(head, "By").map(|at| &head[at + 2..])
        };

        let mut query = format!("select x from {} x", self.meta.name());
        let mut terms = 0;
        match predicate_src {
            Some(src) if !src.is_empty() => {
                let clause = self.build_predicate(src, &mut terms)?;
                query.push_str(&format!(" where {clause}"));
            }
            _ if order.is_none() => {
                return Err(self.creation_error("name carries neither a predicate nor an order-by clause"));
            }
            _ => {}
        }
        let bindable = self.method.parameters().bindable_count();
        if terms != bindable {
            return Err(Error::ArgumentMismatch {
                method: name.to_string(),
                expected: terms,
                actual: bindable,
            });
        }
        if let Some((property, direction)) = order {
            query.push_str(&format!(" order by x.{property} {}", direction.keyword()));
        }
        Ok(query)
    }

    fn build_predicate(&self, src: &str, terms: &mut usize) -> Result<String> {
        let names: Vec<Option<&str>> = self.method.parameters().binding_names().collect();
        let mut disjuncts = Vec::new();
        for or_segment in split_keyword(src, "Or") {
            let mut conjuncts = Vec::new();
            for token in split_keyword(or_segment, "And") {
                let property = self.checked_property(token)?;
                let placeholder = match names.get(*terms).copied().flatten() {
                    Some(name) => format!(":{name}"),
                    None => format!("?{}", *terms + 1),
                };
                conjuncts.push(format!("x.{property} = {placeholder}"));
                *terms += 1;
            }
            disjuncts.push(conjuncts.join(" and "));
        }
        Ok(disjuncts.join(" or "))
    }

    fn parse_order(&self, src: &str) -> Result<(String, Direction)> {
        let (token, direction) = if let Some(token) = src.strip_suffix("Desc") {
            (token, Direction::Desc)
        } else if let Some(token) = src.strip_suffix("Asc") {
            (token, Direction::Asc)
        } else {
            (src, Direction::Asc)
        };
        if token.is_empty() {
            return Err(self.creation_error("order-by clause names no property"));
        }
        Ok((self.checked_property(token)?, direction))
    }

    fn checked_property(&self, token: &str) -> Result<String> {
        let property = uncapitalize(token);
        if property.is_empty() {
            return Err(self.creation_error("empty property token"));
        }
        if !self.meta.has_property(&property) {
            return Err(Error::NoSuchProperty {
                property,
                entity: self.meta.name().to_string(),
                method: self.method.name().to_string(),
            });
        }
        Ok(property)
    }

    fn creation_error(&self, detail: &str) -> Error {
        Error::QueryCreation {
            method: self.method.name().to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Splits off a trailing `OrderBy...` clause at the last camel-case
/// boundary occurrence of the keyword.
fn split_order_by(s: &str) -> (&str, Option<&str>) {
    let mut found = None;
    for (at, _) in s.match_indices("OrderBy") {
        let after = &s[at + "OrderBy".len()..];
        if after.chars().next().is_some_and(char::is_uppercase) {
            found = Some(at);
        }
    }
    match found {
        Some(at) => (&s[..at], Some(&s[at + "OrderBy".len()..])),
        None => (s, None),
    }
}

/// Splits `s` on `keyword`, but only where the keyword sits at a genuine
/// camel-case boundary: the character following it must be uppercase, and
/// the keyword must not open the current segment.
fn split_keyword<'s>(s: &'s str, keyword: &str) -> Vec<&'s str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search = 0;
    while let Some(found) = s[search..].find(keyword) {
        let at = search + found;
        let after = &s[at + keyword.len()..];
        let boundary = after.chars().next().is_some_and(char::is_uppercase);
        if boundary && at > start {
            parts.push(&s[start..at]);
            start = at + keyword.len();
            search = start;
        } else {
            search = at + 1;
        }
    }
    parts.push(&s[start..]);
    parts
}

/// First camel-boundary occurrence of `keyword` in `s`.
fn find_keyword(s: &str, keyword: &str) -> Option<usize> {
    let mut search = 0;
    while let Some(found) = s[search..].find(keyword) {
        let at = search + found;
        let after = &s[at + keyword.len()..];
        if after.chars().next().is_some_and(char::is_uppercase) {
            return Some(at);
        }
        search = at + 1;
    }
    None
}

fn uncapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
