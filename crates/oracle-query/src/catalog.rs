//! Catalog of well-known queries.
//!
//! Each entry publishes a query under a stable tag, the query's uid. The tag
//! is an application-level name and plays no part in the query id.

use indexmap::IndexMap;
use serde_json::Value;

use crate::codec::{UnsignedFloatType, ValueType};
use crate::error::{CatalogError, FieldError, RegistryError};
use crate::query::{register_queries, LegacyRequest, OracleQuery, Query, SpotPrice};
use crate::serial::{entity_state, Entity, Field, Item, Registry, Serializable};
use crate::validate::{self, field_error};

/// A query published under a stable tag.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    tag: String,
    title: String,
    query: Option<Query>,
    active: bool,
}

impl Default for CatalogEntry {
    fn default() -> Self {
        CatalogEntry { tag: String::new(), title: String::new(), query: None, active: true }
    }
}

impl CatalogEntry {
    pub fn new(tag: &str, title: &str, query: impl Into<Query>) -> Result<CatalogEntry, CatalogError> {
        let tag = validate::text(tag).map_err(|reason| CatalogError::Malformed { reason: reason.to_string() })?;
        Ok(CatalogEntry { tag, title: title.to_string(), query: Some(query.into()), active: true })
    }

    /// Marks the entry as retired or live.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Always present on entries built by `new` or restored from state.
    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    fn require_query(&self) -> Result<&Query, CatalogError> {
        self.query.as_ref().ok_or_else(|| CatalogError::Malformed {
            reason: format!("entry {:?} has no query", self.tag),
        })
    }
}

impl Serializable for CatalogEntry {
    const TYPE: &'static str = "CatalogEntry";
    const FIELDS: &'static [Field] = &[
        Field::required("tag"),
        Field::optional("title"),
        Field::required("query"),
        Field::optional("active"),
    ];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "tag" => Some(Item::from(self.tag.as_str())),
            "title" => Some(Item::from(self.title.as_str())),
            "query" => self.query.as_ref().map(Query::to_item),
            "active" => Some(Item::Bool(self.active)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "tag" => self.tag = validate::text(&value.into_string()?).map_err(field_error)?,
            "title" => self.title = value.into_string()?,
            "query" => match value {
                Item::Entity(entity) => {
                    let query = Query::from_entity(entity).map_err(|e| FieldError::Invalid { reason: e.to_string() })?;
                    self.query = Some(query);
                }
                other => return Err(FieldError::WrongKind { expected: "query", found: other.kind_name() }),
            },
            "active" => self.active = value.into_bool()?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

/// Selects catalog entries. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub tag: Option<String>,
    /// Registry tag of the query kind, e.g. `"SpotPrice"`.
    pub query_type: Option<String>,
    pub active: Option<bool>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn query_type(mut self, query_type: &str) -> Self {
        self.query_type = Some(query_type.to_string());
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    fn matches(&self, entry: &CatalogEntry) -> bool {
        let tag_ok = self.tag.as_deref().is_none_or(|tag| tag == entry.tag);
        let type_ok = self
            .query_type
            .as_deref()
            .is_none_or(|ty| entry.query.as_ref().is_some_and(|q| q.type_tag() == ty));
        let active_ok = self.active.is_none_or(|active| active == entry.active);
        tag_ok && type_ok && active_ok
    }
}

/// Entries keyed by tag, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    entries: IndexMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: CatalogEntry) -> Result<(), CatalogError> {
        if self.entries.contains_key(&entry.tag) {
            return Err(CatalogError::DuplicateTag { tag: entry.tag });
        }
        entry.require_query()?;
        self.entries.insert(entry.tag.clone(), entry);
        Ok(())
    }

    pub fn get(&self, tag: &str) -> Option<&CatalogEntry> {
        self.entries.get(tag)
    }

    pub fn find(&self, filter: &CatalogFilter) -> Vec<&CatalogEntry> {
        self.entries.values().filter(|entry| filter.matches(entry)).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // =========================================================================
    // STATE
    // =========================================================================

    /// Serializes the catalog as a list of entry states.
    pub fn to_state(&self) -> Result<Value, CatalogError> {
        let states = self
            .entries
            .values()
            .map(entity_state)
            .collect::<Result<Vec<_>, RegistryError>>()?;
        Ok(Value::Array(states))
    }

    /// Restores a catalog written by [`Catalog::to_state`].
    pub fn from_state(registry: &Registry, state: &Value) -> Result<Catalog, CatalogError> {
        let Value::Array(states) = state else {
            return Err(CatalogError::Malformed { reason: "expected a list of entries".to_string() });
        };

        let mut catalog = Catalog::new();
        for entry_state in states {
            let entry = registry.deserialize_as::<CatalogEntry>(entry_state)?;
            catalog.add_entry(entry)?;
        }
        Ok(catalog)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(&self.to_state()?)?)
    }

    #[cfg(feature = "yaml")]
    pub fn to_yaml(&self) -> Result<String, CatalogError> {
        Ok(serde_yaml::to_string(&self.to_state()?)?)
    }

    /// Renders a table of tag, title, query type, descriptor and query id.
    pub fn to_markdown(&self) -> Result<String, CatalogError> {
        let mut out = String::from("| tag | title | type | descriptor | query id |\n");
        out.push_str("|---|---|---|---|---|\n");
        for entry in self.entries.values() {
            let query = entry.require_query()?;
            out.push_str(&format!(
                "| {} | {} | {} | `{}` | `0x{}` |\n",
                entry.tag,
                entry.title.replace('|', "\\|"),
                query.type_tag(),
                query.descriptor()?.replace('|', "\\|"),
                query.query_id()?.to_hex(),
            ));
        }
        Ok(out)
    }
}

impl Registry {
    /// A registry holding every built-in query kind, both value types and
    /// catalog entries.
    pub fn with_builtins() -> Result<Registry, RegistryError> {
        let mut registry = Registry::new();
        register_queries(&mut registry)?;
        registry.register::<ValueType>()?;
        registry.register::<UnsignedFloatType>()?;
        registry.register::<CatalogEntry>()?;
        Ok(registry)
    }
}

// =============================================================================
// BUILT-IN CATALOG
// =============================================================================

lazy_static::lazy_static! {
    static ref BUILTIN: Catalog = builtin_catalog();
}

/// Returns the well-known catalog.
pub fn builtin() -> &'static Catalog {
    &BUILTIN
}

fn builtin_catalog() -> Catalog {
    let legacy = |tag: &str, title: &str, id: u64| CatalogEntry {
        tag: tag.to_string(),
        title: title.to_string(),
        query: Some(Query::from(LegacyRequest::known(id))),
        active: true,
    };

    let entries = [
        legacy("eth-usd-legacy", "ETH/USD spot price", 1),
        legacy("btc-usd-legacy", "BTC/USD spot price", 2),
        legacy("ampl-legacy", "AMPL/USD VWAP", 10),
        legacy("uspce-legacy", "US personal consumption expenditures", 41),
        legacy("trb-usd-legacy", "TRB/USD spot price", 50),
        legacy("eth-jpy-legacy", "ETH/JPY spot price", 59),
        CatalogEntry {
            tag: "ohm-eth-spot".to_string(),
            title: "OHM/ETH spot price".to_string(),
            query: Some(Query::from(SpotPrice::known("ohm", "eth"))),
            active: false,
        },
    ];

    Catalog { entries: entries.into_iter().map(|entry| (entry.tag.clone(), entry)).collect() }
}
