//! Secondary index maintenance.
//!
//! An index maps a field value to the locator of the element carrying it
//! inside a configured collection — an array position or an object key.
//! Indices are updated incrementally in response to each mutation and
//! rebuilt wholesale when the collection itself is replaced.
//!
//! Updates are two-phase: [`IndexManager::prepare`] validates the
//! intended changes against the current maps without touching anything
//! (unique violations surface here, before the mutation is applied or
//! logged), and [`IndexManager::commit`] applies the planned deltas after
//! the document mutation has gone through.

use crate::error::{EngineError, EngineResult};
use crate::mutation::Mutation;
use crate::path;
use serde_json::Value;
use std::collections::HashMap;

/// Definition of a named secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    /// Index name, used for [`find_by_index`](crate::Store::find_by_index).
    pub name: String,
    /// Path of the indexed collection (array or object).
    pub collection_path: String,
    /// Direct property of each element whose value is indexed.
    pub field: String,
    /// Whether two elements may carry the same field value.
    pub unique: bool,
}

impl IndexDefinition {
    /// Creates a non-unique index definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        collection_path: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            collection_path: collection_path.into(),
            field: field.into(),
            unique: false,
        }
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// Identifies an element within its collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Object key.
    Key(String),
    /// Array position.
    Pos(usize),
}

#[derive(Debug)]
struct IndexState {
    def: IndexDefinition,
    segments: Vec<String>,
    entries: HashMap<String, Locator>,
}

/// Validated index deltas for one mutation, produced by `prepare` and
/// applied by `commit`.
#[derive(Debug, Default)]
pub struct IndexPlan {
    steps: Vec<PlanStep>,
}

#[derive(Debug)]
enum PlanStep {
    /// Rebuild index `index` from the post-mutation collection.
    Rebuild { index: usize },
    /// Apply point deltas to index `index`.
    Update {
        index: usize,
        remove_keys: Vec<String>,
        insert: Option<(String, Locator)>,
    },
}

/// How a mutation path relates to a collection path.
enum Relation {
    Equal,
    /// The mutation replaces an ancestor of the collection.
    Ancestor,
    /// The mutation lands inside element `key` of the collection.
    Descendant { key: String, rest_start: usize },
    Unrelated,
}

fn relate(collection: &[String], mutated: &[String]) -> Relation {
    let shared = collection
        .iter()
        .zip(mutated)
        .take_while(|(a, b)| a == b)
        .count();
    if shared == collection.len() && shared == mutated.len() {
        Relation::Equal
    } else if shared == mutated.len() {
        Relation::Ancestor
    } else if shared == collection.len() {
        Relation::Descendant {
            key: mutated[shared].clone(),
            rest_start: shared + 1,
        }
    } else {
        Relation::Unrelated
    }
}

/// Canonical map key for an indexed value: its compact JSON encoding.
fn canonical_key(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// Extracts the indexed field of an element. Absent and null fields are
/// not indexed; non-object elements carry no fields.
fn field_key(element: &Value, field: &str) -> Option<String> {
    element
        .as_object()
        .and_then(|map| map.get(field))
        .filter(|v| !v.is_null())
        .map(canonical_key)
}

fn build_entries(
    collection: Option<&Value>,
    def: &IndexDefinition,
) -> EngineResult<HashMap<String, Locator>> {
    let mut entries = HashMap::new();
    match collection {
        Some(Value::Array(items)) => {
            for (pos, element) in items.iter().enumerate() {
                if let Some(key) = field_key(element, &def.field) {
                    if def.unique && entries.contains_key(&key) {
                        return Err(EngineError::unique_index_violation(&def.name, key));
                    }
                    entries.insert(key, Locator::Pos(pos));
                }
            }
        }
        Some(Value::Object(map)) => {
            for (name, element) in map {
                if let Some(key) = field_key(element, &def.field) {
                    if def.unique && entries.contains_key(&key) {
                        return Err(EngineError::unique_index_violation(&def.name, key));
                    }
                    entries.insert(key, Locator::Key(name.clone()));
                }
            }
        }
        _ => {}
    }
    Ok(entries)
}

/// Maintains every configured index.
#[derive(Debug, Default)]
pub struct IndexManager {
    indices: Vec<IndexState>,
}

impl IndexManager {
    /// Creates a manager for `definitions` with empty maps.
    #[must_use]
    pub fn new(definitions: Vec<IndexDefinition>) -> Self {
        let indices = definitions
            .into_iter()
            .map(|def| IndexState {
                segments: path::parse(&def.collection_path),
                def,
                entries: HashMap::new(),
            })
            .collect();
        Self { indices }
    }

    /// Returns whether no indices are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns whether a mutation at `segments` touches any indexed
    /// collection.
    #[must_use]
    pub fn relates(&self, segments: &[String]) -> bool {
        self.indices
            .iter()
            .any(|s| !matches!(relate(&s.segments, segments), Relation::Unrelated))
    }

    /// Rebuilds every index from `doc`.
    ///
    /// # Errors
    ///
    /// A duplicate in a unique index is a hard error; this is how
    /// pre-existing violations surface at open time.
    pub fn rebuild_all(&mut self, doc: &Value) -> EngineResult<()> {
        for state in &mut self.indices {
            state.entries = build_entries(path::get(doc, &state.segments), &state.def)?;
        }
        Ok(())
    }

    /// Validates the index updates `mutation` implies against `doc` (the
    /// pre-mutation document) without modifying any map.
    ///
    /// # Errors
    ///
    /// [`EngineError::UniqueIndexViolation`] when an insert would give a
    /// unique value a second locator, or a duplicate exists inside a
    /// replacement collection. Nothing has been applied when this errors.
    pub fn prepare(&self, doc: &Value, mutation: &Mutation) -> EngineResult<IndexPlan> {
        let mutated = path::parse(mutation.path());
        let mut plan = IndexPlan::default();

        for (i, state) in self.indices.iter().enumerate() {
            match relate(&state.segments, &mutated) {
                Relation::Unrelated => {}
                Relation::Equal | Relation::Ancestor => {
                    // Dry-run the rebuild on the candidate collection so
                    // duplicates reject the mutation up front.
                    let candidate = match mutation {
                        Mutation::Set { value, .. } => {
                            path::get(value, &state.segments[mutated.len()..])
                        }
                        Mutation::Delete { .. } => None,
                    };
                    build_entries(candidate, &state.def)?;
                    plan.steps.push(PlanStep::Rebuild { index: i });
                }
                Relation::Descendant { key, rest_start } => {
                    let rest = &mutated[rest_start..];
                    let collection = path::get(doc, &state.segments);

                    if let Some(Value::Array(items)) = collection {
                        let Ok(pos) = key.parse::<usize>() else {
                            // The path pre-flight rejects this mutation
                            // before it reaches the index layer.
                            continue;
                        };
                        if rest.is_empty() && matches!(mutation, Mutation::Delete { .. }) {
                            // Removal shifts every later position.
                            plan.steps.push(PlanStep::Rebuild { index: i });
                            continue;
                        }
                        let old_element = items.get(pos);
                        let new_element = new_element_value(old_element, rest, mutation)?;
                        self.plan_update(
                            i,
                            old_element,
                            new_element.as_ref(),
                            Locator::Pos(pos),
                            &mut plan,
                        )?;
                    } else {
                        let locator = Locator::Key(key.clone());
                        let old_element = collection
                            .and_then(Value::as_object)
                            .and_then(|map| map.get(&key));

                        if rest.is_empty() && matches!(mutation, Mutation::Delete { .. }) {
                            let remove_keys = state
                                .entries
                                .iter()
                                .filter(|(_, loc)| **loc == locator)
                                .map(|(k, _)| k.clone())
                                .collect();
                            plan.steps.push(PlanStep::Update {
                                index: i,
                                remove_keys,
                                insert: None,
                            });
                            continue;
                        }
                        let new_element = new_element_value(old_element, rest, mutation)?;
                        self.plan_update(i, old_element, new_element.as_ref(), locator, &mut plan)?;
                    }
                }
            }
        }
        Ok(plan)
    }

    /// Applies a validated plan. `doc` must be the post-mutation
    /// document.
    pub fn commit(&mut self, plan: IndexPlan, doc: &Value) -> EngineResult<()> {
        for step in plan.steps {
            match step {
                PlanStep::Rebuild { index } => {
                    let state = &mut self.indices[index];
                    state.entries = build_entries(path::get(doc, &state.segments), &state.def)?;
                }
                PlanStep::Update {
                    index,
                    remove_keys,
                    insert,
                } => {
                    let state = &mut self.indices[index];
                    for key in remove_keys {
                        state.entries.remove(&key);
                    }
                    if let Some((key, locator)) = insert {
                        state.entries.insert(key, locator);
                    }
                }
            }
        }
        Ok(())
    }

    /// Dereferences `value` through index `name` into `doc`.
    #[must_use]
    pub fn lookup(&self, doc: &Value, name: &str, value: &Value) -> Option<Value> {
        let state = self.indices.iter().find(|s| s.def.name == name)?;
        let locator = state.entries.get(&canonical_key(value))?;
        let collection = path::get(doc, &state.segments)?;
        match (collection, locator) {
            (Value::Array(items), Locator::Pos(pos)) => items.get(*pos).cloned(),
            (Value::Object(map), Locator::Key(key)) => map.get(key).cloned(),
            _ => None,
        }
    }

    fn plan_update(
        &self,
        index: usize,
        old_element: Option<&Value>,
        new_element: Option<&Value>,
        locator: Locator,
        plan: &mut IndexPlan,
    ) -> EngineResult<()> {
        let state = &self.indices[index];
        let old_key = old_element.and_then(|e| field_key(e, &state.def.field));
        let new_key = new_element.and_then(|e| field_key(e, &state.def.field));

        if old_key == new_key {
            return Ok(());
        }

        if let Some(key) = &new_key {
            if state.def.unique {
                if let Some(existing) = state.entries.get(key) {
                    if *existing != locator {
                        return Err(EngineError::unique_index_violation(
                            &state.def.name,
                            key.clone(),
                        ));
                    }
                }
            }
        }

        let remove_keys = old_key
            .filter(|key| state.entries.get(key) == Some(&locator))
            .into_iter()
            .collect();
        plan.steps.push(PlanStep::Update {
            index,
            remove_keys,
            insert: new_key.map(|key| (key, locator)),
        });
        Ok(())
    }
}

/// Computes the element's post-mutation value: the mutation value itself
/// at the element path, or the element clone with the sub-path mutation
/// applied.
fn new_element_value(
    old_element: Option<&Value>,
    rest: &[String],
    mutation: &Mutation,
) -> EngineResult<Option<Value>> {
    if rest.is_empty() {
        return Ok(match mutation {
            Mutation::Set { value, .. } => Some(value.clone()),
            Mutation::Delete { .. } => None,
        });
    }

    let mut element = old_element
        .cloned()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    match mutation {
        Mutation::Set { path: full, value } => {
            path::set(&mut element, full, rest, value.clone())?;
        }
        Mutation::Delete { path: full } => {
            path::unset(&mut element, full, rest)?;
        }
    }
    Ok(Some(element))
}
