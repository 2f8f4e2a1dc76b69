//! The recursive three-way property merge.
//!
//! The canonical rule set, applied per property over the key union of
//! ours and theirs:
//!
//! 1. a key only one side defines is taken verbatim (an addition on one
//!    side and a deletion on the other are indistinguishable without
//!    history; inclusion wins);
//! 2. equal values are kept;
//! 3. component values of the same kind merge component-wise and are
//!    reconstructed; a component-level split is reported as ONE
//!    conflict at the parent property, with the base value kept;
//! 4. composites (maps, sequences) recurse, coercing a missing or
//!    shape-mismatched base to an empty container;
//! 5. whichever side still equals base loses, the other side wins
//!    silently;
//! 6. a true three-way disagreement keeps the base value as the
//!    provisional result and reports a [`MergeConflict`].
//!
//! Conflicts are threaded through an explicit accumulator — never
//! shared state — and appended in owning-property visit order,
//! depth-first before returning to the caller.

use tracing::debug;

use arbor_types::{ComponentValue, MergeConflict, PropertyMap, PropertyValue};

use crate::error::{MergeArg, MergeError, MergeResult};

/// The result of a property-level three-way merge.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeOutcome {
    /// The merged mapping (complete; conflicted entries hold the base
    /// value as a provisional placeholder).
    pub properties: PropertyMap,
    /// Unresolved disagreements, in visit order.
    pub conflicts: Vec<MergeConflict>,
}

impl MergeOutcome {
    /// Returns `true` if the merge was clean.
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// The result of merging through the dynamic entry point
/// [`merge_values`], where the merged value may be a sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueOutcome {
    pub value: PropertyValue,
    pub conflicts: Vec<MergeConflict>,
}

/// Merge two property mappings against their common base.
///
/// Pure: none of the inputs are mutated, and the same inputs always
/// produce the same outcome.
pub fn merge_properties(
    base: &PropertyMap,
    ours: &PropertyMap,
    theirs: &PropertyMap,
) -> MergeOutcome {
    let mut conflicts = Vec::new();
    let properties = merge_maps(base, ours, theirs, "", &mut conflicts);
    debug!(conflicts = conflicts.len(), "property merge complete");
    MergeOutcome {
        properties,
        conflicts,
    }
}

/// Merge and hand the outcome to a caller-supplied reducer.
pub fn merge_properties_with<R>(
    base: &PropertyMap,
    ours: &PropertyMap,
    theirs: &PropertyMap,
    reducer: impl FnOnce(MergeOutcome) -> R,
) -> R {
    reducer(merge_properties(base, ours, theirs))
}

/// Merge, then write the result back onto `ours` in place: every result
/// key `ours` does not already define is inserted, pre-existing keys
/// are left untouched. Returns the conflicts.
///
/// This is a documented deliberate mutation of one of the two inputs.
pub fn merge_properties_into_ours(
    base: &PropertyMap,
    ours: &mut PropertyMap,
    theirs: &PropertyMap,
) -> Vec<MergeConflict> {
    let outcome = merge_properties(base, ours, theirs);
    for (key, value) in outcome.properties {
        ours.entry(key).or_insert(value);
    }
    outcome.conflicts
}

/// Symmetric counterpart of [`merge_properties_into_ours`], writing
/// onto `theirs`.
pub fn merge_properties_into_theirs(
    base: &PropertyMap,
    ours: &PropertyMap,
    theirs: &mut PropertyMap,
) -> Vec<MergeConflict> {
    let outcome = merge_properties(base, ours, theirs);
    for (key, value) in outcome.properties {
        theirs.entry(key).or_insert(value);
    }
    outcome.conflicts
}

/// Dynamic entry point: merge three arbitrary values.
///
/// Each argument must be object-shaped (a map or a sequence); a scalar
/// fails with [`MergeError::NotAnObject`] naming the offending
/// argument. When `theirs` is a sequence all three are coerced to
/// sequences; otherwise all three are coerced to maps. This mirrors the
/// shape rules the recursive merge applies to nested values.
pub fn merge_values(
    base: &PropertyValue,
    ours: &PropertyValue,
    theirs: &PropertyValue,
) -> MergeResult<ValueOutcome> {
    for (value, arg) in [
        (base, MergeArg::Base),
        (ours, MergeArg::Ours),
        (theirs, MergeArg::Theirs),
    ] {
        if !value.is_composite() {
            return Err(MergeError::NotAnObject(arg));
        }
    }

    let mut conflicts = Vec::new();
    let value = match theirs {
        PropertyValue::Seq(theirs_seq) => {
            let base_seq = base.as_seq().unwrap_or(&[]);
            let ours_seq = ours.as_seq().unwrap_or(&[]);
            PropertyValue::Seq(merge_seqs(base_seq, ours_seq, theirs_seq, "", &mut conflicts))
        }
        _ => {
            let empty = PropertyMap::new();
            let base_map = base.as_map().unwrap_or(&empty);
            let ours_map = ours.as_map().unwrap_or(&empty);
            let theirs_map = theirs.as_map().unwrap_or(&empty);
            PropertyValue::Map(merge_maps(base_map, ours_map, theirs_map, "", &mut conflicts))
        }
    };
    Ok(ValueOutcome { value, conflicts })
}

fn child_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn index_path(prefix: &str, idx: usize) -> String {
    format!("{prefix}[{idx}]")
}

/// Object case: seed the result with theirs, then overlay/merge ours's
/// keys in order.
fn merge_maps(
    base: &PropertyMap,
    ours: &PropertyMap,
    theirs: &PropertyMap,
    prefix: &str,
    conflicts: &mut Vec<MergeConflict>,
) -> PropertyMap {
    let mut result = theirs.clone();

    for (key, ours_val) in ours {
        let theirs_val = match theirs.get(key) {
            // Only ours defines the key: take it verbatim.
            None => {
                result.insert(key.clone(), ours_val.clone());
                continue;
            }
            Some(v) => v,
        };
        if ours_val == theirs_val {
            continue;
        }
        let path = child_path(prefix, key);
        let merged = merge_value(base.get(key), ours_val, theirs_val, &path, conflicts);
        result.insert(key.clone(), merged);
    }
    result
}

/// Merge one property whose two sides disagree.
fn merge_value(
    base: Option<&PropertyValue>,
    ours: &PropertyValue,
    theirs: &PropertyValue,
    path: &str,
    conflicts: &mut Vec<MergeConflict>,
) -> PropertyValue {
    match (ours, theirs) {
        (PropertyValue::Component(oc), PropertyValue::Component(tc)) if oc.kind() == tc.kind() => {
            merge_components(base, *oc, *tc, path, conflicts)
        }
        (o, t) if o.is_composite() && t.is_composite() => match t {
            PropertyValue::Seq(theirs_seq) => {
                let base_seq = base.and_then(|b| b.as_seq()).unwrap_or(&[]);
                let ours_seq = o.as_seq().unwrap_or(&[]);
                PropertyValue::Seq(merge_seqs(base_seq, ours_seq, theirs_seq, path, conflicts))
            }
            _ => {
                let empty = PropertyMap::new();
                let base_map = base.and_then(|b| b.as_map()).unwrap_or(&empty);
                let ours_map = o.as_map().unwrap_or(&empty);
                let theirs_map = t.as_map().unwrap_or(&empty);
                PropertyValue::Map(merge_maps(base_map, ours_map, theirs_map, path, conflicts))
            }
        },
        _ => match base {
            // Whichever side still equals base loses; the other wins.
            Some(b) if theirs == b => ours.clone(),
            Some(b) if ours == b => theirs.clone(),
            // True three-way disagreement: keep base, report.
            Some(b) => {
                conflicts.push(MergeConflict::new(
                    path,
                    Some(b.clone()),
                    Some(ours.clone()),
                    Some(theirs.clone()),
                ));
                b.clone()
            }
            // Both sides added different values: no safe base exists,
            // the seeded theirs value stands as the provisional result.
            None => {
                conflicts.push(MergeConflict::new(
                    path,
                    None,
                    Some(ours.clone()),
                    Some(theirs.clone()),
                ));
                theirs.clone()
            }
        },
    }
}

/// Component case: merge the named scalar components, then rebuild the
/// typed value. Any component-level split becomes one conflict at the
/// parent property with the whole values as the two sides.
fn merge_components(
    base: Option<&PropertyValue>,
    ours: ComponentValue,
    theirs: ComponentValue,
    path: &str,
    conflicts: &mut Vec<MergeConflict>,
) -> PropertyValue {
    let base_components = match base {
        Some(PropertyValue::Component(bc)) if bc.kind() == ours.kind() => bc.components(),
        _ => PropertyMap::new(),
    };

    let mut component_conflicts = Vec::new();
    let merged = merge_maps(
        &base_components,
        &ours.components(),
        &theirs.components(),
        path,
        &mut component_conflicts,
    );

    if component_conflicts.is_empty() {
        if let Some(rebuilt) = ComponentValue::from_components(ours.kind(), &merged) {
            return PropertyValue::Component(rebuilt);
        }
    }

    conflicts.push(MergeConflict::new(
        path,
        base.cloned(),
        Some(PropertyValue::Component(ours)),
        Some(PropertyValue::Component(theirs)),
    ));
    match base {
        Some(b) => b.clone(),
        None => PropertyValue::Component(theirs),
    }
}

/// Sequence case: elements are identified by value membership, not by
/// position. Surviving ours-side elements come first (in ours order),
/// newly appended theirs-only elements after (in theirs order);
/// index-aligned composites are three-way merged in place.
fn merge_seqs(
    base: &[PropertyValue],
    ours: &[PropertyValue],
    theirs: &[PropertyValue],
    prefix: &str,
    conflicts: &mut Vec<MergeConflict>,
) -> Vec<PropertyValue> {
    let mut result = Vec::new();
    // Where each ours element landed in the result, so the composite
    // splice below stays aligned when earlier elements were dropped.
    let mut kept_at: Vec<Option<usize>> = Vec::with_capacity(ours.len());

    for ours_val in ours {
        // Kept when confirmed by theirs, or when it is a pure
        // ours-side addition (absent from base).
        if theirs.contains(ours_val) || !base.contains(ours_val) {
            kept_at.push(Some(result.len()));
            result.push(ours_val.clone());
        } else {
            kept_at.push(None);
        }
    }

    for (idx, theirs_val) in theirs.iter().enumerate() {
        let aligned = ours.get(idx);
        if let Some(ours_val) = aligned {
            if ours_val.is_composite() && theirs_val.is_composite() {
                let merged = merge_value(
                    base.get(idx),
                    ours_val,
                    theirs_val,
                    &index_path(prefix, idx),
                    conflicts,
                );
                match kept_at[idx] {
                    Some(pos) => result[pos] = merged,
                    None => {
                        if !result.contains(&merged) {
                            result.push(merged);
                        }
                    }
                }
                continue;
            }
        }
        if !result.contains(theirs_val) {
            result.push(theirs_val.clone());
        }
    }
    result
}
