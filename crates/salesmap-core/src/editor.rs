//! Applying a salesperson reassignment to one store record.
//!
//! Validation and roster resolution run to completion before anything is
//! mutated, so a rejected edit leaves every projection untouched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::CoreError;
use crate::history::{EditChanges, EditRecord, FieldChange};
use crate::identity::store_id;
use crate::record::{JoinedRecord, SalespersonRecord};

/// A requested change to one store's assignment. At least one of
/// `new_employee_number` / `new_salesperson` must carry a non-empty value.
#[derive(Debug, Clone, Default)]
pub struct EditInput {
    pub new_employee_number: Option<String>,
    pub new_salesperson: Option<String>,
    pub reason: Option<String>,
    pub note: Option<String>,
    pub actor: Option<String>,
}

/// The result of a successful edit: the record to write back into the
/// working set, and the history entry describing the change.
#[derive(Debug, Clone)]
pub struct EditOutcome {
    pub updated: JoinedRecord,
    pub edit: EditRecord,
}

/// Apply an edit to a copy of `target`, re-resolving its roster info.
///
/// A name-only edit resolves the employee number from the roster using the
/// same-name tie-break below. The nested `salesInfo` is reattached when an
/// entry matches the record's resulting number AND name exactly; otherwise a
/// previously attached entry keeps its branch/office context with the new
/// number/name overlaid, and a record that never had roster info stays
/// unmatched.
///
/// Same-name tie-break (동명이인): when several roster entries share the new
/// name, prefer one in the record's current office, then one in its current
/// branch, else take the first entry and log a warning that the ambiguity
/// was resolved silently.
///
/// # Errors
///
/// [`CoreError::Validation`] when no field changes or the new employee
/// number is not numeric. No mutation has happened when an error is
/// returned.
pub fn apply_edit(
    target: &JoinedRecord,
    input: &EditInput,
    roster: &[SalespersonRecord],
    now: DateTime<Utc>,
) -> Result<EditOutcome, CoreError> {
    let number_input = input
        .new_employee_number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let name_input = input
        .new_salesperson
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    if number_input.is_none() && name_input.is_none() {
        return Err(CoreError::Validation(
            "edit must change the employee number or the salesperson".to_string(),
        ));
    }

    // Resolve the employee number before touching anything: an explicit
    // number must coerce to an integer; a name-only edit takes the number
    // of the tie-broken roster entry, when one exists.
    let new_number: Option<Value> = match number_input {
        Some(raw) => {
            let parsed: i64 = raw.parse().map_err(|_| {
                CoreError::Validation(format!("employee number is not numeric: {raw}"))
            })?;
            Some(Value::from(parsed))
        }
        None => name_input
            .and_then(|name| {
                resolve_roster_by_name(
                    roster,
                    name,
                    target.office().as_deref(),
                    target.branch().as_deref(),
                )
            })
            .map(|entry| entry.employee_number.clone()),
    };

    let mut updated = target.clone();
    if let Some(number) = new_number {
        updated.store.employee_number = number;
    }
    if let Some(name) = name_input {
        updated.store.salesperson = Some(name.to_string());
    }
    updated.store.last_modified = Some(now.to_rfc3339_opts(SecondsFormat::Millis, true));

    updated.sales_info = resolve_sales_info(&updated, target.sales_info.as_ref(), roster);

    let edit = EditRecord {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        store_id: store_id(&target.store),
        store_name: target.store.store_name.clone(),
        business_number: target.store.business_number.clone(),
        changes: EditChanges {
            employee_number: FieldChange {
                before: target.store.employee_number.clone(),
                after: updated.store.employee_number.clone(),
            },
            salesperson: FieldChange {
                before: salesperson_value(target),
                after: salesperson_value(&updated),
            },
        },
        reason: input.reason.clone().unwrap_or_default(),
        note: input.note.clone().unwrap_or_default(),
        actor: input.actor.clone().unwrap_or_default(),
    };

    Ok(EditOutcome { updated, edit })
}

fn salesperson_value(record: &JoinedRecord) -> Value {
    match &record.store.salesperson {
        Some(name) => Value::String(name.clone()),
        None => Value::Null,
    }
}

fn resolve_sales_info(
    updated: &JoinedRecord,
    previous: Option<&SalespersonRecord>,
    roster: &[SalespersonRecord],
) -> Option<SalespersonRecord> {
    let number = updated.store.employee_no();
    let name = updated.store.salesperson_name();

    let exact = roster
        .iter()
        .find(|entry| entry.employee_no() == number && entry.name_normalized() == name);
    if let Some(entry) = exact {
        return Some(entry.clone());
    }

    // No exact roster match: keep the previous branch/office context so a
    // rename without a roster entry does not strand the store outside every
    // facet, overlaying the new assignment fields.
    previous.map(|info| {
        let mut carried = info.clone();
        carried.employee_number = updated.store.employee_number.clone();
        carried.name = name.clone();
        carried
    })
}

/// Find the roster entry for a (possibly ambiguous) salesperson name.
///
/// Preference order: same office as the record's current context, same
/// branch, first entry with the name. The last case logs a warning when the
/// name is genuinely ambiguous, since the choice is otherwise silent.
#[must_use]
pub fn resolve_roster_by_name<'a>(
    roster: &'a [SalespersonRecord],
    name: &str,
    office_context: Option<&str>,
    branch_context: Option<&str>,
) -> Option<&'a SalespersonRecord> {
    let name = name.trim();
    let candidates: Vec<&SalespersonRecord> = roster
        .iter()
        .filter(|entry| entry.name_normalized() == name)
        .collect();

    if candidates.is_empty() {
        return None;
    }

    if let Some(office) = office_context {
        if let Some(entry) = candidates
            .iter()
            .find(|e| e.office_normalized() == office)
        {
            return Some(entry);
        }
    }
    if let Some(branch) = branch_context {
        if let Some(entry) = candidates
            .iter()
            .find(|e| e.branch_normalized() == branch)
        {
            return Some(entry);
        }
    }

    if candidates.len() > 1 {
        tracing::warn!(
            salesperson = name,
            chosen_office = %candidates[0].office_normalized(),
            candidates = candidates.len(),
            "same-name salesperson resolved to first roster entry"
        );
    }
    Some(candidates[0])
}
