//! Asset lifecycle rules.
//!
//! Every function here is pure: it takes the current record(s) and the acting
//! user and returns the next record, or a rejection. Persisting the result is
//! the caller's job (see `AssetService`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::{AppError, AppResult},
    models::{
        asset::next_timestamp, Actor, Asset, AssetInput, AssetStatus, ImportCandidate,
    },
};

/// Trailing ASCII digit run that forms its own segment (`LP-001`, `7`), not `RACK7`
static TRAILING_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\p{L}\p{N}])([0-9]+)$").expect("valid regex"));

/// What `upsert` wants written
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertPlan {
    /// Create or update in place under `asset.id`
    Write(Asset),
    /// Write under the new id, then delete `previous_id`
    Rename { asset: Asset, previous_id: String },
}

impl UpsertPlan {
    pub fn asset(&self) -> &Asset {
        match self {
            UpsertPlan::Write(asset) | UpsertPlan::Rename { asset, .. } => asset,
        }
    }
}

/// Check an available asset out to the actor, or to `assignee_override` when
/// the actor may check out on behalf of others.
pub fn check_out(asset: &Asset, actor: &Actor, assignee_override: Option<&str>) -> AppResult<Asset> {
    if asset.condition.is_broken() {
        return Err(AppError::InvalidState(
            "Item is unavailable: under repair".to_string(),
        ));
    }
    if asset.status == AssetStatus::CheckedOut {
        return Err(AppError::InvalidState(format!(
            "Asset {} is already checked out",
            asset.id
        )));
    }

    let assignee = if actor.capabilities().check_out_for_others {
        assignee_override
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(&actor.identity)
    } else {
        &actor.identity
    };
    if assignee.is_empty() {
        return Err(AppError::Validation("Assignee cannot be empty".to_string()));
    }

    let mut next = asset.clone();
    next.status = AssetStatus::CheckedOut;
    next.assigned_to = Some(assignee.to_string());
    next.last_updated = next_timestamp(Some(asset.last_updated));
    Ok(next)
}

/// Return a checked-out asset. Without the cross-user capability the actor
/// may only return their own assignments.
pub fn check_in(asset: &Asset, actor: &Actor) -> AppResult<Asset> {
    if asset.status != AssetStatus::CheckedOut {
        return Err(AppError::InvalidState(format!(
            "Asset {} is not checked out",
            asset.id
        )));
    }
    if !actor.capabilities().check_out_for_others && !asset.is_assigned_to(&actor.identity) {
        return Err(AppError::Authorization(
            "You can only check in items assigned to you.".to_string(),
        ));
    }

    let mut next = asset.clone();
    next.status = AssetStatus::Available;
    next.assigned_to = None;
    next.last_updated = next_timestamp(Some(asset.last_updated));
    Ok(next)
}

/// Report an asset broken or fixed. Independent of checkout status.
pub fn set_condition(asset: &Asset, actor: &Actor, broken: bool) -> AppResult<Asset> {
    actor.require_manage_inventory()?;

    let mut next = asset.clone();
    next.condition = if broken {
        crate::models::Condition::Broken
    } else {
        crate::models::Condition::Good
    };
    next.last_updated = next_timestamp(Some(asset.last_updated));
    Ok(next)
}

/// Plan a create, update or rename.
///
/// `current` is the record stored under `existing_id` (or under `input.id`
/// when there is no existing id); `target` is the record currently stored
/// under `input.id` when that differs from `existing_id`.
pub fn upsert(
    input: &AssetInput,
    existing_id: Option<&str>,
    current: Option<&Asset>,
    target: Option<&Asset>,
) -> AppResult<UpsertPlan> {
    let new_id = input.id.trim();
    if new_id.is_empty() {
        return Err(AppError::Validation("Asset ID cannot be empty".to_string()));
    }

    match existing_id.map(str::trim) {
        Some(previous_id) if previous_id != new_id => {
            if target.is_some() {
                return Err(AppError::Conflict(format!(
                    "Asset ID {} already exists",
                    new_id
                )));
            }
            let asset = merge_input(current, input)?;
            Ok(UpsertPlan::Rename {
                asset,
                previous_id: previous_id.to_string(),
            })
        }
        _ => Ok(UpsertPlan::Write(merge_input(current, input)?)),
    }
}

/// Merge `input` over `base`; status and assignee only change when provided.
fn merge_input(base: Option<&Asset>, input: &AssetInput) -> AppResult<Asset> {
    let mut next = match base {
        Some(existing) => existing.clone(),
        None => Asset::new(input.id.trim(), input.name.trim()),
    };
    let was_checked_out = next.status == AssetStatus::CheckedOut;

    next.id = input.id.trim().to_string();
    next.name = input.name.trim().to_string();

    macro_rules! merge_opt {
        ($field:ident) => {
            if let Some(ref value) = input.$field {
                next.$field = Some(value.clone()).filter(|v| !v.is_empty());
            }
        };
    }
    merge_opt!(category);
    merge_opt!(description);
    merge_opt!(maintenance_note);
    merge_opt!(manual_link);

    if let Some(condition) = input.condition {
        next.condition = condition;
    }

    let assignee = input
        .assigned_to
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    match (input.status, assignee) {
        (None, None) => {}
        (Some(AssetStatus::Available), _) => {
            next.status = AssetStatus::Available;
            next.assigned_to = None;
        }
        (Some(AssetStatus::CheckedOut), assignee) => {
            let holder = assignee
                .map(str::to_string)
                .or_else(|| next.assigned_to.clone().filter(|_| was_checked_out))
                .ok_or_else(|| {
                    AppError::InvalidState("A checked-out asset needs an assignee".to_string())
                })?;
            next.status = AssetStatus::CheckedOut;
            next.assigned_to = Some(holder);
        }
        (None, Some(assignee)) => {
            if next.status != AssetStatus::CheckedOut {
                return Err(AppError::InvalidState(
                    "Only checked-out assets can be assigned".to_string(),
                ));
            }
            next.assigned_to = Some(assignee.to_string());
        }
    }

    if next.status == AssetStatus::CheckedOut && !was_checked_out && next.condition.is_broken() {
        return Err(AppError::InvalidState(
            "Item is unavailable: under repair".to_string(),
        ));
    }

    next.last_updated = next_timestamp(base.map(|b| b.last_updated));
    Ok(next)
}

/// Candidate for a copy of `source` under the next free-looking id.
pub fn duplicate(source: &Asset) -> ImportCandidate {
    ImportCandidate {
        id: next_asset_id(&source.id),
        name: source.name.clone(),
        category: source.category.clone(),
        description: source.description.clone(),
        maintenance_note: source.maintenance_note.clone(),
    }
}

/// Increment the trailing numeric segment keeping its width (`LP-009` -> `LP-010`),
/// or append `-copy` when there is none.
pub fn next_asset_id(id: &str) -> String {
    let Some(run) = TRAILING_DIGITS.captures(id).and_then(|c| c.get(1)) else {
        return format!("{}-copy", id);
    };

    let mut digits: Vec<char> = run.as_str().chars().collect();
    let mut carry = true;
    for digit in digits.iter_mut().rev() {
        if !carry {
            break;
        }
        if *digit == '9' {
            *digit = '0';
        } else {
            *digit = char::from(*digit as u8 + 1);
            carry = false;
        }
    }
    if carry {
        digits.insert(0, '1');
    }

    let incremented: String = digits.into_iter().collect();
    format!("{}{}", &id[..run.start()], incremented)
}
