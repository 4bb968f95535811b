//! Message filter pipeline and filter rule management.
//!
//! The pipeline runs in a fixed order: blacklist suppression, then sequential
//! literal replacement, then link removal per domain.

use tracing::debug;

use crate::error::{RelayError, ValidationError};
use crate::store::{Filter, FilterMode, NewFilter, RelayStore};

pub mod links;

pub use links::remove_links;

/// Filter rules partitioned by mode, each list in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Suppressing substrings.
    pub blacklist: Vec<String>,
    /// `(condition, replacement)` pairs applied in order.
    pub replacements: Vec<(String, String)>,
    /// Link domains.
    pub link_domains: Vec<String>,
}

impl FilterSet {
    /// Partition rules by mode, keeping their relative order.
    pub fn partition<'a>(filters: impl IntoIterator<Item = &'a Filter>) -> Self {
        let mut set = Self::default();
        for filter in filters {
            match filter.mode {
                FilterMode::Blacklist => set.blacklist.push(filter.condition.clone()),
                FilterMode::Replacement => {
                    let replacement = filter.replacement.clone().unwrap_or_default();
                    set.replacements.push((filter.condition.clone(), replacement));
                }
                FilterMode::LinkRemover => set.link_domains.push(filter.condition.clone()),
            }
        }
        set
    }

    /// Run the pipeline. `None` means the message is suppressed.
    pub fn apply(&self, message: &str) -> Option<String> {
        if let Some(hit) = self.blacklist.iter().find(|c| message.contains(c.as_str())) {
            debug!(condition = %hit, "message suppressed by blacklist");
            return None;
        }

        let mut text = message.to_owned();
        for (condition, replacement) in &self.replacements {
            text = text.replace(condition.as_str(), replacement);
        }
        for domain in &self.link_domains {
            text = remove_links(&text, domain);
        }
        Some(text)
    }
}

/// Treat a message against a list of rules.
pub fn treat(message: &str, filters: &[Filter]) -> Option<String> {
    FilterSet::partition(filters).apply(message)
}

/// Validate and insert a filter rule.
///
/// Checks run in order: empty condition, replacement presence for the mode,
/// condition equal to replacement, duplicate condition in any mode, and
/// finally collisions with another rule of the same mode.
pub async fn add_filter(
    store: &dyn RelayStore,
    mode: FilterMode,
    condition: &str,
    replacement: Option<&str>,
) -> Result<Filter, RelayError> {
    if condition.is_empty() {
        return Err(ValidationError::EmptyCondition.into());
    }
    match (mode, replacement) {
        (FilterMode::Replacement, None) => {
            return Err(ValidationError::MissingReplacement { mode }.into())
        }
        (FilterMode::Blacklist | FilterMode::LinkRemover, Some(_)) => {
            return Err(ValidationError::UnexpectedReplacement { mode }.into())
        }
        _ => {}
    }
    if replacement == Some(condition) {
        return Err(ValidationError::ConditionEqualsReplacement {
            condition: condition.to_owned(),
        }
        .into());
    }

    if let Some(existing) = store.find_filter_by_condition(condition).await? {
        return Err(ValidationError::FilterAlreadyExists {
            condition: existing.condition,
            mode: existing.mode,
        }
        .into());
    }

    if let Some(replacement) = replacement {
        if let Some(existing) = find_collision(store, mode, condition, replacement).await? {
            return Err(ValidationError::CircularFilter {
                condition: condition.to_owned(),
                replacement: replacement.to_owned(),
                mode,
                existing: existing.condition,
            }
            .into());
        }
    }

    let filter = store
        .insert_filter(NewFilter {
            condition: condition.to_owned(),
            replacement: replacement.map(str::to_owned),
            mode,
        })
        .await?;
    debug!(mode = %filter.mode, condition = %filter.condition, "filter added");
    Ok(filter)
}

/// A same-mode rule whose output is the new trigger, or whose trigger is the
/// new output.
async fn find_collision(
    store: &dyn RelayStore,
    mode: FilterMode,
    condition: &str,
    replacement: &str,
) -> Result<Option<Filter>, RelayError> {
    if let Some(existing) = store.find_filter_by_replacement(mode, condition).await? {
        return Ok(Some(existing));
    }
    Ok(store
        .find_filter_by_condition(replacement)
        .await?
        .filter(|existing| existing.mode == mode))
}

/// Delete the rule of `mode` with `condition`.
pub async fn remove_filter(
    store: &dyn RelayStore,
    mode: FilterMode,
    condition: &str,
) -> Result<Filter, RelayError> {
    let filter = store
        .find_filter_by_condition(condition)
        .await?
        .filter(|f| f.mode == mode)
        .ok_or_else(|| ValidationError::FilterNotFound {
            condition: condition.to_owned(),
            mode,
        })?;
    store.delete_filter(&filter.id).await?;
    debug!(mode = %mode, condition = %condition, "filter removed");
    Ok(filter)
}

/// Rules of one mode, in insertion order.
pub async fn filters_by_mode(
    store: &dyn RelayStore,
    mode: FilterMode,
) -> Result<Vec<Filter>, RelayError> {
    let mut filters = store.list_filters().await?;
    filters.retain(|f| f.mode == mode);
    Ok(filters)
}
