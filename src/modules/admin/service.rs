use anyhow::anyhow;
use gatekeeper_core::AppError;
use gatekeeper_pipeline::{Condition, ConditionInfo, ConditionKind, FilterRegistry, RegistryError};
use tracing::{info, instrument};

use super::model::{
    AddConditionRequest, FilterInfo, FilterListResponse, FilterStatusResponse, StatusAction,
};

fn enable_condition_id(filter_id: &str) -> String {
    format!("{filter_id}-enable-condition")
}

fn disable_condition_id(filter_id: &str) -> String {
    format!("{filter_id}-disable-condition")
}

fn ensure_filter(registry: &FilterRegistry, filter_id: &str) -> Result<(), AppError> {
    if registry.contains(filter_id) {
        Ok(())
    } else {
        Err(RegistryError::UnknownFilter(filter_id.to_string()).into())
    }
}

pub struct AdminService;

impl AdminService {
    pub fn list_filters(registry: &FilterRegistry) -> FilterListResponse {
        let filters = registry
            .descriptors()
            .into_iter()
            .map(|descriptor| FilterInfo {
                conditions: registry
                    .conditions_for(&descriptor.id)
                    .iter()
                    .map(|c| c.info())
                    .collect(),
                id: descriptor.id,
                priority: descriptor.priority,
                runs_before: descriptor.runs_before,
                runs_after: descriptor.runs_after,
            })
            .collect::<Vec<_>>();

        FilterListResponse {
            resolved_order: filters.iter().map(|f| f.id.clone()).collect(),
            filters,
        }
    }

    #[instrument(skip_all, fields(filter.id = %filter_id))]
    pub fn add_condition(
        registry: &FilterRegistry,
        filter_id: &str,
        dto: AddConditionRequest,
    ) -> Result<ConditionInfo, AppError> {
        ensure_filter(registry, filter_id)?;

        let description = dto
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{:?} condition", dto.kind).to_lowercase());

        let condition = match dto.kind {
            ConditionKind::Path => {
                Condition::path(dto.patterns.as_slice(), dto.methods.as_slice(), description)
            }
            ConditionKind::Header => {
                let name = dto.header.as_deref().unwrap_or_default();
                Condition::header(name, dto.value_pattern.as_deref(), description)
            }
            ConditionKind::Address => {
                Condition::address(dto.address.as_deref().unwrap_or_default(), description)
            }
            ConditionKind::Static => {
                return Err(AppError::unprocessable(anyhow!(
                    "static conditions are managed through the filter status endpoint"
                )));
            }
        }
        .map_err(RegistryError::from)?;

        let attached = registry.add_condition(filter_id, condition)?;
        Ok(attached.info())
    }

    pub fn set_condition_enabled(
        registry: &FilterRegistry,
        filter_id: &str,
        condition_id: &str,
        enabled: bool,
    ) -> Result<ConditionInfo, AppError> {
        let condition = registry.set_condition_enabled(filter_id, condition_id, enabled)?;
        Ok(condition.info())
    }

    pub fn remove_condition(
        registry: &FilterRegistry,
        filter_id: &str,
        condition_id: &str,
    ) -> Result<(), AppError> {
        if registry.remove_condition(filter_id, condition_id) {
            Ok(())
        } else {
            Err(RegistryError::UnknownCondition {
                filter_id: filter_id.to_string(),
                condition_id: condition_id.to_string(),
            }
            .into())
        }
    }

    /// Switches a filter on or off with a synthetic static condition.
    ///
    /// Disabling attaches `<id>-disable-condition` (always skip); enabling
    /// attaches `<id>-enable-condition` (never skip). Either one replaces the
    /// other.
    #[instrument(skip_all, fields(filter.id = %filter_id))]
    pub fn set_filter_status(
        registry: &FilterRegistry,
        filter_id: &str,
        action: StatusAction,
    ) -> Result<FilterStatusResponse, AppError> {
        ensure_filter(registry, filter_id)?;

        let (condition, stale_id) = match action {
            StatusAction::Disable => (
                Condition::always_skip(disable_condition_id(filter_id), "Filter disabled"),
                enable_condition_id(filter_id),
            ),
            StatusAction::Enable => (
                Condition::never_skip(enable_condition_id(filter_id), "Filter enabled"),
                disable_condition_id(filter_id),
            ),
        };

        let attached = registry.replace_condition(filter_id, &stale_id, condition)?;

        let enabled = action == StatusAction::Enable;
        info!(enabled, "Filter status changed");

        Ok(FilterStatusResponse {
            filter_id: filter_id.to_string(),
            enabled,
            condition: attached.info(),
        })
    }
}
