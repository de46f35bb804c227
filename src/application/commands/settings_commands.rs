// src/application/commands/settings_commands.rs

use crate::application::dto::*;
use crate::application::error_handling::{CommandResult, ErrorResponse};
use crate::application::state::AppState;
use crate::db::{get_connection, get_database_stats, DatabaseStats};

/// List settings, optionally limited to one category
pub fn list_settings(state: &AppState, category: Option<&str>) -> CommandResult<Vec<SettingDto>> {
    let records = state
        .settings_service
        .list_settings(category.map(str::trim).filter(|c| !c.is_empty()))?;
    Ok(records.into_iter().map(SettingDto::from).collect())
}

/// Update one setting; the value must coerce to the declared type
pub fn update_setting(state: &AppState, dto: UpdateSettingDto) -> CommandResult<SettingDto> {
    let key = dto.key.trim();
    if key.is_empty() {
        return Err(ErrorResponse::validation("Setting key is required"));
    }
    let record = state.settings_service.update_setting(key, dto.value.trim())?;
    Ok(record.into())
}

/// Database size and row counts
pub fn get_system_stats(state: &AppState) -> CommandResult<DatabaseStats> {
    let conn = get_connection(&state.pool)?;
    Ok(get_database_stats(&conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::register_parcel;
    use crate::application::commands::test_state::state_with;
    use crate::application::error_handling::ErrorType;

    #[test]
    fn test_defaults_are_seeded() {
        let (state, _dir) = state_with(vec![], 6);
        let settings = list_settings(&state, Some("auto_resolution")).unwrap();
        assert_eq!(settings.len(), 6);
        assert!(settings
            .iter()
            .any(|s| s.key == "auto_approve_enabled" && s.value_type == "boolean"));
    }

    #[test]
    fn test_update_setting_errors() {
        let (state, _dir) = state_with(vec![], 6);

        let bad_value = update_setting(
            &state,
            UpdateSettingDto {
                key: "auto_approve_confidence_threshold".to_string(),
                value: "high".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(bad_value.error_type, ErrorType::Config);

        let unknown = update_setting(
            &state,
            UpdateSettingDto {
                key: "warp_drive".to_string(),
                value: "on".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(unknown.error_type, ErrorType::NotFound);
    }

    #[test]
    fn test_system_stats_counts_rows() {
        let (state, _dir) = state_with(vec![], 6);
        register_parcel(&state, "PKG-S1").unwrap();

        let stats = get_system_stats(&state).unwrap();
        assert_eq!(stats.parcel_count, 1);
        assert_eq!(stats.inspection_count, 0);
    }
}
