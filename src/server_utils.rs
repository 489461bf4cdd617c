use crate::constants::{
    DEFAULT_HEIGHT, DEFAULT_PLAYER_COUNT, SUPPORTED_HEIGHTS, SUPPORTED_PLAYER_COUNTS,
};
use crate::types::LadderDimensions;

pub fn normalize_player_count(value: i64) -> Option<usize> {
    let count = usize::try_from(value).ok()?;
    SUPPORTED_PLAYER_COUNTS.contains(&count).then_some(count)
}

pub fn normalize_height(value: i64) -> Option<usize> {
    let height = usize::try_from(value).ok()?;
    SUPPORTED_HEIGHTS.contains(&height).then_some(height)
}

/// Resolves a partial configure request against the current dimensions.
pub fn resolve_dimensions(
    current: LadderDimensions,
    player_count: Option<i64>,
    height: Option<i64>,
) -> Result<LadderDimensions, String> {
    let player_count = match player_count {
        None => current.player_count,
        Some(value) => normalize_player_count(value)
            .ok_or_else(|| format!("unsupported player count: {value}"))?,
    };
    let height = match height {
        None => current.height,
        Some(value) => {
            normalize_height(value).ok_or_else(|| format!("unsupported height: {value}"))?
        }
    };
    LadderDimensions::new(player_count, height).map_err(|error| error.to_string())
}

/// Query-string flavour of [`resolve_dimensions`], defaulting missing values.
pub fn parse_dimension_query(
    players: Option<&str>,
    height: Option<&str>,
) -> Result<LadderDimensions, String> {
    let players = parse_optional_number(players, "players")?;
    let height = parse_optional_number(height, "height")?;
    resolve_dimensions(default_dimensions(), players, height)
}

pub fn default_dimensions() -> LadderDimensions {
    LadderDimensions {
        player_count: DEFAULT_PLAYER_COUNT,
        height: DEFAULT_HEIGHT,
    }
}

fn parse_optional_number(raw: Option<&str>, field: &str) -> Result<Option<i64>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| format!("{field} must be an integer")),
    }
}
