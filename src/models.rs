use serde::Serialize;

/// Military Housing Area entry from the MHA reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MhaRecord {
    pub code: String,
    /// Composite "City, State" name, trimmed
    pub name: String,
}

/// Join key derived from an MHA name: `(state, city)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MhaKey {
    pub state: String,
    pub city: String,
}

impl MhaKey {
    pub fn new(state: &str, city: &str) -> Self {
        Self {
            state: state.trim().to_string(),
            city: city.trim().to_string(),
        }
    }
}

/// Header names appended to the ZIP locale table
pub const MHA_CODE_COLUMN: &str = "MHA_CODE";
pub const MHA_NAME_COLUMN: &str = "MHA_NAME";

/// Column positions in the ZIP locale table
pub const ZIP_CITY_INDEX: usize = 2;
pub const ZIP_STATE_INDEX: usize = 3;

/// Split a composite "City, State" name on its last comma.
///
/// Returns `(city, state)` trimmed, or `None` when the name has no comma.
pub fn split_name(name: &str) -> Option<(&str, &str)> {
    name.rsplit_once(',')
        .map(|(city, state)| (city.trim(), state.trim()))
}
