/// Sampling site registry for the Detroit Lake monitoring programme.
///
/// Defines the canonical, ordered list of site codes used as the location
/// axis of every output tensor. All other modules should take locations
/// from here (or from the study config) rather than hardcoding codes.

/// Site codes as written in the field spreadsheets, in output order.
pub static STUDY_SITES: &[&str] = &["BB", "BO", "HA", "HT", "LB", "LBP", "LBS", "MG"];

/// Site codes as owned strings, suitable for the output location axis.
pub fn default_locations() -> Vec<String> {
    STUDY_SITES.iter().map(|s| s.to_string()).collect()
}

/// Position of a site on the location axis. Returns `None` if not found.
pub fn site_index(code: &str) -> Option<usize> {
    STUDY_SITES.iter().position(|&s| s == code)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
