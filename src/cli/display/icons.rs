//! Status icons for CLI output

/// Status icons for different states
pub struct StatusIcon;

impl StatusIcon {
    /// Success icon
    pub const SUCCESS: &'static str = "✓";

    /// Warning icon
    pub const WARNING: &'static str = "⚠";

    /// Error icon
    pub const ERROR: &'static str = "✗";

    /// Skipped icon (region disabled)
    pub const SKIPPED: &'static str = "○";

    /// Lock icon (HTTPS enabled)
    pub const LOCK: &'static str = "🔒";

    pub fn get_region_icon(enabled: bool) -> &'static str {
        if enabled {
            Self::SUCCESS
        } else {
            Self::SKIPPED
        }
    }

    pub fn get_region_text(enabled: bool) -> &'static str {
        if enabled {
            "Enabled"
        } else {
            "Skipped"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_region_icon() {
        assert_eq!(StatusIcon::get_region_icon(true), StatusIcon::SUCCESS);
        assert_eq!(StatusIcon::get_region_icon(false), StatusIcon::SKIPPED);
    }

    #[test]
    fn test_get_region_text() {
        assert_eq!(StatusIcon::get_region_text(true), "Enabled");
        assert_eq!(StatusIcon::get_region_text(false), "Skipped");
    }
}
