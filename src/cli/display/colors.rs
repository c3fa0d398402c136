//! Color theme for CLI output

use crate::domain::plan::ResourceKind;
use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Enabled regions stand out, skipped ones fade
    pub fn get_region_color(&self, enabled: bool) -> TableColor {
        if enabled {
            self.success
        } else {
            self.muted
        }
    }

    /// Cloud resources vs. resources installed inside a cluster
    pub fn get_kind_color(&self, kind: ResourceKind) -> TableColor {
        match kind {
            ResourceKind::KubernetesProvider => self.warning,
            k if k.is_in_cluster() => self.info,
            _ => self.success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_theme() {
        let theme = ColorTheme::default();
        assert_eq!(theme.success, TableColor::Green);
        assert_eq!(theme.warning, TableColor::Yellow);
        assert_eq!(theme.error, TableColor::Red);
    }

    #[test]
    fn test_region_and_kind_colors() {
        let theme = ColorTheme::default();
        assert_eq!(theme.get_region_color(true), TableColor::Green);
        assert_eq!(theme.get_region_color(false), TableColor::DarkGrey);
        assert_eq!(theme.get_kind_color(ResourceKind::HelmRelease), TableColor::Cyan);
        assert_eq!(theme.get_kind_color(ResourceKind::Network), TableColor::Green);
        assert_eq!(
            theme.get_kind_color(ResourceKind::KubernetesProvider),
            TableColor::Yellow
        );
    }
}
