//! Table rendering for CLI output

use super::{ColorTheme, StatusIcon};
use crate::domain::plan::{ResourceGraph, ResourceNode};
use crate::domain::region::RegionDescriptor;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde_json::Value;
use std::collections::BTreeMap;

/// Plan overview for the summary panel
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub project: String,
    pub prefix: String,
    pub domain: Option<String>,
    pub resources: usize,
    pub edges: usize,
    pub waves: usize,
    pub enabled_regions: Vec<String>,
    pub skipped_regions: usize,
    pub fingerprint: String,
}

/// Table renderer for formatted output
pub struct TableRenderer {
    theme: ColorTheme,
}

impl Default for TableRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRenderer {
    /// Create a new table renderer with default theme
    pub fn new() -> Self {
        Self {
            theme: ColorTheme::default(),
        }
    }

    /// Render the region catalog as a formatted table
    pub fn render_regions(&self, regions: &[RegionDescriptor]) -> String {
        if regions.is_empty() {
            return "No regions in catalog".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("ID").set_alignment(CellAlignment::Left),
                Cell::new("REGION").set_alignment(CellAlignment::Left),
                Cell::new("SUBNET").set_alignment(CellAlignment::Left),
                Cell::new("STATUS").set_alignment(CellAlignment::Center),
            ]);

        for region in regions {
            let color = self.theme.get_region_color(region.enabled);
            table.add_row(vec![
                Cell::new(&region.id),
                Cell::new(&region.region).fg(color),
                Cell::new(&region.subnet_cidr),
                Cell::new(format!(
                    "{} {}",
                    StatusIcon::get_region_icon(region.enabled),
                    StatusIcon::get_region_text(region.enabled)
                ))
                .fg(color),
            ]);
        }

        let enabled = regions.iter().filter(|r| r.enabled).count();
        let mut output = String::new();
        output.push_str(&format!(
            "╭─ Regions {} ─╮\n",
            format!("[{} of {} enabled]", enabled, regions.len())
                .bright_black()
                .to_string()
        ));
        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "Legend: {} Enabled  {} Skipped\n",
            StatusIcon::SUCCESS.green(),
            StatusIcon::SKIPPED.bright_black()
        ));

        output
    }

    /// Render the plan overview panel
    pub fn render_plan_summary(&self, summary: &PlanSummary) -> String {
        let (mode, mode_color) = match &summary.domain {
            Some(domain) => (format!("{} HTTPS ({}) + HTTP redirect", StatusIcon::LOCK, domain), Color::Green),
            None => ("HTTP only".to_string(), Color::Yellow),
        };

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        table.add_row(vec![
            Cell::new("📋 Infrastructure Plan").set_alignment(CellAlignment::Center)
        ]);
        table.add_row(vec![Cell::new(format!(
            "Project: {} | Prefix: {}",
            summary.project, summary.prefix
        ))]);
        table.add_row(vec![Cell::new(format!("Load balancer: {}", mode)).fg(mode_color)]);
        table.add_row(vec![Cell::new(format!(
            "Resources: {} | Edges: {} | Waves: {}",
            summary.resources, summary.edges, summary.waves
        ))]);
        table.add_row(vec![Cell::new(format!(
            "Regions: {} ({} skipped)",
            summary.enabled_regions.join(", "),
            summary.skipped_regions
        ))
        .fg(self.theme.success)]);
        table.add_row(vec![
            Cell::new(format!("Fingerprint: {}", summary.fingerprint)).fg(self.theme.muted)
        ]);

        table.to_string()
    }

    /// Render declared resources in creation order
    pub fn render_resources(&self, nodes: &[&ResourceNode]) -> String {
        if nodes.is_empty() {
            return "No resources declared".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("RESOURCE").set_alignment(CellAlignment::Left),
                Cell::new("KIND").set_alignment(CellAlignment::Left),
                Cell::new("DEPS").set_alignment(CellAlignment::Center),
                Cell::new("CONTEXT").set_alignment(CellAlignment::Left),
            ]);

        for node in nodes {
            table.add_row(vec![
                Cell::new(&node.name),
                Cell::new(node.kind.type_token()).fg(self.theme.get_kind_color(node.kind)),
                Cell::new(node.depends_on.len()).set_alignment(CellAlignment::Center),
                Cell::new(node.provider.as_deref().unwrap_or("-")).fg(self.theme.muted),
            ]);
        }

        table.to_string()
    }

    /// Render the parallel creation waves of a graph
    pub fn render_waves(&self, graph: &ResourceGraph) -> String {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("WAVE").set_alignment(CellAlignment::Center),
                Cell::new("COUNT").set_alignment(CellAlignment::Center),
                Cell::new("RESOURCES").set_alignment(CellAlignment::Left),
            ]);

        for (i, wave) in graph.waves().iter().enumerate() {
            let names: Vec<&str> = wave.iter().map(|n| n.name.as_str()).collect();
            table.add_row(vec![
                Cell::new(i + 1).set_alignment(CellAlignment::Center),
                Cell::new(wave.len()).set_alignment(CellAlignment::Center),
                Cell::new(names.join("\n")),
            ]);
        }

        table.to_string()
    }

    /// Render exported outputs; multi-line values are collapsed
    pub fn render_exports(&self, exports: &BTreeMap<String, Value>) -> String {
        if exports.is_empty() {
            return "No outputs exported".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("OUTPUT").set_alignment(CellAlignment::Left),
                Cell::new("VALUE").set_alignment(CellAlignment::Left),
            ]);

        for (key, value) in exports {
            table.add_row(vec![
                Cell::new(key).fg(self.theme.info),
                Cell::new(summarize_value(value)),
            ]);
        }

        table.to_string()
    }
}

fn summarize_value(value: &Value) -> String {
    match value {
        Value::String(s) if s.lines().count() > 1 => {
            format!("<{} lines, {} bytes>", s.lines().count(), s.len())
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::region::regions;

    #[test]
    fn test_render_regions() {
        let renderer = TableRenderer::new();
        let output = renderer.render_regions(&regions());
        assert!(output.contains("us-central1"));
        assert!(output.contains("10.128.50.0/24"));
        assert!(output.contains("3 of 15 enabled"));
        assert!(output.contains("Skipped"));
    }

    #[test]
    fn test_render_empty_regions() {
        let renderer = TableRenderer::new();
        assert!(renderer.render_regions(&[]).contains("No regions"));
    }

    #[test]
    fn test_render_summary() {
        let renderer = TableRenderer::new();
        let output = renderer.render_plan_summary(&PlanSummary {
            project: "demo".to_string(),
            prefix: "gas".to_string(),
            domain: None,
            resources: 42,
            edges: 100,
            waves: 12,
            enabled_regions: vec!["us-central1".to_string()],
            skipped_regions: 14,
            fingerprint: "abc123".to_string(),
        });
        assert!(output.contains("HTTP only"));
        assert!(output.contains("Resources: 42"));
        assert!(output.contains("14 skipped"));
    }

    #[test]
    fn test_summarize_multiline_value() {
        let value = Value::String("a\nb\nc".to_string());
        assert_eq!(summarize_value(&value), "<3 lines, 5 bytes>");
        assert_eq!(summarize_value(&Value::String("x".into())), "x");
    }
}
