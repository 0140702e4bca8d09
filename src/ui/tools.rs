use eframe::egui::{self, RichText, ScrollArea, TextEdit};
use std::collections::HashSet;

use crate::api::Tool;
use crate::theme::Theme;

/// State for the tools browser. The tool list is refetched wholesale every
/// time the tab is opened.
#[derive(Default)]
pub struct ToolsPanelState {
    tools: Vec<Tool>,
    pub filter: String,
    loading: bool,
    expanded: HashSet<String>,
}

impl ToolsPanelState {
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    pub fn apply_loaded(&mut self, result: Result<Vec<Tool>, String>) {
        self.loading = false;
        match result {
            Ok(tools) => self.tools = tools,
            Err(err) => {
                log::warn!("failed to load tools: {err}");
                self.tools.clear();
            }
        }
    }
}

pub fn show(ui: &mut egui::Ui, theme: &Theme, state: &mut ToolsPanelState) {
    ui.label(RichText::new(format!("Available tools ({})", state.tools.len())).strong());
    ui.label(
        RichText::new("Capabilities the agent can call")
            .color(theme.text_muted)
            .small(),
    );
    ui.add_space(theme.spacing_8);

    ui.add(
        TextEdit::singleline(&mut state.filter)
            .desired_width(f32::INFINITY)
            .hint_text("Search tools..."),
    );
    ui.add_space(theme.spacing_8);

    if state.loading {
        ui.label(RichText::new("Loading...").color(theme.text_muted));
        return;
    }

    let filter = state.filter.trim();
    let matching: Vec<&Tool> = state
        .tools
        .iter()
        .filter(|tool| filter.is_empty() || tool.matches(filter))
        .collect();
    let builtin: Vec<&Tool> = matching.iter().copied().filter(|t| !t.is_mcp).collect();
    let mcp: Vec<&Tool> = matching.iter().copied().filter(|t| t.is_mcp).collect();

    if matching.is_empty() {
        ui.label(RichText::new("No matching tools").color(theme.text_muted).small());
        return;
    }

    let mut toggled: Option<String> = None;
    ScrollArea::vertical().id_salt("tools_list").show(ui, |ui| {
        if !builtin.is_empty() {
            ui.label(RichText::new("BUILT-IN").color(theme.text_muted).small().strong());
            ui.add_space(theme.spacing_4);
            for tool in &builtin {
                tool_card(ui, theme, tool, &state.expanded, &mut toggled);
            }
        }
        if !mcp.is_empty() {
            ui.add_space(theme.spacing_4);
            ui.label(RichText::new("MCP").color(theme.text_muted).small().strong());
            ui.add_space(theme.spacing_4);
            for tool in &mcp {
                tool_card(ui, theme, tool, &state.expanded, &mut toggled);
            }
        }
    });

    if let Some(name) = toggled {
        if !state.expanded.remove(&name) {
            state.expanded.insert(name);
        }
    }
}

fn tool_card(
    ui: &mut egui::Ui,
    theme: &Theme,
    tool: &Tool,
    expanded: &HashSet<String>,
    toggled: &mut Option<String>,
) {
    let is_expanded = expanded.contains(&tool.name);
    theme.card_frame().show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(&tool.name).strong());
            if tool.is_mcp {
                ui.label(RichText::new("MCP").color(theme.accent_primary).small());
            }
        });

        let description = if is_expanded || tool.description.chars().count() <= 120 {
            tool.description.clone()
        } else {
            crate::util::truncate_text(&tool.description, 120)
        };
        ui.add(
            egui::Label::new(RichText::new(description).color(theme.text_muted).small()).wrap(),
        );

        if tool.description.chars().count() > 120 {
            let label = if is_expanded { "Less" } else { "Details" };
            if ui.small_button(label).clicked() {
                *toggled = Some(tool.name.clone());
            }
        }
    });
    ui.add_space(theme.spacing_4);
}
