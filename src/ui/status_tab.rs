use eframe::egui::{self, RichText, ScrollArea};

use crate::event::LinkState;
use crate::session::{AgentState, SessionState};
use crate::theme::Theme;
use crate::ui::chat;

/// Status tab: agent and push-channel state plus the recent-activity view,
/// and the diagnostics log at the bottom.
pub fn show(
    ui: &mut egui::Ui,
    theme: &Theme,
    session: &SessionState,
    link_state: LinkState,
    diagnostics: &[String],
) {
    ui.label(RichText::new("Execution status").strong());
    ui.add_space(theme.spacing_8);

    theme.card_frame().show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new("Agent").color(theme.text_muted).small());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match session.agent_state() {
                    AgentState::Running => {
                        ui.label(RichText::new("running").color(theme.success).small());
                    }
                    AgentState::Idle => {
                        ui.label(RichText::new("idle").color(theme.text_muted).small());
                    }
                }
            });
        });
        ui.horizontal(|ui| {
            ui.label(RichText::new("Stream").color(theme.text_muted).small());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (label, color) = link_label(theme, link_state);
                ui.label(RichText::new(label).color(color).small());
            });
        });
        ui.horizontal(|ui| {
            ui.label(RichText::new("Session").color(theme.text_muted).small());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    RichText::new(session.session_id())
                        .color(theme.text_muted)
                        .small()
                        .monospace(),
                );
            });
        });
    });
    ui.add_space(theme.spacing_8);

    chat::status_panel(ui, theme, session);

    ui.add_space(theme.spacing_8);
    egui::CollapsingHeader::new(RichText::new("Diagnostics").small())
        .default_open(false)
        .show(ui, |ui| {
            if diagnostics.is_empty() {
                ui.label(RichText::new("Nothing logged").color(theme.text_muted).small());
                return;
            }
            ScrollArea::vertical()
                .id_salt("diagnostics_log")
                .max_height(120.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for entry in diagnostics {
                        ui.label(RichText::new(entry).color(theme.text_muted).small().monospace());
                    }
                });
        });
}

pub fn link_label(theme: &Theme, link_state: LinkState) -> (&'static str, egui::Color32) {
    match link_state {
        LinkState::Connected => ("connected", theme.success),
        LinkState::Connecting => ("connecting...", theme.warning),
        LinkState::Disconnected => ("disconnected", theme.text_muted),
        LinkState::Error => ("error", theme.danger),
    }
}
