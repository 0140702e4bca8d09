use chrono::Utc;
use eframe::egui::{self, RichText, ScrollArea};

use crate::api::ChatSession;
use crate::theme::Theme;
use crate::util::{format_relative, parse_timestamp, truncate_text};

const TITLE_LIMIT: usize = 25;

pub enum SidebarAction {
    NewChat,
    OpenSession(String),
}

/// Read-only history list plus the new-chat control. Selection and reset are
/// handled by the caller.
pub fn show(
    ui: &mut egui::Ui,
    theme: &Theme,
    history: &[ChatSession],
    loading: bool,
    current_session: &str,
) -> Option<SidebarAction> {
    let mut action = None;

    ui.label(RichText::new("Conversations").strong());
    ui.add_space(theme.spacing_8);

    if ui
        .add_sized(
            [ui.available_width(), 30.0],
            egui::Button::new(RichText::new("＋ New chat").color(theme.text_primary)),
        )
        .clicked()
    {
        action = Some(SidebarAction::NewChat);
    }
    ui.add_space(theme.spacing_8);
    ui.separator();
    ui.add_space(theme.spacing_4);

    ScrollArea::vertical().id_salt("history_list").show(ui, |ui| {
        if loading {
            ui.label(RichText::new("Loading...").color(theme.text_muted).small());
            return;
        }
        if history.is_empty() {
            ui.label(RichText::new("No history yet").color(theme.text_muted).small());
            return;
        }

        let now = Utc::now();
        for session in history {
            let selected = session.id == current_session;
            let title = truncate_text(&session.title, TITLE_LIMIT);
            let when = parse_timestamp(&session.time)
                .map(|ts| format_relative(ts, now))
                .unwrap_or_else(|| session.time.clone());

            let fill = if selected { theme.surface_3 } else { theme.surface_2 };
            let response = theme
                .panel_frame(fill, theme.spacing_8 as i8)
                .show(ui, |ui| {
                    ui.add(egui::Label::new(RichText::new(title)).truncate());
                    ui.label(
                        RichText::new(format!("{when} · {} messages", session.message_count))
                            .color(theme.text_muted)
                            .small(),
                    );
                })
                .response;

            if response.interact(egui::Sense::click()).clicked() && !selected {
                action = Some(SidebarAction::OpenSession(session.id.clone()));
            }
            ui.add_space(theme.spacing_4);
        }
    });

    action
}
