use eframe::egui::{self, Key, RichText, ScrollArea, TextEdit};

use crate::session::{AgentState, ExecutionStep, SessionState};
use crate::theme::Theme;

/// Composer panel: multiline input, character count, send button. Returns
/// true when the user asked to send (Enter or button); Shift+Enter inserts
/// a newline.
pub fn composer(ui: &mut egui::Ui, theme: &Theme, session: &mut SessionState) -> bool {
    let busy = session.busy();
    let mut submit = false;

    theme.composer_frame().show(ui, |ui| {
        ui.label(RichText::new("Describe the task").strong());
        ui.label(
            RichText::new("Shift+Enter for a new line")
                .color(theme.text_muted)
                .small(),
        );
        ui.add_space(theme.spacing_4);

        let hint = if busy {
            "Waiting for the agent..."
        } else {
            "e.g. implement a red-black tree with insert/delete/find tests"
        };
        let response = ui.add_enabled(
            !busy,
            TextEdit::multiline(&mut session.input)
                .desired_rows(6)
                .desired_width(f32::INFINITY)
                .hint_text(hint),
        );

        let enter_pressed = response.has_focus()
            && ui.input(|i| i.key_pressed(Key::Enter) && !i.modifiers.shift);
        if enter_pressed {
            // The widget already inserted the newline for this keypress.
            if session.input.ends_with('\n') {
                session.input.pop();
            }
            submit = true;
        }

        ui.add_space(theme.spacing_4);
        ui.horizontal(|ui| {
            let count = session.input.chars().count();
            let counter = if count > 0 {
                format!("{count} characters")
            } else {
                "Press Enter to send".to_string()
            };
            ui.label(RichText::new(counter).color(theme.text_muted).small());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let can_send = !busy && !session.input.trim().is_empty();
                if ui
                    .add_enabled(can_send, egui::Button::new("Send"))
                    .clicked()
                {
                    submit = true;
                }
            });
        });
    });

    submit && !busy
}

pub fn plan_panel(ui: &mut egui::Ui, theme: &Theme, session: &SessionState) {
    let plan = session.plan_display();
    let completed = session.completed_count();

    ui.horizontal(|ui| {
        ui.label(RichText::new("Execution plan").strong());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let badge = if plan.is_empty() { "pending" } else { "live" };
            ui.label(RichText::new(badge).color(theme.accent_primary).small());
        });
    });
    if plan.is_empty() {
        ui.label(
            RichText::new("A plan appears here once you send a task.")
                .color(theme.text_muted)
                .small(),
        );
        return;
    }
    ui.label(
        RichText::new(format!("{completed}/{} steps completed", plan.len()))
            .color(theme.text_muted)
            .small(),
    );
    ui.add_space(theme.spacing_4);

    ScrollArea::vertical()
        .id_salt("plan_panel")
        .max_height(260.0)
        .show(ui, |ui| {
            for step in plan {
                plan_card(ui, theme, step);
            }
        });
}

fn plan_card(ui: &mut egui::Ui, theme: &Theme, step: &ExecutionStep) {
    let completed = step.is_completed();
    let marker = if completed { "✔" } else { "○" };
    let action = if step.action.is_empty() {
        "planning"
    } else {
        step.action.as_str()
    };
    let detail = if !step.thought.is_empty() {
        step.thought.as_str()
    } else {
        step.observation.trim()
    };

    let fill = if completed {
        theme.success_tint
    } else {
        theme.surface_2
    };
    theme.panel_frame(fill, theme.spacing_8 as i8).show(ui, |ui| {
        let mut line = format!("{marker} Step {}: {action}", step.step_num);
        if !detail.is_empty() {
            line.push_str(" — ");
            line.push_str(detail);
        }
        let color = if completed {
            theme.text_primary
        } else {
            theme.text_muted
        };
        ui.add(egui::Label::new(RichText::new(line).color(color)).wrap());
    });
    ui.add_space(theme.spacing_4);
}

pub fn status_panel(ui: &mut egui::Ui, theme: &Theme, session: &SessionState) {
    ui.horizontal(|ui| {
        ui.label(RichText::new("Run status").strong());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            match session.agent_state() {
                AgentState::Running => {
                    ui.label(RichText::new("● running").color(theme.success).small());
                }
                AgentState::Idle => {
                    ui.label(RichText::new("● idle").color(theme.text_muted).small());
                }
            }
        });
    });

    let status = session.status_display();
    if status.is_empty() {
        ui.label(
            RichText::new("Execution details show up here while a task runs.")
                .color(theme.text_muted)
                .small(),
        );
        return;
    }
    ui.add_space(theme.spacing_4);

    ScrollArea::vertical()
        .id_salt("status_panel")
        .max_height(220.0)
        .stick_to_bottom(true)
        .show(ui, |ui| {
            let last = status.len().saturating_sub(1);
            for (index, step) in status.iter().enumerate() {
                status_card(ui, theme, step, index == last);
            }
        });
}

fn status_card(ui: &mut egui::Ui, theme: &Theme, step: &ExecutionStep, latest: bool) {
    let fill = if latest { theme.success_tint } else { theme.surface_2 };
    theme.panel_frame(fill, theme.spacing_8 as i8).show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(format!("Step {}", step.step_num)).strong().small());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let action = if step.action.is_empty() {
                    "working"
                } else {
                    step.action.as_str()
                };
                ui.label(RichText::new(action).color(theme.text_muted).small());
            });
        });
        let observation = step.observation.trim();
        if !observation.is_empty() {
            ui.add(egui::Label::new(RichText::new(observation).small()).wrap());
        }
    });
    ui.add_space(theme.spacing_4);
}
