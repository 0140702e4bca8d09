use chrono::Utc;
use eframe::egui::{self, RichText, ScrollArea};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::session::{ChatMessage, Role};
use crate::theme::Theme;
use crate::util::format_relative;

/// A message longer than this (in characters or lines) starts collapsed.
pub const COLLAPSE_CHAR_LIMIT: usize = 600;
pub const COLLAPSE_LINE_LIMIT: usize = 12;

/// Trailing steps shown in the per-message digest.
const KEY_STEP_DIGEST: usize = 5;

const COLLAPSED_HEIGHT: f32 = 190.0;
const COPIED_FEEDBACK: Duration = Duration::from_secs(2);

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(\w+)?\n((?s).*?)```").expect("fenced block pattern is valid"));

#[derive(Debug, PartialEq)]
pub enum Segment {
    Text(String),
    Code { language: String, code: String },
}

/// Split message content into plain text and fenced code blocks.
pub fn split_fenced(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for captures in FENCED_BLOCK.captures_iter(content) {
        let Some(whole) = captures.get(0) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text(content[last..whole.start()].to_string()));
        }
        let language = captures
            .get(1)
            .map(|m| m.as_str())
            .filter(|lang| !lang.is_empty())
            .unwrap_or("text")
            .to_string();
        let code = captures.get(2).map(|m| m.as_str()).unwrap_or("").to_string();
        segments.push(Segment::Code { language, code });
        last = whole.end();
    }

    if last < content.len() {
        segments.push(Segment::Text(content[last..].to_string()));
    }
    segments
}

pub fn should_collapse(content: &str) -> bool {
    content.chars().count() > COLLAPSE_CHAR_LIMIT
        || content.split('\n').count() > COLLAPSE_LINE_LIMIT
}

#[derive(Default)]
pub struct MessageListState {
    expanded: HashSet<usize>,
    copied: Option<(usize, usize, Instant)>,
}

impl MessageListState {
    pub fn reset(&mut self) {
        self.expanded.clear();
        self.copied = None;
    }

    fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }

    fn toggle(&mut self, index: usize) {
        if !self.expanded.remove(&index) {
            self.expanded.insert(index);
        }
    }

    fn just_copied(&self, message: usize, block: usize) -> bool {
        self.copied
            .is_some_and(|(m, b, at)| m == message && b == block && at.elapsed() < COPIED_FEEDBACK)
    }
}

pub fn show(
    ui: &mut egui::Ui,
    theme: &Theme,
    messages: &[ChatMessage],
    busy: bool,
    state: &mut MessageListState,
) {
    if messages.is_empty() && !busy {
        ui.add_space(theme.spacing_16);
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("No messages yet. Ask the agent something.").color(theme.text_muted));
        });
        return;
    }

    let now = Utc::now();
    for (index, message) in messages.iter().enumerate() {
        theme.card_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                let (name, color) = match message.role {
                    Role::User => ("You", theme.accent_primary),
                    Role::Assistant => ("Agent", theme.success),
                };
                ui.label(RichText::new(name).color(color).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(format_relative(message.timestamp, now))
                            .color(theme.text_muted)
                            .small(),
                    );
                });
            });
            ui.add_space(theme.spacing_4);

            message_body(ui, theme, index, message, state);

            if let Some(steps) = message.steps.as_deref().filter(|steps| !steps.is_empty()) {
                ui.add_space(theme.spacing_8);
                key_steps_digest(ui, theme, steps);
            }
        });
        ui.add_space(theme.spacing_8);
    }

    if busy {
        theme.card_frame().show(ui, |ui| {
            ui.label(RichText::new("Agent is working...").color(theme.text_muted));
        });
    }
}

fn message_body(
    ui: &mut egui::Ui,
    theme: &Theme,
    index: usize,
    message: &ChatMessage,
    state: &mut MessageListState,
) {
    let collapsible = should_collapse(&message.content);
    let expanded = state.is_expanded(index);

    if collapsible && !expanded {
        ScrollArea::vertical()
            .id_salt(("message_body", index))
            .max_height(COLLAPSED_HEIGHT)
            .show(ui, |ui| {
                message_segments(ui, theme, index, &message.content, state);
            });
    } else {
        message_segments(ui, theme, index, &message.content, state);
    }

    if collapsible {
        ui.add_space(theme.spacing_4);
        let label = if expanded { "Show less" } else { "Show all" };
        if ui.small_button(label).clicked() {
            state.toggle(index);
        }
    }
}

fn message_segments(
    ui: &mut egui::Ui,
    theme: &Theme,
    message_index: usize,
    content: &str,
    state: &mut MessageListState,
) {
    for (block_index, segment) in split_fenced(content).into_iter().enumerate() {
        match segment {
            Segment::Text(text) => {
                let trimmed = text.trim_matches('\n');
                if !trimmed.is_empty() {
                    ui.add(egui::Label::new(RichText::new(trimmed)).wrap());
                }
            }
            Segment::Code { language, code } => {
                code_block(ui, theme, message_index, block_index, &language, &code, state);
            }
        }
    }
}

fn code_block(
    ui: &mut egui::Ui,
    theme: &Theme,
    message_index: usize,
    block_index: usize,
    language: &str,
    code: &str,
    state: &mut MessageListState,
) {
    theme.code_frame().show(ui, |ui| {
        ui.horizontal(|ui| {
            ui.label(RichText::new(language).color(theme.text_muted).monospace().small());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let copied = state.just_copied(message_index, block_index);
                let label = if copied { "✔ Copied" } else { "Copy" };
                if ui.small_button(label).clicked() {
                    ui.ctx().copy_text(code.to_string());
                    state.copied = Some((message_index, block_index, Instant::now()));
                }
            });
        });
        ui.separator();
        ScrollArea::horizontal()
            .id_salt(("code_block", message_index, block_index))
            .show(ui, |ui| {
                ui.add(egui::Label::new(RichText::new(code.trim_end()).monospace()).wrap());
            });
    });
    ui.add_space(theme.spacing_4);
}

fn key_steps_digest(ui: &mut egui::Ui, theme: &Theme, steps: &[crate::session::ExecutionStep]) {
    theme.code_frame().show(ui, |ui| {
        ui.label(RichText::new("Key steps").color(theme.text_muted).small().strong());
        let tail = &steps[steps.len().saturating_sub(KEY_STEP_DIGEST)..];
        for step in tail {
            let action = if step.action.is_empty() {
                "thinking"
            } else {
                step.action.as_str()
            };
            let mut line = format!("Step {}: {action}", step.step_num);
            let observation = step.observation.trim();
            if !observation.is_empty() {
                line.push_str(" → ");
                line.push_str(observation);
            }
            ui.label(RichText::new(line).color(theme.text_muted).small());
        }
    });
}
