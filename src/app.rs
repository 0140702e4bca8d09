use chrono::Local;
use eframe::egui::{self, RichText, ScrollArea};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use uuid::Uuid;

use crate::api::ChatSession;
use crate::backend::Backend;
use crate::event::{AppEvent, LinkState};
use crate::session::SessionState;
use crate::theme::Theme;
use crate::ui::config_tab::{self, ConfigAction, ConfigPanelState};
use crate::ui::messages::{self, MessageListState};
use crate::ui::sidebar::{self, SidebarAction};
use crate::ui::status_tab;
use crate::ui::tools::{self, ToolsPanelState};
use crate::ui::chat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightTab {
    Tools,
    Config,
    Status,
}

pub struct AgentDeckApp {
    rx: Receiver<AppEvent>,
    backend: Backend,
    theme: Theme,
    session: SessionState,
    link_state: LinkState,
    history: Vec<ChatSession>,
    history_loading: bool,
    tools_panel: ToolsPanelState,
    config_panel: ConfigPanelState,
    message_list: MessageListState,
    right_tab: Option<RightTab>,
    diagnostics: Vec<String>,
}

impl AgentDeckApp {
    pub fn new(rx: Receiver<AppEvent>, backend: Backend, session_id: String) -> Self {
        Self {
            rx,
            backend,
            theme: Theme::default(),
            session: SessionState::new(session_id),
            link_state: LinkState::Disconnected,
            history: Vec::new(),
            history_loading: true,
            tools_panel: ToolsPanelState::default(),
            config_panel: ConfigPanelState::default(),
            message_list: MessageListState::default(),
            right_tab: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn mint_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn log_diagnostic(&mut self, message: impl Into<String>) {
        let stamp = Local::now().format("%H:%M:%S");
        self.diagnostics.push(format!("[{stamp}] {}", message.into()));
    }

    fn drain_events(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.log_diagnostic("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::StepUpdate { session_id, step } => {
                self.session.apply_step_update(&session_id, step);
            }
            AppEvent::ChatFinished { session_id, result } => {
                if let Err(err) = &result {
                    self.log_diagnostic(format!("chat request failed: {err}"));
                }
                self.session.apply_chat_result(&session_id, result);
            }
            AppEvent::HistoryLoaded(result) => {
                self.history_loading = false;
                match result {
                    Ok(history) => self.history = history,
                    Err(err) => {
                        log::warn!("failed to load history: {err}");
                        self.log_diagnostic(format!("history fetch failed: {err}"));
                    }
                }
            }
            AppEvent::ToolsLoaded(result) => self.tools_panel.apply_loaded(result),
            AppEvent::ConfigLoaded(result) => self.config_panel.apply_loaded(result),
            AppEvent::ConfigSaved(result) => self.config_panel.apply_saved(result),
            AppEvent::LinkChanged(state) => {
                if state != self.link_state {
                    self.link_state = state;
                    let (label, _) = status_tab::link_label(&self.theme, state);
                    self.log_diagnostic(format!("step stream {label}"));
                }
            }
        }
    }

    fn submit_prompt(&mut self) {
        if let Some(text) = self.session.begin_send() {
            self.backend
                .send_chat(self.session.session_id().to_string(), text);
        }
    }

    fn switch_session(&mut self, session_id: String) {
        self.session.reset(session_id.clone());
        self.message_list.reset();
        self.backend.subscribe_steps(&session_id);
    }

    fn toggle_tab(&mut self, tab: RightTab) {
        if self.right_tab == Some(tab) {
            self.right_tab = None;
            return;
        }
        self.right_tab = Some(tab);
        match tab {
            RightTab::Tools => {
                self.tools_panel.begin_load();
                self.backend.load_tools();
            }
            RightTab::Config => {
                self.config_panel.begin_load();
                self.backend.load_config();
            }
            RightTab::Status => {}
        }
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        let mut clicked_tab = None;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(self.theme.spacing_4);
            ui.horizontal(|ui| {
                ui.label(RichText::new("AgentDeck").heading().strong());
                ui.label(
                    RichText::new("code assistant dashboard")
                        .color(self.theme.text_muted)
                        .small(),
                );
                ui.separator();
                let (label, color) = status_tab::link_label(&self.theme, self.link_state);
                ui.label(RichText::new(format!("● {label}")).color(color).small());

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    for (tab, label) in [
                        (RightTab::Status, "Status"),
                        (RightTab::Config, "Config"),
                        (RightTab::Tools, "Tools"),
                    ] {
                        let active = self.right_tab == Some(tab);
                        if ui.selectable_label(active, label).clicked() {
                            clicked_tab = Some(tab);
                        }
                    }
                });
            });
            ui.add_space(self.theme.spacing_4);
        });

        if let Some(tab) = clicked_tab {
            self.toggle_tab(tab);
        }
    }

    fn render_sidebar(&mut self, ctx: &egui::Context) {
        let mut action = None;
        egui::SidePanel::left("history_panel")
            .resizable(true)
            .default_width(230.0)
            .show(ctx, |ui| {
                action = sidebar::show(
                    ui,
                    &self.theme,
                    &self.history,
                    self.history_loading,
                    self.session.session_id(),
                );
            });

        match action {
            Some(SidebarAction::NewChat) => self.switch_session(Self::mint_session_id()),
            Some(SidebarAction::OpenSession(id)) => self.switch_session(id),
            None => {}
        }
    }

    fn render_right_panel(&mut self, ctx: &egui::Context) {
        let Some(tab) = self.right_tab else {
            return;
        };

        let mut close = false;
        let mut config_action = None;
        egui::SidePanel::right("inspector_panel")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let title = match tab {
                        RightTab::Tools => "Tools",
                        RightTab::Config => "Config",
                        RightTab::Status => "Status",
                    };
                    ui.label(RichText::new(title).strong());
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        close = ui.small_button("✕").clicked();
                    });
                });
                ui.separator();

                ScrollArea::vertical().id_salt("inspector_body").show(ui, |ui| {
                    match tab {
                        RightTab::Tools => tools::show(ui, &self.theme, &mut self.tools_panel),
                        RightTab::Config => {
                            config_action = config_tab::show(ui, &self.theme, &mut self.config_panel);
                        }
                        RightTab::Status => status_tab::show(
                            ui,
                            &self.theme,
                            &self.session,
                            self.link_state,
                            &self.diagnostics,
                        ),
                    }
                });
            });

        if let Some(ConfigAction::Save(config)) = config_action {
            self.backend.save_config(config);
        }
        if close {
            self.right_tab = None;
        }
    }

    fn render_central(&mut self, ctx: &egui::Context) {
        let mut submit = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal_top(|ui| {
                ui.vertical(|ui| {
                    ui.set_width(380.0);
                    submit = chat::composer(ui, &self.theme, &mut self.session);
                    ui.add_space(self.theme.spacing_12);
                    chat::plan_panel(ui, &self.theme, &self.session);
                });
                ui.separator();
                ui.vertical(|ui| {
                    chat::status_panel(ui, &self.theme, &self.session);
                    ui.add_space(self.theme.spacing_12);
                    ui.separator();
                    ui.add_space(self.theme.spacing_4);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new("Transcript").strong());
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new("latest at the bottom")
                                    .color(self.theme.text_muted)
                                    .small(),
                            );
                        });
                    });
                    ScrollArea::vertical()
                        .id_salt("transcript")
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            messages::show(
                                ui,
                                &self.theme,
                                self.session.messages(),
                                self.session.busy(),
                                &mut self.message_list,
                            );
                        });
                });
            });
        });

        if submit {
            self.submit_prompt();
        }
    }
}

impl eframe::App for AgentDeckApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.render_top_bar(ctx);
        self.render_sidebar(ctx);
        self.render_right_panel(ctx);
        self.render_central(ctx);

        // Push events arrive outside the frame loop; poll for them shortly.
        ctx.request_repaint_after(Duration::from_millis(200));
    }
}
