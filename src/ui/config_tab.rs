use eframe::egui::{self, ComboBox, DragValue, RichText, Slider, TextEdit};

use crate::api::{AgentConfig, Provider};
use crate::theme::Theme;

pub enum ConfigAction {
    Save(AgentConfig),
}

struct Notice {
    ok: bool,
    text: String,
}

/// Local editing state for the backend config. Loaded when the tab opens,
/// persisted only on explicit save.
pub struct ConfigPanelState {
    pub config: AgentConfig,
    loading: bool,
    saving: bool,
    notice: Option<Notice>,
}

impl Default for ConfigPanelState {
    fn default() -> Self {
        Self {
            config: AgentConfig::default(),
            loading: false,
            saving: false,
            notice: None,
        }
    }
}

impl ConfigPanelState {
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.notice = None;
    }

    pub fn apply_loaded(&mut self, result: Result<AgentConfig, String>) {
        self.loading = false;
        match result {
            Ok(config) => self.config = config,
            Err(err) => log::warn!("failed to load config: {err}"),
        }
    }

    pub fn apply_saved(&mut self, result: Result<String, String>) {
        self.saving = false;
        self.notice = Some(match result {
            Ok(message) => Notice { ok: true, text: format!("✔ {message}") },
            Err(err) => Notice { ok: false, text: format!("✘ Save failed: {err}") },
        });
    }
}

pub fn show(ui: &mut egui::Ui, theme: &Theme, state: &mut ConfigPanelState) -> Option<ConfigAction> {
    ui.label(RichText::new("Configuration").strong());
    ui.label(
        RichText::new("Runtime parameters of the agent backend")
            .color(theme.text_muted)
            .small(),
    );
    ui.add_space(theme.spacing_8);

    if state.loading {
        ui.label(RichText::new("Loading...").color(theme.text_muted));
        return None;
    }

    let mut action = None;
    let config = &mut state.config;

    ui.label(RichText::new("LLM provider").small());
    ComboBox::from_id_salt("provider_select")
        .width(ui.available_width())
        .selected_text(config.provider.label())
        .show_ui(ui, |ui| {
            for provider in Provider::ALL {
                ui.selectable_value(&mut config.provider, provider, provider.label());
            }
        });
    ui.add_space(theme.spacing_8);

    ui.label(RichText::new("Model").small());
    ui.add(TextEdit::singleline(&mut config.model).desired_width(f32::INFINITY));
    ui.add_space(theme.spacing_8);

    // Gemini uses the official SDK on the backend; no base URL applies.
    if config.provider.uses_base_url() {
        ui.label(RichText::new("Base URL").small());
        let base_url = config.base_url.get_or_insert_with(String::new);
        ui.add(
            TextEdit::singleline(base_url)
                .desired_width(f32::INFINITY)
                .hint_text("https://api.example.com"),
        );
        ui.add_space(theme.spacing_8);
    }

    ui.label(
        RichText::new(format!("Temperature ({:.1})", config.temperature)).small(),
    );
    ui.add(Slider::new(&mut config.temperature, 0.0..=2.0).step_by(0.1).show_value(false));
    ui.horizontal(|ui| {
        ui.label(RichText::new("precise (0.0)").color(theme.text_muted).small());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(RichText::new("creative (2.0)").color(theme.text_muted).small());
        });
    });
    ui.add_space(theme.spacing_8);

    ui.label(RichText::new("Max steps").small());
    ui.add(DragValue::new(&mut config.max_steps).range(1..=200));
    ui.add_space(theme.spacing_12);

    ui.horizontal(|ui| {
        if ui
            .add_enabled(
                !state.saving,
                egui::Button::new(if state.saving { "Saving..." } else { "Save" }),
            )
            .clicked()
        {
            state.saving = true;
            state.notice = None;
            action = Some(ConfigAction::Save(state.config.clone()));
        }
        if ui.button("Reset").clicked() {
            state.config = AgentConfig::default();
            state.notice = None;
        }
    });

    if let Some(notice) = &state.notice {
        ui.add_space(theme.spacing_8);
        let color = if notice.ok { theme.success } else { theme.danger };
        ui.add(egui::Label::new(RichText::new(&notice.text).color(color).small()).wrap());
    }

    ui.add_space(theme.spacing_12);
    ui.label(
        RichText::new("Changes take effect after saving. Gemini does not need a base URL.")
            .color(theme.text_muted)
            .small(),
    );

    action
}
