//! The control panel window.

use std::path::PathBuf;

use eframe::egui::{self, Align, Color32, Layout, RichText};
use tracing::warn;

use crate::backend::Backend;
use crate::camera::{Applied, CameraControl, UpdateReport};
use crate::control::{display_label, Widget};
use crate::settings;

pub const TITLE: &str = "Camera Control";

const MIN_WIDTH: f32 = 260.0;
const SLIDER_WIDTH: f32 = 250.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Default,
    Sync,
    Update,
    Load,
    Save,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Default,
        Action::Sync,
        Action::Update,
        Action::Load,
        Action::Save,
    ];

    pub fn label(&self) -> &'static str {
        match *self {
            Action::Default => "Default",
            Action::Sync => "Sync",
            Action::Update => "Update",
            Action::Load => "Load",
            Action::Save => "Save",
        }
    }
}

/// Something the user did during one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Set(String, i64),
    Toggle(String),
    Action(Action),
}

pub struct Window<B> {
    camera: CameraControl<B>,
    profile_dir: PathBuf,
    profile: String,
    profiles: Vec<PathBuf>,
    status: String,
}

impl<B: Backend> Window<B> {
    pub fn new(camera: CameraControl<B>, profile_dir: PathBuf) -> Window<B> {
        let mut window = Window {
            camera,
            profile_dir,
            profile: "default".to_owned(),
            profiles: vec![],
            status: String::new(),
        };

        window.scan_profiles();
        window
    }

    pub fn camera(&self) -> &CameraControl<B> {
        &self.camera
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_profile(&mut self, name: &str) {
        self.profile = name.to_owned();
    }

    fn scan_profiles(&mut self) {
        match settings::list_profiles(&self.profile_dir) {
            Ok(profiles) => self.profiles = profiles,
            Err(err) => warn!("cannot list profiles: {}", err),
        }
    }


    fn report(&mut self, what: &str, report: UpdateReport) {
        self.status = if report.is_clean() {
            format!("{}: {} written", what, report.written)
        } else {
            format!("{}: rejected {}", what, report.failed.join(", "))
        };
    }

    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Set(name, value) => {
                if let Err(err) = self.camera.set_value(&name, value) {
                    // Not every invalid value is refused, but the ones that are get reverted.
                    self.status = err.to_string();
                    self.sync();
                }
            }
            Event::Toggle(name) => match self.camera.toggle(&name) {
                Ok(Applied::Skipped) => self.status = format!("{} is inactive", name),
                Ok(Applied::Written) => self.status.clear(),
                Err(err) => self.status = err.to_string(),
            },
            Event::Action(action) => {
                self.action(action);
                self.sync();
            }
        }
    }

    fn action(&mut self, action: Action) {
        match action {
            Action::Default => {
                let report = self.camera.update(true);
                self.report("Default", report);
            }
            Action::Update => {
                let report = self.camera.update(false);
                self.report("Update", report);
            }
            Action::Sync => self.status.clear(),
            Action::Save => {
                let saved = settings::profile_path(&self.profile_dir, &self.profile)
                    .and_then(|path| settings::save(&path, self.camera.controls()));
                match saved {
                    Ok(path) => self.status = format!("Saved {}", path.display()),
                    Err(err) => self.status = err.to_string(),
                }
                self.scan_profiles();
            }
            Action::Load => {
                let loaded = settings::profile_path(&self.profile_dir, &self.profile)
                    .and_then(|path| settings::load(&path));
                match loaded {
                    Ok(profile) => {
                        let report = self.camera.apply_profile(&profile);
                        self.report("Load", report);
                    }
                    Err(err) => self.status = err.to_string(),
                }
            }
        }
    }

    fn sync(&mut self) {
        if let Err(err) = self.camera.refresh() {
            warn!("could not re-sync controls: {}", err);
            self.status = err.to_string();
        }
    }

    fn controls_ui(&self, ui: &mut egui::Ui, events: &mut Vec<Event>) {
        ui.spacing_mut().slider_width = SLIDER_WIDTH;

        egui::Grid::new("controls")
            .num_columns(2)
            .spacing([4.0, 2.0])
            .show(ui, |ui| {
                for (name, ctrl) in self.camera.controls() {
                    let active = !ctrl.is_inactive() && !ctrl.is_read_only();

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.add_enabled(active, egui::Label::new(display_label(name)));
                    });

                    let value = ctrl.value.unwrap_or(0);

                    match ctrl.widget() {
                        Widget::Toggle => {
                            let (text, fill) = if value != 0 {
                                ("ON", Color32::DARK_GREEN)
                            } else {
                                ("OFF", Color32::DARK_RED)
                            };
                            let button =
                                egui::Button::new(RichText::new(text).color(Color32::WHITE))
                                    .fill(fill);
                            if ui.add_enabled(active, button).clicked() {
                                events.push(Event::Toggle(name.clone()));
                            }
                        }
                        Widget::Slider { min, max, step } => {
                            let mut v = value;
                            let slider =
                                egui::Slider::new(&mut v, min..=max).step_by(step as f64);
                            if ui.add_enabled(active, slider).changed() && v != value {
                                events.push(Event::Set(name.clone(), v));
                            }
                        }
                        Widget::Choice => {
                            let selected = ctrl
                                .selected_item()
                                .map_or_else(|| value.to_string(), |item| item.name.clone());
                            ui.add_enabled_ui(active, |ui| {
                                egui::ComboBox::from_id_source(name)
                                    .selected_text(selected)
                                    .width(SLIDER_WIDTH)
                                    .show_ui(ui, |ui| {
                                        for item in &ctrl.items {
                                            let chosen = item.index == value;
                                            if ui.selectable_label(chosen, &item.name).clicked()
                                                && !chosen
                                            {
                                                events.push(Event::Set(name.clone(), item.index));
                                            }
                                        }
                                    });
                            });
                        }
                        Widget::Trigger => {
                            if ui.add_enabled(active, egui::Button::new("Run")).clicked() {
                                events.push(Event::Set(name.clone(), 1));
                            }
                        }
                        Widget::None => {
                            ui.label(ctrl.kind.as_str());
                        }
                    }

                    ui.end_row();
                }
            });
    }

    fn actions_ui(&mut self, ui: &mut egui::Ui, events: &mut Vec<Event>) {
        ui.horizontal(|ui| {
            for action in Action::ALL {
                if ui.button(action.label()).clicked() {
                    events.push(Event::Action(action));
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Profile:");
            ui.text_edit_singleline(&mut self.profile);

            let profiles = &self.profiles;
            let mut picked = None;
            egui::ComboBox::from_id_source("profiles")
                .selected_text("Saved")
                .show_ui(ui, |ui| {
                    for path in profiles {
                        if let Some(stem) = path.file_stem() {
                            let stem = stem.to_string_lossy();
                            if ui.selectable_label(false, stem.as_ref()).clicked() {
                                picked = Some(stem.into_owned());
                            }
                        }
                    }
                });

            if let Some(stem) = picked {
                self.profile = stem;
            }
        });

        if !self.status.is_empty() {
            ui.label(&self.status);
        }
    }
}

impl<B: Backend> eframe::App for Window<B> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut events = vec![];

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.controls_ui(ui, &mut events);
                ui.separator();
                self.actions_ui(ui, &mut events);
            });
        });

        for event in events {
            self.handle(event);
        }
    }
}

/// Open the panel and block until it is closed.
pub fn run<B: Backend + 'static>(window: Window<B>) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(TITLE)
            .with_min_inner_size([MIN_WIDTH, 120.0]),
        ..Default::default()
    };

    eframe::run_native(TITLE, options, Box::new(|_cc| Box::new(window)))
}
