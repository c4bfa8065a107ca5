use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use rhyme_viewer::data::{AcousticFeature, Facet, KinematicFeature};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel: one dropdown per facet and feature.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Selection");
    ui.separator();

    // Cheap handle so we can mutate state inside the loop.
    let Some(dataset) = state.dataset.clone() else {
        ui.label("No dataset loaded.");
        return;
    };
    let Some(selection) = state.selection.clone() else {
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for facet in Facet::ALL {
                let current = selection.facets.get(facet);
                ui.strong(format!("{}:", facet.label()));
                egui::ComboBox::from_id_salt(facet.column_name())
                    .selected_text(current.to_string())
                    .width(ui.available_width() * 0.9)
                    .show_ui(ui, |ui: &mut Ui| {
                        for value in dataset.facet_values(facet) {
                            if ui
                                .selectable_label(current == value, value.to_string())
                                .clicked()
                            {
                                state.set_facet(facet, value.clone());
                            }
                        }
                    });
                ui.add_space(4.0);
            }

            ui.separator();

            ui.strong("Acoustic feature:");
            egui::ComboBox::from_id_salt("acoustic_feature")
                .selected_text(selection.acoustic.name())
                .width(ui.available_width() * 0.9)
                .show_ui(ui, |ui: &mut Ui| {
                    for feature in AcousticFeature::ALL {
                        if ui
                            .selectable_label(selection.acoustic == feature, feature.name())
                            .clicked()
                        {
                            state.set_acoustic(feature);
                        }
                    }
                });
            ui.add_space(4.0);

            ui.strong("Kinematic feature:");
            egui::ComboBox::from_id_salt("kinematic_feature")
                .selected_text(selection.kinematic.name())
                .width(ui.available_width() * 0.9)
                .show_ui(ui, |ui: &mut Ui| {
                    for feature in KinematicFeature::ALL {
                        if ui
                            .selectable_label(selection.kinematic == feature, feature.name())
                            .clicked()
                        {
                            state.set_kinematic(feature);
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(name) = state.source_name() {
            ui.strong(name);
        }

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} samples in {} sessions, {} shown",
                ds.len(),
                ds.sessions().len(),
                state.result.as_ref().map_or(0, |r| r.len())
            ));
        }

        ui.separator();

        if ui
            .selectable_label(state.show_sessions, "Sessions")
            .clicked()
        {
            state.show_sessions = !state.show_sessions;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open recordings")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
