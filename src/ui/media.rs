use eframe::egui::{Color32, RichText, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Media panel (right side)
// ---------------------------------------------------------------------------

/// Show the video resolved for the current selection. A missing file is
/// reported here and nowhere else.
pub fn media_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Video");
    ui.separator();

    let Some(media) = &state.media else {
        ui.label("No selection.");
        return;
    };

    ui.label(RichText::new(&media.path).monospace());
    ui.add_space(4.0);

    if media.exists {
        ui.label(RichText::new("Available").color(Color32::DARK_GREEN));
    } else {
        ui.label(RichText::new("Video not found").color(Color32::RED));
    }

    if ui.button("Copy path").clicked() {
        ui.ctx().copy_text(media.path.clone());
    }

    if let Some(selection) = &state.selection {
        ui.add_space(8.0);
        ui.separator();
        ui.small(selection.facets.to_string());
    }
}
