use eframe::egui::{Color32, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints};

use crate::state::AppState;

/// Both plots pan and zoom together along time.
const TIME_AXIS_GROUP: &str = "time_axis";

// ---------------------------------------------------------------------------
// Time-series plots (central panel)
// ---------------------------------------------------------------------------

/// Render the acoustic series above the kinematic series on a shared,
/// linked time axis.
pub fn signal_plots(ui: &mut Ui, state: &AppState) {
    let (Some(_), Some(result)) = (&state.dataset, &state.result) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view recordings  (File → Open…)");
        });
        return;
    };

    if result.is_empty() {
        ui.label("No samples for this selection.");
    }

    let height = (ui.available_height() - ui.spacing().item_spacing.y) / 2.0;

    let acoustic = result.acoustic;
    series_plot(
        ui,
        "acoustic_plot",
        acoustic.name(),
        result.acoustic_points(),
        state.palette.color_for(acoustic.channel()),
        height,
    );

    let kinematic = result.kinematic;
    series_plot(
        ui,
        "kinematic_plot",
        kinematic.name(),
        result.kinematic_points(),
        state.palette.color_for(kinematic.channel()),
        height,
    );
}

/// One plot; every run of present samples becomes its own line so missing
/// values show as gaps.
fn series_plot(
    ui: &mut Ui,
    id: &str,
    name: &str,
    segments: Vec<Vec<[f64; 2]>>,
    color: Color32,
    height: f32,
) {
    Plot::new(id)
        .legend(Legend::default())
        .height(height)
        .x_axis_label("time (ms)")
        .y_axis_label(name)
        .link_axis(TIME_AXIS_GROUP, [true, false])
        .link_cursor(TIME_AXIS_GROUP, [true, false])
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for points in segments {
                let line = Line::new(PlotPoints::from(points))
                    .name(name)
                    .color(color)
                    .width(1.5);
                plot_ui.line(line);
            }
        });
}
