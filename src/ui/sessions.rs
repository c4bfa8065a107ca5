use eframe::egui::{RichText, Ui};
use egui_extras::{Column, TableBuilder};

use rhyme_viewer::data::Facet;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Session overview (bottom panel)
// ---------------------------------------------------------------------------

/// One row per session with its sample count and time span. "Show" jumps
/// the selection to that session.
pub fn session_table(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = state.dataset.clone() else {
        return;
    };
    let current = state.selection.as_ref().map(|s| s.facets.clone());
    let time = dataset.time_ms();
    let mut clicked = None;

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .columns(Column::auto().at_least(80.0), Facet::ALL.len())
        .column(Column::auto().at_least(60.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|_ui| {});
            for facet in Facet::ALL {
                header.col(|ui| {
                    ui.strong(facet.label());
                });
            }
            header.col(|ui| {
                ui.strong("Samples");
            });
            header.col(|ui| {
                ui.strong("Time span (ms)");
            });
        })
        .body(|body| {
            body.rows(18.0, dataset.sessions().len(), |mut row| {
                let session = &dataset.sessions()[row.index()];
                let is_current = current.as_ref() == Some(&session.key);
                row.col(|ui| {
                    if ui.small_button("Show").clicked() {
                        clicked = Some(session.key.clone());
                    }
                });
                for facet in Facet::ALL {
                    row.col(|ui| {
                        let text = RichText::new(session.key.get(facet).to_string());
                        ui.label(if is_current { text.strong() } else { text });
                    });
                }
                row.col(|ui| {
                    ui.label(session.len().to_string());
                });
                row.col(|ui| {
                    let first = session.rows.first().map(|&r| time[r]);
                    let last = session.rows.last().map(|&r| time[r]);
                    if let (Some(a), Some(b)) = (first, last) {
                        ui.label(format!("{a:.0} – {b:.0}"));
                    }
                });
            });
        });

    if let Some(key) = clicked {
        state.set_session(key);
    }
}
