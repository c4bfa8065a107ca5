mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use eframe::egui;
use serde::Serialize;

use rhyme_viewer::config::ViewerConfig;
use rhyme_viewer::data::loader::load_file;
use rhyme_viewer::data::{
    AcousticFeature, Facet, KinematicFeature, MetadataValue, Selection, SelectionResult,
    SignalTable, select,
};

use app::RhymeViewerApp;
use state::AppState;

/// Explore prosody and pointing-gesture recordings side by side
#[derive(Parser, Debug)]
#[command(name = "rhyme-viewer")]
#[command(version)]
#[command(about = "Multimodal prosody/gesture time-series viewer", long_about = None)]
struct Cli {
    /// Recording table to open (.csv, .parquet or .json)
    data: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the videos are served from
    #[arg(long)]
    asset_root: Option<String>,

    /// Video file extension
    #[arg(long)]
    asset_ext: Option<String>,

    /// Print one selection as JSON instead of opening the viewer
    #[arg(long)]
    json: bool,

    #[arg(long)]
    speaker: Option<String>,

    #[arg(long)]
    rhyme: Option<String>,

    #[arg(long)]
    hand: Option<String>,

    #[arg(long)]
    rate: Option<String>,

    /// env, env_att or f0
    #[arg(long)]
    acoustic: Option<AcousticFeature>,

    /// m_/a_/v_ followed by fing, wrist or elb
    #[arg(long)]
    kinematic: Option<KinematicFeature>,
}

impl Cli {
    /// Defaults, then the config file, then command-line flags.
    fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => ViewerConfig::default(),
        };
        if let Some(root) = &self.asset_root {
            config.asset_root = root.clone();
        }
        if let Some(ext) = &self.asset_ext {
            config.asset_extension = ext.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// Start from the configured default and replace whatever was given on
    /// the command line. Facet text is typed like a CSV cell.
    fn selection(&self, config: &ViewerConfig, table: &SignalTable) -> Selection {
        let mut selection = config.initial_selection(table);
        let overrides = [
            (Facet::Speaker, &self.speaker),
            (Facet::RhymeName, &self.rhyme),
            (Facet::PointHand, &self.hand),
            (Facet::SpeechRate, &self.rate),
        ];
        for (facet, value) in overrides {
            if let Some(text) = value {
                selection.facets.set(facet, MetadataValue::infer(text));
            }
        }
        if let Some(a) = self.acoustic {
            selection.acoustic = a;
        }
        if let Some(k) = self.kinematic {
            selection.kinematic = k;
        }
        selection
    }
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    selection: &'a Selection,
    asset: String,
    series: &'a SelectionResult,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.viewer_config()?;

    // A table named on the command line must load; there is nothing to show otherwise.
    let table = match &cli.data {
        Some(path) => Some(load_file(path)?),
        None => None,
    };

    if cli.json {
        let Some(table) = table else {
            bail!("--json needs a data file");
        };
        return run_query(&cli, &config, &table);
    }

    let mut state = AppState::new(config);
    if let Some(table) = table {
        state.set_dataset(table, cli.data.clone());
    }
    run_viewer(state)
}

fn run_query(cli: &Cli, config: &ViewerConfig, table: &SignalTable) -> Result<()> {
    let selection = cli.selection(config, table);
    if let Err(e) = table.validate(&selection.facets) {
        log::warn!("{e}; the result will be empty");
    }

    let series = select(table, &selection);
    let output = QueryOutput {
        selection: &selection,
        asset: config.resolver().resolve_facets(&selection.facets),
        series: &series,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_viewer(state: AppState) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([800.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rhyme Viewer – Prosody & Gesture",
        options,
        Box::new(|_cc| Ok(Box::new(RhymeViewerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhyme_viewer::data::FacetTuple;
    use rhyme_viewer::data::model::RawColumns;

    fn table() -> SignalTable {
        let mut raw = RawColumns::with_capacity(2);
        raw.push_row(0.0, FacetTuple::new(1, "ent", "_L", "normal"), [Some(0.0); 9]);
        raw.push_row(0.0, FacetTuple::new(2, "zoo", "_R", "fast"), [Some(0.0); 9]);
        SignalTable::from_columns(raw)
    }

    #[test]
    fn flags_override_config_and_are_typed_like_csv() {
        let cli = Cli::parse_from([
            "rhyme-viewer",
            "data.csv",
            "--json",
            "--speaker",
            "2",
            "--rate",
            "fast",
            "--acoustic",
            "f0",
            "--kinematic",
            "v_elb",
        ]);
        let config = cli.viewer_config().unwrap();
        let sel = cli.selection(&config, &table());

        assert_eq!(sel.facets.speaker, MetadataValue::Integer(2));
        assert_eq!(sel.facets.speech_rate, MetadataValue::from("fast"));
        assert_eq!(sel.facets.rhyme_name, MetadataValue::from("ent"));
        assert_eq!(sel.acoustic, AcousticFeature::F0);
        assert_eq!(sel.kinematic, KinematicFeature::VElb);
    }

    #[test]
    fn unknown_feature_flag_is_rejected() {
        let parsed = Cli::try_parse_from(["rhyme-viewer", "--acoustic", "m_fing"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn asset_flags_override_defaults() {
        let cli = Cli::parse_from(["rhyme-viewer", "--asset-root", "/videos", "--asset-ext", "webm"]);
        let config = cli.viewer_config().unwrap();
        assert_eq!(
            config.resolver().resolve_facets(&FacetTuple::new(4, "ent", "_L", "fast")),
            "/videos/vp4_Left_fast001.webm"
        );
    }

    #[test]
    fn invalid_extension_flag_is_fatal() {
        let cli = Cli::parse_from(["rhyme-viewer", "--asset-ext", ".mp4"]);
        assert!(cli.viewer_config().is_err());
    }
}
