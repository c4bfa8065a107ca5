use std::path::{Path, PathBuf};
use std::sync::Arc;

use rhyme_viewer::config::ViewerConfig;
use rhyme_viewer::data::loader::load_file;
use rhyme_viewer::data::{
    AcousticFeature, AssetResolver, Facet, FacetTuple, KinematicFeature, MetadataValue, Selection,
    SelectionCache, SelectionResult, SignalTable,
};

use crate::color::ChannelPalette;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The resolved video for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub path: String,
    pub exists: bool,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ViewerConfig,
    resolver: AssetResolver,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Arc<SignalTable>>,
    pub source_path: Option<PathBuf>,

    /// Current facet/feature choice.
    pub selection: Option<Selection>,

    /// Series for the current selection (cached).
    pub result: Option<Arc<SelectionResult>>,

    /// Video for the current selection.
    pub media: Option<MediaSource>,

    cache: SelectionCache,

    pub palette: ChannelPalette,

    /// Whether the session overview table is shown.
    pub show_sessions: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            resolver: config.resolver(),
            config,
            dataset: None,
            source_path: None,
            selection: None,
            result: None,
            media: None,
            cache: SelectionCache::default(),
            palette: ChannelPalette::default(),
            show_sessions: false,
            status_message: None,
        }
    }

    /// Load a file and make it the current dataset. On failure the previous
    /// dataset stays in place.
    pub fn load_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let table = load_file(path)?;
        self.set_dataset(table, Some(path.to_path_buf()));
        Ok(())
    }

    /// Ingest a newly loaded dataset and apply the configured default selection.
    pub fn set_dataset(&mut self, table: SignalTable, source: Option<PathBuf>) {
        self.cache.clear();
        self.selection = Some(self.config.initial_selection(&table));
        self.dataset = Some(Arc::new(table));
        self.source_path = source;
        self.status_message = None;
        self.refresh();
    }

    /// File name of the loaded dataset, for display.
    pub fn source_name(&self) -> Option<String> {
        self.source_path
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }

    /// Recompute series and media path after a selection change.
    pub fn refresh(&mut self) {
        let (Some(table), Some(selection)) = (&self.dataset, &self.selection) else {
            self.result = None;
            self.media = None;
            return;
        };

        self.result = Some(self.cache.get_or_select(table, selection));

        let path = self.resolver.resolve_facets(&selection.facets);
        let exists = Path::new(&path).exists();
        if !exists {
            log::warn!("Video not found: {path}");
        }
        self.media = Some(MediaSource { path, exists });
    }

    pub fn set_facet(&mut self, facet: Facet, value: MetadataValue) {
        if let Some(sel) = &mut self.selection {
            sel.facets.set(facet, value);
            self.refresh();
        }
    }

    pub fn set_session(&mut self, key: FacetTuple) {
        if let Some(sel) = &mut self.selection {
            sel.facets = key;
            self.refresh();
        }
    }

    pub fn set_acoustic(&mut self, feature: AcousticFeature) {
        if let Some(sel) = &mut self.selection {
            sel.acoustic = feature;
            self.refresh();
        }
    }

    pub fn set_kinematic(&mut self, feature: KinematicFeature) {
        if let Some(sel) = &mut self.selection {
            sel.kinematic = feature;
            self.refresh();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhyme_viewer::data::model::RawColumns;

    fn table() -> SignalTable {
        let mut raw = RawColumns::with_capacity(3);
        let key = FacetTuple::new(1, "ent", "_L", "normal");
        raw.push_row(0.0, key.clone(), [Some(1.0); 9]);
        raw.push_row(10.0, key, [Some(2.0); 9]);
        raw.push_row(0.0, FacetTuple::new(2, "ent", "_R", "fast"), [Some(3.0); 9]);
        SignalTable::from_columns(raw)
    }

    #[test]
    fn dataset_applies_default_selection() {
        let mut state = AppState::default();
        state.set_dataset(table(), None);

        let result = state.result.as_ref().unwrap();
        assert_eq!(result.x_ms, vec![0.0, 10.0]);
        let media = state.media.as_ref().unwrap();
        assert_eq!(media.path, "./co_rhymes_assets/vp1_Left001.mp4");
        assert!(!media.exists);
    }

    #[test]
    fn changing_a_facet_updates_series_and_media() {
        let mut state = AppState::default();
        state.set_dataset(table(), None);

        state.set_session(FacetTuple::new(2, "ent", "_R", "fast"));
        assert_eq!(state.result.as_ref().unwrap().len(), 1);
        assert_eq!(
            state.media.as_ref().unwrap().path,
            "./co_rhymes_assets/vp2_Right_fast001.mp4"
        );

        state.set_facet(Facet::Speaker, MetadataValue::Integer(1));
        assert!(state.result.as_ref().unwrap().is_empty());
    }

    #[test]
    fn failed_load_keeps_previous_dataset() {
        let mut state = AppState::default();
        state.set_dataset(table(), None);

        assert!(state.load_path(Path::new("does/not/exist.csv")).is_err());
        assert_eq!(state.dataset.as_ref().unwrap().len(), 3);
        assert_eq!(state.source_name(), None);
    }

    #[test]
    fn loaded_file_name_is_recorded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dash_ts.csv");
        std::fs::write(
            &path,
            "time_ms,speaker,rhyme_name,point_hand,speech_rate,env,env_att,f0,m_fing,m_wrist,m_elb,a_fing,a_wrist,a_elb\n\
             0,1,ent,_L,normal,0.1,0.1,0,1,1,1,0,0,0\n",
        )
        .unwrap();

        let mut state = AppState::default();
        state.load_path(&path).unwrap();
        assert_eq!(state.source_name().as_deref(), Some("dash_ts.csv"));
        assert_eq!(state.result.as_ref().unwrap().len(), 1);
    }
}
