use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use super::derive;
use super::error::DataError;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a facet column
// ---------------------------------------------------------------------------

/// A dynamically-typed facet value mirroring common Pandas dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `MetadataValue` must be `Ord`.
///
/// Equality is type-sensitive: `Integer(1)` and `String("1")` are different
/// facet values. Floats compare by `total_cmp`, so `PartialEq`, `Ord` and
/// `Hash` agree: `NaN` equals itself and `0.0` differs from `-0.0`.
#[derive(Debug, Clone)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl PartialEq for MetadataValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Null => {}
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            // Pandas spelling: `1.0`, not `1`.
            MetadataValue::Float(v) if v.is_nan() => write!(f, "nan"),
            MetadataValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => write!(f, "{v:.1}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataValue::String(s) => serializer.serialize_str(s),
            MetadataValue::Integer(i) => serializer.serialize_i64(*i),
            MetadataValue::Float(v) => serializer.serialize_f64(*v),
            MetadataValue::Bool(b) => serializer.serialize_bool(*b),
            MetadataValue::Null => serializer.serialize_none(),
        }
    }
}

impl MetadataValue {
    /// Infer the type of a textual cell the way a CSV reader would:
    /// integer, then float, then bool, otherwise string. Empty is `Null`.
    pub fn infer(s: &str) -> Self {
        if s.is_empty() {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        if s == "true" || s == "false" {
            return MetadataValue::Bool(s == "true");
        }
        MetadataValue::String(s.to_string())
    }

    /// Borrow the text of a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(s: &str) -> Self {
        MetadataValue::String(s.to_string())
    }
}

impl From<i64> for MetadataValue {
    fn from(i: i64) -> Self {
        MetadataValue::Integer(i)
    }
}

impl From<i32> for MetadataValue {
    fn from(i: i32) -> Self {
        MetadataValue::Integer(i as i64)
    }
}

// ---------------------------------------------------------------------------
// Facets – the four categorical dimensions of a recording session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Facet {
    Speaker,
    RhymeName,
    PointHand,
    SpeechRate,
}

impl Facet {
    pub const ALL: [Facet; 4] = [
        Facet::Speaker,
        Facet::RhymeName,
        Facet::PointHand,
        Facet::SpeechRate,
    ];

    /// Column name in the source table.
    pub fn column_name(self) -> &'static str {
        match self {
            Facet::Speaker => "speaker",
            Facet::RhymeName => "rhyme_name",
            Facet::PointHand => "point_hand",
            Facet::SpeechRate => "speech_rate",
        }
    }

    /// Human readable label for selection controls.
    pub fn label(self) -> &'static str {
        match self {
            Facet::Speaker => "Speaker",
            Facet::RhymeName => "Rhyme name",
            Facet::PointHand => "Pointing hand",
            Facet::SpeechRate => "Speech rate",
        }
    }
}

/// The (speaker, rhyme, hand, rate) tuple identifying one session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FacetTuple {
    pub speaker: MetadataValue,
    pub rhyme_name: MetadataValue,
    pub point_hand: MetadataValue,
    pub speech_rate: MetadataValue,
}

impl FacetTuple {
    pub fn new(
        speaker: impl Into<MetadataValue>,
        rhyme_name: impl Into<MetadataValue>,
        point_hand: impl Into<MetadataValue>,
        speech_rate: impl Into<MetadataValue>,
    ) -> Self {
        Self {
            speaker: speaker.into(),
            rhyme_name: rhyme_name.into(),
            point_hand: point_hand.into(),
            speech_rate: speech_rate.into(),
        }
    }

    pub fn get(&self, facet: Facet) -> &MetadataValue {
        match facet {
            Facet::Speaker => &self.speaker,
            Facet::RhymeName => &self.rhyme_name,
            Facet::PointHand => &self.point_hand,
            Facet::SpeechRate => &self.speech_rate,
        }
    }

    pub fn set(&mut self, facet: Facet, value: MetadataValue) {
        match facet {
            Facet::Speaker => self.speaker = value,
            Facet::RhymeName => self.rhyme_name = value,
            Facet::PointHand => self.point_hand = value,
            Facet::SpeechRate => self.speech_rate = value,
        }
    }
}

impl fmt::Display for FacetTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "speaker={} rhyme={} hand={} rate={}",
            self.speaker, self.rhyme_name, self.point_hand, self.speech_rate
        )
    }
}

// ---------------------------------------------------------------------------
// Channels – numeric signal columns
// ---------------------------------------------------------------------------

/// Every numeric signal column of the table, raw and derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    Env,
    EnvAtt,
    F0,
    MFing,
    MWrist,
    MElb,
    AFing,
    AWrist,
    AElb,
    VFing,
    VWrist,
    VElb,
}

impl Channel {
    pub const ALL: [Channel; 12] = [
        Channel::Env,
        Channel::EnvAtt,
        Channel::F0,
        Channel::MFing,
        Channel::MWrist,
        Channel::MElb,
        Channel::AFing,
        Channel::AWrist,
        Channel::AElb,
        Channel::VFing,
        Channel::VWrist,
        Channel::VElb,
    ];

    /// Channels read from the source file. Velocities are never read.
    pub const RAW: [Channel; 9] = [
        Channel::Env,
        Channel::EnvAtt,
        Channel::F0,
        Channel::MFing,
        Channel::MWrist,
        Channel::MElb,
        Channel::AFing,
        Channel::AWrist,
        Channel::AElb,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Channel::Env => "env",
            Channel::EnvAtt => "env_att",
            Channel::F0 => "f0",
            Channel::MFing => "m_fing",
            Channel::MWrist => "m_wrist",
            Channel::MElb => "m_elb",
            Channel::AFing => "a_fing",
            Channel::AWrist => "a_wrist",
            Channel::AElb => "a_elb",
            Channel::VFing => "v_fing",
            Channel::VWrist => "v_wrist",
            Channel::VElb => "v_elb",
        }
    }
}

// ---------------------------------------------------------------------------
// Features – the closed sets a user can pick from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcousticFeature {
    Env,
    EnvAtt,
    F0,
}

impl AcousticFeature {
    pub const ALL: [AcousticFeature; 3] =
        [AcousticFeature::Env, AcousticFeature::EnvAtt, AcousticFeature::F0];

    pub fn channel(self) -> Channel {
        match self {
            AcousticFeature::Env => Channel::Env,
            AcousticFeature::EnvAtt => Channel::EnvAtt,
            AcousticFeature::F0 => Channel::F0,
        }
    }

    pub fn name(self) -> &'static str {
        self.channel().column_name()
    }
}

impl FromStr for AcousticFeature {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AcousticFeature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| DataError::UnknownFeature {
                kind: "acoustic",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for AcousticFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KinematicFeature {
    MFing,
    AFing,
    VFing,
    MWrist,
    AWrist,
    VWrist,
    MElb,
    AElb,
    VElb,
}

impl KinematicFeature {
    /// Ordered by tracked point, the way the dropdown lists them.
    pub const ALL: [KinematicFeature; 9] = [
        KinematicFeature::MFing,
        KinematicFeature::AFing,
        KinematicFeature::VFing,
        KinematicFeature::MWrist,
        KinematicFeature::AWrist,
        KinematicFeature::VWrist,
        KinematicFeature::MElb,
        KinematicFeature::AElb,
        KinematicFeature::VElb,
    ];

    pub fn channel(self) -> Channel {
        match self {
            KinematicFeature::MFing => Channel::MFing,
            KinematicFeature::AFing => Channel::AFing,
            KinematicFeature::VFing => Channel::VFing,
            KinematicFeature::MWrist => Channel::MWrist,
            KinematicFeature::AWrist => Channel::AWrist,
            KinematicFeature::VWrist => Channel::VWrist,
            KinematicFeature::MElb => Channel::MElb,
            KinematicFeature::AElb => Channel::AElb,
            KinematicFeature::VElb => Channel::VElb,
        }
    }

    pub fn name(self) -> &'static str {
        self.channel().column_name()
    }
}

impl FromStr for KinematicFeature {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KinematicFeature::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| DataError::UnknownFeature {
                kind: "kinematic",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for KinematicFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// RawColumns – what a loader produces
// ---------------------------------------------------------------------------

/// Column buffers filled row by row by the loaders, before derivation.
#[derive(Debug, Clone, Default)]
pub struct RawColumns {
    time_ms: Vec<f64>,
    facets: Vec<FacetTuple>,
    channels: BTreeMap<Channel, Vec<Option<f64>>>,
}

impl RawColumns {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            time_ms: Vec::with_capacity(rows),
            facets: Vec::with_capacity(rows),
            channels: Channel::RAW
                .into_iter()
                .map(|c| (c, Vec::with_capacity(rows)))
                .collect(),
        }
    }

    /// Append one sample. `values` follows the order of [`Channel::RAW`].
    pub fn push_row(&mut self, time_ms: f64, facets: FacetTuple, values: [Option<f64>; 9]) {
        self.time_ms.push(time_ms);
        self.facets.push(facets);
        for (channel, value) in Channel::RAW.into_iter().zip(values) {
            self.channels.entry(channel).or_default().push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.time_ms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_ms.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Session – rows sharing one facet tuple
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Session {
    pub key: FacetTuple,
    /// Row indices in file order.
    pub rows: Vec<usize>,
}

impl Session {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SignalTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full, immutable, column-oriented dataset with derived channels and
/// pre-computed session and facet indices.
#[derive(Debug, Clone)]
pub struct SignalTable {
    time_ms: Vec<f64>,
    channels: BTreeMap<Channel, Vec<Option<f64>>>,
    /// Sessions in order of first appearance.
    sessions: Vec<Session>,
    session_lookup: BTreeMap<FacetTuple, usize>,
    /// For each facet the sorted set of distinct values.
    unique_values: BTreeMap<Facet, BTreeSet<MetadataValue>>,
}

impl SignalTable {
    /// Index sessions, derive velocity channels and build facet enumerations.
    pub fn from_columns(raw: RawColumns) -> Self {
        let RawColumns {
            time_ms,
            facets,
            mut channels,
        } = raw;

        let mut sessions: Vec<Session> = Vec::new();
        let mut session_lookup: BTreeMap<FacetTuple, usize> = BTreeMap::new();
        let mut unique_values: BTreeMap<Facet, BTreeSet<MetadataValue>> =
            Facet::ALL.into_iter().map(|f| (f, BTreeSet::new())).collect();

        for (row, key) in facets.into_iter().enumerate() {
            if let Some(&id) = session_lookup.get(&key) {
                sessions[id].rows.push(row);
                continue;
            }
            for facet in Facet::ALL {
                unique_values
                    .entry(facet)
                    .or_default()
                    .insert(key.get(facet).clone());
            }
            session_lookup.insert(key.clone(), sessions.len());
            sessions.push(Session {
                key,
                rows: vec![row],
            });
        }

        for session in &sessions {
            let out_of_order = session
                .rows
                .windows(2)
                .any(|w| time_ms[w[1]] < time_ms[w[0]]);
            if out_of_order {
                log::warn!("Session {} has decreasing time_ms values", session.key);
            }
        }

        derive::derive_velocities(&sessions, &mut channels, time_ms.len());

        SignalTable {
            time_ms,
            channels,
            sessions,
            session_lookup,
            unique_values,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.time_ms.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.time_ms.is_empty()
    }

    pub fn time_ms(&self) -> &[f64] {
        &self.time_ms
    }

    /// All values of one channel, aligned with [`SignalTable::time_ms`].
    pub fn column(&self, channel: Channel) -> &[Option<f64>] {
        self.channels
            .get(&channel)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Exact, type-sensitive lookup of a session.
    pub fn session(&self, key: &FacetTuple) -> Option<&Session> {
        self.session_lookup.get(key).map(|&id| &self.sessions[id])
    }

    /// Distinct values of a facet, sorted.
    pub fn facet_values(&self, facet: Facet) -> &BTreeSet<MetadataValue> {
        static EMPTY: BTreeSet<MetadataValue> = BTreeSet::new();
        self.unique_values.get(&facet).unwrap_or(&EMPTY)
    }

    /// Check that every value of `key` appears in the facet enumerations.
    pub fn validate(&self, key: &FacetTuple) -> Result<(), DataError> {
        for facet in Facet::ALL {
            let value = key.get(facet);
            if !self.facet_values(facet).contains(value) {
                return Err(DataError::UnknownFacetValue {
                    facet: facet.column_name(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(table: &mut RawColumns, t: f64, speaker: i64, hand: &str, m_fing: f64) {
        let key = FacetTuple::new(speaker, "ent", hand, "normal");
        let mut values = [Some(0.0); 9];
        values[3] = Some(m_fing);
        table.push_row(t, key, values);
    }

    #[test]
    fn infer_follows_csv_typing() {
        assert_eq!(MetadataValue::infer("1"), MetadataValue::Integer(1));
        assert_eq!(MetadataValue::infer("1.5"), MetadataValue::Float(1.5));
        assert_eq!(MetadataValue::infer("true"), MetadataValue::Bool(true));
        assert_eq!(MetadataValue::infer("_L"), MetadataValue::from("_L"));
        assert_eq!(MetadataValue::infer(""), MetadataValue::Null);
    }

    #[test]
    fn facet_equality_is_type_sensitive() {
        assert_ne!(MetadataValue::Integer(1), MetadataValue::from("1"));
        assert_ne!(MetadataValue::from("Normal"), MetadataValue::from("normal"));
    }

    #[test]
    fn float_equality_agrees_with_hash_and_order() {
        use std::collections::HashSet;

        let nan = MetadataValue::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        assert_ne!(MetadataValue::Float(0.0), MetadataValue::Float(-0.0));

        let set: HashSet<MetadataValue> = [
            MetadataValue::Float(0.0),
            MetadataValue::Float(-0.0),
            nan.clone(),
            nan,
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn floats_display_like_pandas() {
        assert_eq!(MetadataValue::Float(1.0).to_string(), "1.0");
        assert_eq!(MetadataValue::Float(2.5).to_string(), "2.5");
        assert_eq!(MetadataValue::Float(f64::NAN).to_string(), "nan");
        assert_eq!(MetadataValue::Integer(1).to_string(), "1");
    }

    #[test]
    fn feature_ids_parse_from_column_names() {
        assert_eq!("f0".parse::<AcousticFeature>().unwrap(), AcousticFeature::F0);
        assert_eq!(
            "v_wrist".parse::<KinematicFeature>().unwrap(),
            KinematicFeature::VWrist
        );
        assert!("m_fing".parse::<AcousticFeature>().is_err());
        assert!("pitch".parse::<KinematicFeature>().is_err());
    }

    #[test]
    fn feature_serde_names_match_columns() {
        for f in KinematicFeature::ALL {
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.name()));
        }
        for f in AcousticFeature::ALL {
            let json = serde_json::to_string(&f).unwrap();
            assert_eq!(json, format!("\"{}\"", f.name()));
        }
    }

    #[test]
    fn sessions_and_enumerations_are_built_once() {
        let mut raw = RawColumns::with_capacity(4);
        row(&mut raw, 0.0, 1, "_L", 1.0);
        row(&mut raw, 0.0, 2, "_R", 5.0);
        row(&mut raw, 10.0, 1, "_L", 2.0);
        row(&mut raw, 10.0, 2, "_R", 7.0);
        let table = SignalTable::from_columns(raw);

        assert_eq!(table.len(), 4);
        assert_eq!(table.sessions().len(), 2);
        let key = FacetTuple::new(1, "ent", "_L", "normal");
        assert_eq!(table.session(&key).unwrap().rows, vec![0, 2]);

        let speakers: Vec<_> = table.facet_values(Facet::Speaker).iter().cloned().collect();
        assert_eq!(speakers, vec![MetadataValue::Integer(1), MetadataValue::Integer(2)]);
        assert_eq!(table.column(Channel::VFing).len(), 4);
    }

    #[test]
    fn validate_rejects_values_outside_enumeration() {
        let mut raw = RawColumns::with_capacity(1);
        row(&mut raw, 0.0, 1, "_L", 1.0);
        let table = SignalTable::from_columns(raw);

        assert!(table.validate(&FacetTuple::new(1, "ent", "_L", "normal")).is_ok());
        let err = table
            .validate(&FacetTuple::new("1", "ent", "_L", "normal"))
            .unwrap_err();
        assert!(matches!(err, DataError::UnknownFacetValue { facet: "speaker", .. }));
    }
}
