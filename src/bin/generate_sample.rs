use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + std_dev * z
    }
}

const SAMPLE_MS: f64 = 10.0;

/// Columns in file order. Velocities are left out: the viewer derives them.
const COLUMNS: [&str; 14] = [
    "time_ms", "speaker", "rhyme_name", "point_hand", "speech_rate", "env", "env_att", "f0",
    "m_fing", "m_wrist", "m_elb", "a_fing", "a_wrist", "a_elb",
];

#[derive(Default)]
struct Rows {
    time_ms: Vec<f64>,
    speaker: Vec<i64>,
    rhyme_name: Vec<String>,
    point_hand: Vec<String>,
    speech_rate: Vec<String>,
    /// env, env_att, f0, m_fing, m_wrist, m_elb, a_fing, a_wrist, a_elb
    signals: [Vec<f64>; 9],
}

/// One session: pointing strokes at the beat rate, an envelope that peaks
/// slightly after each stroke and a pitch track that is 0 when unvoiced.
fn generate_session(
    rows: &mut Rows,
    rng: &mut SimpleRng,
    speaker: i64,
    rhyme: &str,
    hand: &str,
    rate: &str,
) {
    let (beat_hz, duration_ms) = if rate == "normal" { (2.0, 3000.0) } else { (3.2, 2000.0) };
    let amplitude = 40.0 + 5.0 * speaker as f64;
    let base_f0 = if speaker % 2 == 0 { 120.0 } else { 210.0 };
    let n = (duration_ms / SAMPLE_MS) as usize;

    for i in 0..n {
        let t = i as f64 * SAMPLE_MS;
        let phase = 2.0 * PI * beat_hz * t / 1000.0;

        let m = amplitude * (1.0 - phase.cos()) / 2.0;
        let a = amplitude * (2.0 * PI * beat_hz).powi(2) * phase.cos() / 2.0;
        let env = ((phase - 0.6).sin() * 0.5 + 0.3).max(0.0) + rng.gauss(0.0, 0.01).abs();
        let env_att = env * 0.8;
        let f0 = if env > 0.25 {
            base_f0 + 15.0 * (phase / 4.0).sin() + rng.gauss(0.0, 2.0)
        } else {
            0.0
        };

        let values = [
            env,
            env_att,
            f0,
            m + rng.gauss(0.0, 0.2),
            0.7 * m + rng.gauss(0.0, 0.2),
            0.4 * m + rng.gauss(0.0, 0.2),
            a + rng.gauss(0.0, 1.0),
            0.7 * a + rng.gauss(0.0, 1.0),
            0.4 * a + rng.gauss(0.0, 1.0),
        ];

        rows.time_ms.push(t);
        rows.speaker.push(speaker);
        rows.rhyme_name.push(rhyme.to_string());
        rows.point_hand.push(hand.to_string());
        rows.speech_rate.push(rate.to_string());
        for (column, v) in rows.signals.iter_mut().zip(values) {
            column.push(v);
        }
    }
}

fn write_csv(rows: &Rows, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    writer.write_record(COLUMNS)?;
    for i in 0..rows.time_ms.len() {
        let mut record = vec![
            rows.time_ms[i].to_string(),
            rows.speaker[i].to_string(),
            rows.rhyme_name[i].clone(),
            rows.point_hand[i].clone(),
            rows.speech_rate[i].clone(),
        ];
        record.extend(rows.signals.iter().map(|c| c[i].to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn record_batch(rows: &Rows) -> Result<RecordBatch> {
    let mut fields = vec![
        Field::new("time_ms", DataType::Float64, false),
        Field::new("speaker", DataType::Int64, false),
        Field::new("rhyme_name", DataType::Utf8, false),
        Field::new("point_hand", DataType::Utf8, false),
        Field::new("speech_rate", DataType::Utf8, false),
    ];
    fields.extend(
        COLUMNS[5..]
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false)),
    );

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Float64Array::from(rows.time_ms.clone())),
        Arc::new(Int64Array::from(rows.speaker.clone())),
        Arc::new(StringArray::from(rows.rhyme_name.clone())),
        Arc::new(StringArray::from(rows.point_hand.clone())),
        Arc::new(StringArray::from(rows.speech_rate.clone())),
    ];
    columns.extend(
        rows.signals
            .iter()
            .map(|c| Arc::new(Float64Array::from(c.clone())) as ArrayRef),
    );

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir).context("creating output directory")?;

    let mut rng = SimpleRng::new(42);
    let mut rows = Rows::default();

    let speakers = [1, 2, 3];
    let rhymes = ["ent", "ene", "entliczek"];
    let hands = ["_L", "_R"];
    let rates = ["normal", "fast"];

    let mut sessions = 0;
    for &speaker in &speakers {
        for rhyme in rhymes {
            for hand in hands {
                for rate in rates {
                    generate_session(&mut rows, &mut rng, speaker, rhyme, hand, rate);
                    sessions += 1;
                }
            }
        }
    }

    let csv_path = out_dir.join("rhyme_sample.csv");
    write_csv(&rows, &csv_path)?;

    let batch = record_batch(&rows)?;
    arrow::util::pretty::print_batches(&[batch.slice(0, 5usize.min(batch.num_rows()))])?;

    let parquet_path = out_dir.join("rhyme_sample.parquet");
    let file = std::fs::File::create(&parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!(
        "Wrote {} samples in {sessions} sessions to {} and {}",
        rows.time_ms.len(),
        csv_path.display(),
        parquet_path.display()
    );
    Ok(())
}
