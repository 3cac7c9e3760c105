use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use fault_detect::classifier::{DecisionTree, ModelArtifact};
use parquet::arrow::ArrowWriter;

const BASELINE: f64 = 100.0;
const LOW_SPLIT: f64 = 95.5;
const HIGH_SPLIT: f64 = 113.5;

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
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// One channel reading: mostly noise around the baseline, sometimes a
/// spike or a dip, occasionally a dropout.
fn reading(rng: &mut SimpleRng) -> Option<f64> {
    let roll = rng.next_f64();
    if roll < 0.02 {
        None
    } else if roll < 0.07 {
        Some(rng.gauss(BASELINE * 1.2, 2.0))
    } else if roll < 0.12 {
        Some(rng.gauss(BASELINE * 0.8, 2.0))
    } else {
        Some(rng.gauss(BASELINE, 2.5))
    }
}

/// Grow a tree that flags each channel outside (LOW_SPLIT, HIGH_SPLIT].
/// Leaf labels read as three decimal digits, `vp1` first (e.g. 101).
fn grow(tree: &mut DecisionTree, channel: usize, label: f64) -> i64 {
    let node = tree.value.len();
    if channel == 3 {
        push_node(tree, -1, -1, -2, -2.0, label);
        return node as i64;
    }
    let flag = 10f64.powi(2 - channel as i32);

    push_node(tree, -1, -1, channel as i64, LOW_SPLIT, 0.0);
    let low = grow(tree, channel + 1, label + flag);

    let upper = tree.value.len();
    push_node(tree, -1, -1, channel as i64, HIGH_SPLIT, 0.0);
    let normal = grow(tree, channel + 1, label);
    let high = grow(tree, channel + 1, label + flag);

    tree.children_left[node] = low;
    tree.children_right[node] = upper as i64;
    tree.children_left[upper] = normal;
    tree.children_right[upper] = high;
    node as i64
}

fn push_node(tree: &mut DecisionTree, left: i64, right: i64, feature: i64, threshold: f64, value: f64) {
    tree.children_left.push(left);
    tree.children_right.push(right);
    tree.feature.push(feature);
    tree.threshold.push(threshold);
    tree.value.push(value);
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let n_rows = 240;
    let mut time: Vec<i64> = Vec::with_capacity(n_rows);
    let mut channels: [Vec<Option<f64>>; 3] = Default::default();
    for i in 0..n_rows {
        time.push(i as i64);
        for col in &mut channels {
            col.push(reading(&mut rng));
        }
    }

    // ---- CSV ----
    let csv_path = "sample_sensors.csv";
    let mut writer = csv::Writer::from_path(csv_path).expect("Failed to create CSV file");
    writer
        .write_record(["time", "vp1", "vp2", "vp3"])
        .expect("Failed to write CSV header");
    for i in 0..n_rows {
        let cell = |v: Option<f64>| v.map(|x| format!("{x:.3}")).unwrap_or_default();
        writer
            .write_record([
                time[i].to_string(),
                cell(channels[0][i]),
                cell(channels[1][i]),
                cell(channels[2][i]),
            ])
            .expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV file");

    // ---- Parquet ----
    let schema = Arc::new(Schema::new(vec![
        Field::new("time", DataType::Int64, false),
        Field::new("vp1", DataType::Float64, true),
        Field::new("vp2", DataType::Float64, true),
        Field::new("vp3", DataType::Float64, true),
    ]));
    let [vp1, vp2, vp3] = channels;
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(time)),
            Arc::new(Float64Array::from(vp1)),
            Arc::new(Float64Array::from(vp2)),
            Arc::new(Float64Array::from(vp3)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let parquet_path = "sample_sensors.parquet";
    let file = std::fs::File::create(parquet_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    // ---- Model ----
    let mut tree = DecisionTree {
        children_left: Vec::new(),
        children_right: Vec::new(),
        feature: Vec::new(),
        threshold: Vec::new(),
        value: Vec::new(),
    };
    grow(&mut tree, 0, 0.0);
    let node_count = tree.value.len();
    let model = ModelArtifact::DecisionTree(tree);
    model.validate().expect("Generated tree is invalid");

    let model_path = "sample_model.json";
    let json = serde_json::to_string_pretty(&model).expect("Failed to serialize model");
    std::fs::write(model_path, json).expect("Failed to write model");

    println!("Wrote {n_rows} rows to {csv_path} and {parquet_path}");
    println!("Wrote {node_count}-node decision tree to {model_path}");
}
