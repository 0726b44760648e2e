use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use anomaly_detector::constants::columns;

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

/// (name, nominal value, spread)
const MEASUREMENTS: [(&str, f64, f64); 4] = [
    ("Warp Tensile Strength", 120.0, 4.0),
    ("Fill Tensile Strength", 95.0, 3.0),
    ("Fabric Weight", 210.0, 2.5),
    ("Air Permeability", 35.0, 1.5),
];

fn string_array(values: &[String]) -> StringArray {
    StringArray::from(values.iter().map(|s| s.as_str()).collect::<Vec<_>>())
}

fn main() {
    let mut rng = SimpleRng::new(42);

    let products = ["FAB-1001", "FAB-1002", "FAB-2040"];
    let operators = ["Alice", "Bob", "Carmen"];
    let sessions_per_product = 12;

    let mut items: Vec<String> = Vec::new();
    let mut tests: Vec<i64> = Vec::new();
    let mut names: Vec<String> = Vec::new();
    let mut responses: Vec<String> = Vec::new();
    let mut ops: Vec<String> = Vec::new();

    let mut test_number: i64 = 5000;
    let mut outliers = 0usize;
    for (p, product) in products.iter().enumerate() {
        // Each product runs a little heavier than the last.
        let offset = p as f64 * 1.5;

        for _ in 0..sessions_per_product {
            test_number += 1;
            let operator = operators[(rng.next_u64() % operators.len() as u64) as usize];

            for &(name, nominal, spread) in &MEASUREMENTS {
                let mut value = rng.gauss(nominal + offset, spread);
                if rng.next_f64() < 0.04 {
                    value += spread * if rng.next_f64() < 0.5 { -6.0 } else { 6.0 };
                    outliers += 1;
                }
                // A handful of unreadable instrument values.
                let response = if rng.next_f64() < 0.02 {
                    "N/A".to_string()
                } else {
                    format!("{value:.2}")
                };

                items.push(product.to_string());
                tests.push(test_number);
                names.push(name.to_string());
                responses.push(response);
                ops.push(operator.to_string());
            }

            // Per-session summary rows that are never offered for analysis.
            let summaries = [
                ("Ave Dim Stab Warp", format!("{:.2}", rng.gauss(1.2, 0.1))),
                ("Test Complete?", "Yes".to_string()),
            ];
            for (summary, response) in summaries {
                items.push(product.to_string());
                tests.push(test_number);
                names.push(summary.to_string());
                responses.push(response);
                ops.push(operator.to_string());
            }
        }
    }

    let row_count = items.len();

    let schema = Arc::new(Schema::new(vec![
        Field::new(columns::ITEM_NUMBER, DataType::Utf8, false),
        Field::new(columns::TEST_NUMBER, DataType::Int64, false),
        Field::new(columns::RESULT_NAME, DataType::Utf8, false),
        Field::new(columns::RESPONSE, DataType::Utf8, true),
        Field::new("OPERATOR", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(string_array(&items)),
            Arc::new(Int64Array::from(tests)),
            Arc::new(string_array(&names)),
            Arc::new(string_array(&responses)),
            Arc::new(string_array(&ops)),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_tests.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {row_count} rows ({} products, {} sessions, {outliers} injected outliers) to {output_path}",
        products.len(),
        products.len() * sessions_per_product
    );
}
