use anyhow::{Context, Result};

/// Risk factors scored 1..=8, each leaning on the patient's hidden severity.
const RISK_FACTORS: [&str; 10] = [
    "Air Pollution",
    "Alcohol use",
    "Dust Allergy",
    "Genetic Risk",
    "chronic Lung Disease",
    "Obesity",
    "Smoking",
    "Passive Smoker",
    "Chest Pain",
    "Coughing of Blood",
];

const N_PATIENTS: usize = 1000;
const OUTPUT_PATH: &str = "lung_cancer_sample.csv";

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

/// Score in 1..=8 centred on `1 + 7 * severity`.
fn score(rng: &mut SimpleRng, severity: f64) -> i64 {
    rng.gauss(1.0 + 7.0 * severity, 1.3).round().clamp(1.0, 8.0) as i64
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let mut writer = csv::Writer::from_path(OUTPUT_PATH)
        .with_context(|| format!("creating {OUTPUT_PATH}"))?;

    let mut header = vec!["index", "Patient Id", "Age", "Gender"];
    header.extend(RISK_FACTORS);
    header.push("Level");
    writer.write_record(&header).context("writing header")?;

    let mut levels = [0usize; 3];
    for i in 0..N_PATIENTS {
        let severity = rng.next_f64();
        let age = rng.gauss(38.0 + 12.0 * severity, 12.0).round().clamp(14.0, 73.0) as i64;
        let gender = if rng.next_f64() < 0.6 { 1 } else { 2 };

        let scores: Vec<i64> = RISK_FACTORS
            .iter()
            .map(|_| score(&mut rng, severity))
            .collect();
        let mean_score = scores.iter().sum::<i64>() as f64 / scores.len() as f64;
        let level = match mean_score {
            m if m < 3.5 => 0,
            m if m < 5.5 => 1,
            _ => 2,
        };
        levels[level] += 1;

        let mut record = vec![
            i.to_string(),
            format!("P{}", i + 1),
            age.to_string(),
            gender.to_string(),
        ];
        record.extend(scores.iter().map(|s| s.to_string()));
        record.push(["Low", "Medium", "High"][level].to_string());
        writer
            .write_record(&record)
            .with_context(|| format!("writing patient {i}"))?;
    }
    writer.flush().context("flushing CSV")?;

    println!(
        "Wrote {N_PATIENTS} patients to {OUTPUT_PATH} (Low {}, Medium {}, High {})",
        levels[0], levels[1], levels[2]
    );
    Ok(())
}
