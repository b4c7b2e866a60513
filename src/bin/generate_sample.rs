use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use dengue_viewer::synthetic::SeededNoise;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

/// Department, relative weight, provinces with their districts.
const GEOGRAPHY: &[(&str, f64, &[(&str, &[&str])])] = &[
    (
        "PIURA",
        5.0,
        &[
            ("PIURA", &["PIURA", "CASTILLA", "VEINTISEIS DE OCTUBRE"]),
            ("SULLANA", &["SULLANA", "BELLAVISTA", "MARCAVELICA"]),
            ("PAITA", &["PAITA", "COLAN"]),
        ],
    ),
    (
        "LAMBAYEQUE",
        3.5,
        &[
            ("CHICLAYO", &["CHICLAYO", "JOSE LEONARDO ORTIZ", "LA VICTORIA"]),
            ("LAMBAYEQUE", &["LAMBAYEQUE", "MOTUPE"]),
        ],
    ),
    (
        "LA LIBERTAD",
        2.5,
        &[
            ("TRUJILLO", &["TRUJILLO", "EL PORVENIR", "LA ESPERANZA"]),
            ("CHEPEN", &["CHEPEN", "PACANGA"]),
        ],
    ),
    (
        "LIMA",
        3.0,
        &[
            ("LIMA", &["SAN JUAN DE LURIGANCHO", "COMAS", "ATE", "PUENTE PIEDRA"]),
            ("HUAURA", &["HUACHO", "HUALMAY"]),
        ],
    ),
    (
        "ICA",
        2.0,
        &[
            ("ICA", &["ICA", "PARCONA", "LA TINGUIÑA"]),
            ("CHINCHA", &["CHINCHA ALTA", "PUEBLO NUEVO"]),
        ],
    ),
    (
        "TUMBES",
        1.5,
        &[
            ("TUMBES", &["TUMBES", "CORRALES"]),
            ("ZARUMILLA", &["ZARUMILLA", "AGUAS VERDES"]),
        ],
    ),
    (
        "LORETO",
        2.0,
        &[
            ("MAYNAS", &["IQUITOS", "BELEN", "PUNCHANA", "SAN JUAN BAUTISTA"]),
            ("ALTO AMAZONAS", &["YURIMAGUAS"]),
        ],
    ),
    (
        "SAN MARTIN",
        1.5,
        &[
            ("SAN MARTIN", &["TARAPOTO", "MORALES", "LA BANDA DE SHILCAYO"]),
            ("MOYOBAMBA", &["MOYOBAMBA"]),
        ],
    ),
    (
        "UCAYALI",
        1.2,
        &[("CORONEL PORTILLO", &["CALLERIA", "YARINACOCHA", "MANANTAY"])],
    ),
    (
        "CAJAMARCA",
        0.8,
        &[("JAEN", &["JAEN", "BELLAVISTA"]), ("SAN IGNACIO", &["SAN IGNACIO"])],
    ),
    (
        "JUNIN",
        0.6,
        &[("CHANCHAMAYO", &["CHANCHAMAYO", "PERENE"]), ("SATIPO", &["SATIPO"])],
    ),
    (
        "AYACUCHO",
        0.3,
        &[("LA MAR", &["SAN MIGUEL", "AYNA"])],
    ),
];

const AGE_GROUPS: [(&str, f64); 5] = [
    ("NIÑOS", 0.18),
    ("ADOLESCENTES", 0.15),
    ("JOVENES", 0.22),
    ("ADULTOS", 0.33),
    ("ADULTOS MAYORES", 0.12),
];

const YEARS: [(i64, usize); 3] = [(2022, 2500), (2023, 4500), (2024, 3500)];

fn index(rng: &mut SeededNoise, n: usize) -> usize {
    (rng.next_f64() * n as f64) as usize % n.max(1)
}

/// Index drawn proportionally to `weights`.
fn weighted(rng: &mut SeededNoise, weights: impl Iterator<Item = f64> + Clone) -> usize {
    let total: f64 = weights.clone().sum();
    let mut target = rng.next_f64() * total;
    let mut last = 0;
    for (i, w) in weights.enumerate() {
        if target < w {
            return i;
        }
        target -= w;
        last = i;
    }
    last
}

/// Seasonal curve peaking around week 14 (late summer rains).
fn week_weight(week: u32, year_shift: f64) -> f64 {
    let peak = 14.0 + year_shift;
    0.05 + (-(week as f64 - peak).powi(2) / (2.0 * 6.0f64.powi(2))).exp()
}

#[derive(Debug, Serialize)]
struct Case {
    ano: i64,
    semana: i64,
    departamento: &'static str,
    provincia: &'static str,
    distrito: &'static str,
    sexo: &'static str,
    tipo_edad: &'static str,
}

fn generate(rng: &mut SeededNoise) -> Vec<Case> {
    let mut cases = Vec::new();
    for (y, &(year, n)) in YEARS.iter().enumerate() {
        let shift = y as f64 * 2.0 - 2.0;
        let weeks: Vec<f64> = (1..=52).map(|w| week_weight(w, shift)).collect();

        for _ in 0..n {
            let d = weighted(rng, GEOGRAPHY.iter().map(|g| g.1));
            let (department, _, provinces) = GEOGRAPHY[d];
            let (province, districts) = provinces[index(rng, provinces.len())];
            let district = districts[index(rng, districts.len())];

            cases.push(Case {
                ano: year,
                semana: weighted(rng, weeks.iter().copied()) as i64 + 1,
                departamento: department,
                provincia: province,
                distrito: district,
                sexo: if rng.next_f64() < 0.52 { "F" } else { "M" },
                tipo_edad: AGE_GROUPS[weighted(rng, AGE_GROUPS.iter().map(|a| a.1))].0,
            });
        }
    }
    cases
}

fn write_csv(path: &str, cases: &[Case]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {path}"))?;
    for case in cases {
        writer.serialize(case)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &str, cases: &[Case]) -> Result<()> {
    let ints = |f: fn(&Case) -> i64| Int64Array::from(cases.iter().map(f).collect::<Vec<_>>());
    let strings =
        |f: fn(&Case) -> &'static str| StringArray::from(cases.iter().map(f).collect::<Vec<_>>());

    let schema = Arc::new(Schema::new(vec![
        Field::new("ano", DataType::Int64, false),
        Field::new("semana", DataType::Int64, false),
        Field::new("departamento", DataType::Utf8, false),
        Field::new("provincia", DataType::Utf8, false),
        Field::new("distrito", DataType::Utf8, false),
        Field::new("sexo", DataType::Utf8, false),
        Field::new("tipo_edad", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(ints(|c| c.ano)),
            Arc::new(ints(|c| c.semana)),
            Arc::new(strings(|c| c.departamento)),
            Arc::new(strings(|c| c.provincia)),
            Arc::new(strings(|c| c.distrito)),
            Arc::new(strings(|c| c.sexo)),
            Arc::new(strings(|c| c.tipo_edad)),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SeededNoise::new(42);
    let cases = generate(&mut rng);

    write_csv("datos_dengue.csv", &cases)?;
    write_parquet("datos_dengue.parquet", &cases)?;

    println!(
        "Wrote {} cases across {} departments to datos_dengue.csv and datos_dengue.parquet",
        cases.len(),
        GEOGRAPHY.len()
    );
    Ok(())
}
