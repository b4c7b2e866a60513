//! Illustrative indicators with no epidemiological basis.
//!
//! Every value here is drawn from a uniform distribution. The dashboard
//! labels them "synthetic"; nothing in the real aggregates depends on them.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::data::aggregate::RankedRegion;

// ---------------------------------------------------------------------------
// Noise sources
// ---------------------------------------------------------------------------

/// Source of uniform samples. Tests plug in fixed sequences.
pub trait NoiseSource {
    /// A sample in `[low, high)`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Deterministic PRNG (xoshiro256**).
#[derive(Debug, Clone)]
pub struct SeededNoise {
    state: [u64; 4],
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SeededNoise { state: s }
    }

    /// Seeded from the wall clock.
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos)
    }

    pub fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl NoiseSource for SeededNoise {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

// ---------------------------------------------------------------------------
// Headline indicators
// ---------------------------------------------------------------------------

/// Serotype reported as predominant.
pub const PREDOMINANT_SEROTYPE: &str = "DENV-2";

/// The synthetic metric cards.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlineIndicators {
    /// Transmission index R₀.
    pub transmission_index: f64,
    /// Share of cases attributed to [`PREDOMINANT_SEROTYPE`], percent.
    pub serotype_share: f64,
    /// Mean hospitalisation length in days.
    pub hospital_days: f64,
}

impl HeadlineIndicators {
    pub fn generate(noise: &mut impl NoiseSource) -> Self {
        Self {
            transmission_index: noise.uniform(1.2, 2.5),
            serotype_share: noise.uniform(45.0, 75.0),
            hospital_days: noise.uniform(4.0, 7.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Regional risk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskCategory {
    High,
    Medium,
    Low,
}

impl RiskCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            RiskCategory::High
        } else if score >= 50.0 {
            RiskCategory::Medium
        } else {
            RiskCategory::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskCategory::High => "HIGH",
            RiskCategory::Medium => "MEDIUM",
            RiskCategory::Low => "LOW",
        }
    }
}

/// Risk gauge for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionalRisk {
    pub region: String,
    /// Region count relative to the largest ranked count, 0..=1.
    pub base: f64,
    pub vector_factor: f64,
    pub climate_factor: f64,
    pub infrastructure_factor: f64,
    /// 0..=100, one decimal.
    pub score: f64,
    pub category: RiskCategory,
}

/// Score the given regions. Factor draws are made per region in order:
/// every vector factor, then every climate factor, then every
/// infrastructure factor.
pub fn regional_risk(regions: &[RankedRegion], noise: &mut impl NoiseSource) -> Vec<RegionalRisk> {
    let max = regions.iter().map(|r| r.count).max().unwrap_or(0);
    if max == 0 {
        return Vec::new();
    }

    let vector: Vec<f64> = regions.iter().map(|_| noise.uniform(0.7, 1.3)).collect();
    let climate: Vec<f64> = regions.iter().map(|_| noise.uniform(0.8, 1.2)).collect();
    let infra: Vec<f64> = regions.iter().map(|_| noise.uniform(0.6, 1.4)).collect();

    regions
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let base = r.count as f64 / max as f64;
            let raw = base * vector[i] * climate[i] * infra[i] * 100.0;
            let score = ((raw * 10.0).round() / 10.0).min(100.0);
            RegionalRisk {
                region: r.region.clone(),
                base,
                vector_factor: vector[i],
                climate_factor: climate[i],
                infrastructure_factor: infra[i],
                score,
                category: RiskCategory::from_score(score),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Outbreak factors
// ---------------------------------------------------------------------------

pub const OUTBREAK_FACTORS: [(&str, &str); 6] = [
    ("Temperature", "Thermal conditions favourable to the vector"),
    ("Rainfall", "Breeding sites formed by rain"),
    ("Overcrowding", "Population and housing density"),
    ("Water access", "Inadequate water storage"),
    ("Vector control", "Effectiveness of preventive measures"),
    ("Urbanization", "Unplanned urban expansion"),
];

/// Relative weight of each outbreak factor, in `OUTBREAK_FACTORS` order.
pub fn outbreak_factors(noise: &mut impl NoiseSource) -> Vec<(&'static str, f64)> {
    OUTBREAK_FACTORS
        .iter()
        .map(|&(name, _)| (name, noise.uniform(0.4, 0.9)))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Always returns the same fraction of the requested range.
    pub(crate) struct Midpoint(pub f64);

    impl NoiseSource for Midpoint {
        fn uniform(&mut self, low: f64, high: f64) -> f64 {
            low + (high - low) * self.0
        }
    }

    fn ranked(region: &str, count: usize) -> RankedRegion {
        RankedRegion {
            region: region.into(),
            count,
            share: 0.0,
        }
    }

    #[test]
    fn seeded_noise_is_reproducible_and_bounded() {
        let mut a = SeededNoise::new(42);
        let mut b = SeededNoise::new(42);
        for _ in 0..1000 {
            let x = a.uniform(1.2, 2.5);
            assert_eq!(x, b.uniform(1.2, 2.5));
            assert!((1.2..2.5).contains(&x));
        }
        assert_ne!(SeededNoise::new(7).next_u64(), SeededNoise::new(8).next_u64());
    }

    #[test]
    fn headline_uses_configured_ranges() {
        let low = HeadlineIndicators::generate(&mut Midpoint(0.0));
        assert_eq!(low.transmission_index, 1.2);
        assert_eq!(low.serotype_share, 45.0);
        assert_eq!(low.hospital_days, 4.0);
    }

    #[test]
    fn risk_scores_with_neutral_factors() {
        // Midpoint 0.5 makes every factor exactly 1.0.
        let regions = [ranked("LIMA", 200), ranked("PIURA", 120), ranked("ICA", 40)];
        let risk = regional_risk(&regions, &mut Midpoint(0.5));
        let scores: Vec<f64> = risk.iter().map(|r| r.score).collect();
        assert_eq!(scores, [100.0, 60.0, 20.0]);
        let cats: Vec<RiskCategory> = risk.iter().map(|r| r.category).collect();
        assert_eq!(cats, [RiskCategory::High, RiskCategory::Medium, RiskCategory::Low]);
    }

    #[test]
    fn risk_score_is_capped() {
        let risk = regional_risk(&[ranked("LIMA", 10)], &mut Midpoint(1.0));
        assert_eq!(risk[0].score, 100.0);
    }

    #[test]
    fn no_regions_no_risk() {
        assert!(regional_risk(&[], &mut SeededNoise::new(1)).is_empty());
    }

    #[test]
    fn outbreak_factor_names_follow_table() {
        let factors = outbreak_factors(&mut Midpoint(0.0));
        assert_eq!(factors.len(), OUTBREAK_FACTORS.len());
        assert_eq!(factors[0], ("Temperature", 0.4));
    }
}
