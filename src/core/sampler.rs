use rand::Rng;

use super::Distribution;

/// Inverse-CDF sampler over a [`Distribution`].
#[derive(Debug, Clone)]
pub struct Sampler<'a> {
    distribution: &'a Distribution,
}

impl<'a> Sampler<'a> {
    pub fn new(distribution: &'a Distribution) -> Self {
        Self { distribution }
    }

    /// Maps a uniform draw in `[0, 1)` to the first outcome whose running
    /// cumulative probability exceeds it. Falls back to the last outcome when
    /// rounding leaves the total short of the draw.
    pub fn sample_with_draw(&self, draw: f64) -> f64 {
        let mut cumulative = 0.0;
        for (outcome, probability) in self.distribution.iter() {
            cumulative += probability;
            if draw < cumulative {
                return outcome;
            }
        }
        self.distribution.outcomes()[self.distribution.len() - 1]
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.sample_with_draw(rng.r#gen::<f64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::OUTCOMES;
    use proptest::prelude::{prop_assert, proptest};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn four_point() -> Distribution {
        Distribution::new(OUTCOMES.to_vec(), vec![0.4, 0.2, 0.35, 0.05]).expect("valid")
    }

    #[test]
    fn draw_selects_interval_containing_it() {
        let dist = four_point();
        let sampler = Sampler::new(&dist);
        assert_eq!(sampler.sample_with_draw(0.0), -1.0);
        assert_eq!(sampler.sample_with_draw(0.39), -1.0);
        assert_eq!(sampler.sample_with_draw(0.45), 0.0);
        assert_eq!(sampler.sample_with_draw(0.7), 1.0);
        assert_eq!(sampler.sample_with_draw(0.99), 2.0);
    }

    #[test]
    fn boundary_draw_goes_to_next_outcome() {
        let dist = Distribution::new(vec![10.0, 20.0], vec![0.5, 0.5]).expect("valid");
        let sampler = Sampler::new(&dist);
        assert_eq!(sampler.sample_with_draw(0.5), 20.0);
    }

    #[test]
    fn short_cumulative_sum_falls_back_to_last_outcome() {
        let dist = Distribution::new(vec![1.0, 2.0, 3.0], vec![0.3, 0.3, 0.3995]).expect("valid");
        let sampler = Sampler::new(&dist);
        assert_eq!(sampler.sample_with_draw(0.9999), 3.0);
    }

    #[test]
    fn zero_mass_outcomes_are_never_drawn() {
        let dist = Distribution::new(OUTCOMES.to_vec(), vec![0.5, 0.0, 0.5, 0.0]).expect("valid");
        let sampler = Sampler::new(&dist);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..2_000 {
            let x = sampler.sample(&mut rng);
            assert!(x == -1.0 || x == 1.0, "drew {x}");
        }
    }

    #[test]
    fn sample_frequencies_track_probabilities() {
        let dist = four_point();
        let sampler = Sampler::new(&dist);
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 40_000;
        let minus_ones = (0..draws)
            .filter(|_| sampler.sample(&mut rng) == -1.0)
            .count();
        let freq = minus_ones as f64 / draws as f64;
        assert!((freq - 0.4).abs() < 0.02, "frequency {freq}");
    }

    proptest! {
        #[test]
        fn prop_sampled_value_is_an_outcome(draw in 0.0f64..1.0) {
            let dist = four_point();
            let x = Sampler::new(&dist).sample_with_draw(draw);
            prop_assert!(OUTCOMES.contains(&x));
        }
    }
}
