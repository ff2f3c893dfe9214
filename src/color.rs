//! Numeric helpers shared by both clusterers.

use palette::Srgb;

/// An opaque 8-bit RGB sample.
pub type Pixel = Srgb<u8>;

/// Returned when sampling leaves nothing to cluster: white, black and three grays.
pub const DEFAULT_PALETTE: [Pixel; 5] = [
    Srgb::new(255, 255, 255),
    Srgb::new(0, 0, 0),
    Srgb::new(128, 128, 128),
    Srgb::new(200, 200, 200),
    Srgb::new(50, 50, 50),
];

/// Perceived brightness, `0.299R + 0.587G + 0.114B`.
#[inline]
pub fn luminance(color: Pixel) -> f64 {
    0.299 * color.red as f64 + 0.587 * color.green as f64 + 0.114 * color.blue as f64
}

/// Squared Euclidean distance in RGB. Exact, and orders pairs the same way
/// [`distance`] does.
#[inline]
pub fn distance_squared(a: Pixel, b: Pixel) -> u32 {
    let dr = a.red.abs_diff(b.red) as u32;
    let dg = a.green.abs_diff(b.green) as u32;
    let db = a.blue.abs_diff(b.blue) as u32;
    dr * dr + dg * dg + db * db
}

#[inline]
pub fn distance(a: Pixel, b: Pixel) -> f64 {
    (distance_squared(a, b) as f64).sqrt()
}

/// Running per-channel sum of a set of pixels.
///
/// Holds enough to produce the mean without keeping every member around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Accumulator {
    sum: [u64; 3],
    count: u64,
}

impl Accumulator {
    pub fn of(pixel: Pixel) -> Self {
        let mut acc = Self::default();
        acc.push(pixel);
        acc
    }

    pub fn push(&mut self, pixel: Pixel) {
        self.sum[0] += pixel.red as u64;
        self.sum[1] += pixel.green as u64;
        self.sum[2] += pixel.blue as u64;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &Accumulator) {
        for (a, b) in self.sum.iter_mut().zip(other.sum) {
            *a += b;
        }
        self.count += other.count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Component-wise mean rounded half up, or `None` for an empty set.
    pub fn mean(&self) -> Option<Pixel> {
        if self.count == 0 {
            return None;
        }
        // (2s + n) / 2n == floor(s/n + 1/2), all in integers.
        let [r, g, b] = self
            .sum
            .map(|s| ((2 * s + self.count) / (2 * self.count)) as u8);
        Some(Srgb::new(r, g, b))
    }
}

impl FromIterator<Pixel> for Accumulator {
    fn from_iter<I: IntoIterator<Item = Pixel>>(iter: I) -> Self {
        let mut acc = Self::default();
        for pixel in iter {
            acc.push(pixel);
        }
        acc
    }
}

/// Sorts brightest first. Stable, so equally bright colors keep their order.
pub fn sort_by_luminance(colors: &mut [Pixel]) {
    colors.sort_by(|a, b| luminance(*b).total_cmp(&luminance(*a)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_weights() {
        assert_eq!(luminance(Srgb::new(0, 0, 0)), 0.0);
        assert!((luminance(Srgb::new(255, 255, 255)) - 255.0).abs() < 1e-9);
        assert!((luminance(Srgb::new(100, 0, 0)) - 29.9).abs() < 1e-9);
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Srgb::new(0, 0, 0);
        let b = Srgb::new(3, 4, 0);
        assert_eq!(distance_squared(a, b), 25);
        assert_eq!(distance(a, b), 5.0);
        assert_eq!(distance_squared(b, a), 25);
        assert_eq!(distance_squared(Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)), 3 * 255 * 255);
    }

    #[test]
    fn mean_rounds_half_up() {
        let acc: Accumulator = [Srgb::new(1, 0, 10), Srgb::new(2, 1, 10)].into_iter().collect();
        // 1.5 -> 2, 0.5 -> 1, 10 -> 10
        assert_eq!(acc.mean(), Some(Srgb::new(2, 1, 10)));

        let acc: Accumulator = [Srgb::new(0, 0, 0), Srgb::new(0, 0, 0), Srgb::new(1, 2, 255)]
            .into_iter()
            .collect();
        // 0.33 -> 0, 0.67 -> 1, 85 -> 85
        assert_eq!(acc.mean(), Some(Srgb::new(0, 1, 85)));
    }

    #[test]
    fn empty_accumulator_has_no_mean() {
        assert_eq!(Accumulator::default().mean(), None);
        assert!(Accumulator::default().is_empty());
    }

    #[test]
    fn merge_matches_pushing_everything() {
        let left = [Srgb::new(10, 20, 30), Srgb::new(11, 21, 31)];
        let right = [Srgb::new(200, 100, 0)];

        let mut merged: Accumulator = left.into_iter().collect();
        merged.merge(&right.into_iter().collect());
        let all: Accumulator = left.into_iter().chain(right).collect();

        assert_eq!(merged, all);
        assert_eq!(merged.count(), 3);
    }

    #[test]
    fn sorts_brightest_first() {
        let mut colors = vec![Srgb::new(0, 0, 0), Srgb::new(255, 255, 255), Srgb::new(0, 255, 0)];
        sort_by_luminance(&mut colors);
        assert_eq!(
            colors,
            vec![Srgb::new(255, 255, 255), Srgb::new(0, 255, 0), Srgb::new(0, 0, 0)]
        );
    }
}
