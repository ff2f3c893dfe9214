//! Photo-to-palette pipeline: validate, sample, cluster, format.

use std::{fmt, ops::Deref, str::FromStr};

use image::RgbaImage;
use rand::Rng;
use serde::Serialize;

use crate::{
    cluster::{agglomerative, kmeans},
    color::{DEFAULT_PALETTE, Pixel},
    error::Error,
    format::PaletteColor,
    sampler::{self, CHANNELS},
};

pub const DEFAULT_NUM_COLORS: usize = 5;
/// Pixels sampled per photo. Agglomerative cost grows cubically with this.
pub const DEFAULT_SAMPLE_SIZE: usize = 1500;
/// Page background shown while no palette is being cycled.
pub const DEFAULT_BACKGROUND: &str = "#faf5e6";

/// Which clusterer reduces the sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "native-bin", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    Agglomerative,
    KMeans,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Agglomerative => "agglomerative",
            Strategy::KMeans => "k-means",
        })
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "agglomerative" => Ok(Strategy::Agglomerative),
            "kmeans" | "k-means" => Ok(Strategy::KMeans),
            other => Err(format!("unknown clustering strategy `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
    /// Colors per palette. Agglomerative clustering may return fewer.
    pub num_colors: usize,
    /// Target number of sampled pixels.
    pub sample_size: usize,
    /// Iteration budget for k-means.
    pub max_iterations: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            num_colors: DEFAULT_NUM_COLORS,
            sample_size: DEFAULT_SAMPLE_SIZE,
            max_iterations: kmeans::DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// An ordered, brightest-first list of display-ready colors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Palette(Vec<PaletteColor>);

impl Palette {
    pub fn from_colors(colors: &[Pixel]) -> Self {
        Self(crate::format::format(colors))
    }

    /// White, black and three grays, for photos with nothing opaque to sample.
    pub fn fallback() -> Self {
        Self::from_colors(&DEFAULT_PALETTE)
    }

    pub fn colors(&self) -> &[PaletteColor] {
        &self.0
    }

    pub fn hexes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.hex.as_str())
    }

    pub fn background_cycle(&self) -> BackgroundCycle<'_> {
        BackgroundCycle::new(self)
    }
}

impl Deref for Palette {
    type Target = [PaletteColor];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = &'a PaletteColor;
    type IntoIter = std::slice::Iter<'a, PaletteColor>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Palette> for Vec<PaletteColor> {
    fn from(palette: Palette) -> Self {
        palette.0
    }
}

/// Both palettes for one photo, so a viewer can switch without reclustering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PhotoPalettes {
    pub agglomerative: Palette,
    pub kmeans: Palette,
}

impl PhotoPalettes {
    pub fn get(&self, strategy: Strategy) -> &Palette {
        match strategy {
            Strategy::Agglomerative => &self.agglomerative,
            Strategy::KMeans => &self.kmeans,
        }
    }
}

/// Steps through a palette's colors for the hover background effect.
#[derive(Clone, Debug)]
pub struct BackgroundCycle<'a> {
    palette: &'a Palette,
    index: usize,
}

impl<'a> BackgroundCycle<'a> {
    pub fn new(palette: &'a Palette) -> Self {
        Self { palette, index: 0 }
    }

    /// Current background, or [`DEFAULT_BACKGROUND`] for an empty palette.
    pub fn current(&self) -> &'a str {
        self.palette
            .get(self.index)
            .map_or(DEFAULT_BACKGROUND, |c| c.hex.as_str())
    }

    /// Moves to the next color, wrapping after the last one.
    pub fn advance(&mut self) -> &'a str {
        if !self.palette.is_empty() {
            self.index = (self.index + 1) % self.palette.len();
        }
        self.current()
    }

    pub fn position(&self) -> usize {
        self.index
    }
}

/// Rejects buffers that cannot be a `width` x `height` RGBA image.
pub fn validate(pixels: &[u8], width: u32, height: u32) -> Result<(), Error> {
    if width == 0 || height == 0 {
        return Err(Error::EmptyImage { width, height });
    }
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(CHANNELS);
    if pixels.len() != expected {
        return Err(Error::BufferSize {
            expected,
            got: pixels.len(),
        });
    }
    Ok(())
}

/// Clusters an existing sample. An empty sample yields [`Palette::fallback`].
pub fn cluster_samples<R: Rng + ?Sized>(
    samples: &[Pixel],
    strategy: Strategy,
    options: &Options,
    rng: &mut R,
) -> Palette {
    if samples.is_empty() {
        tracing::debug!("no opaque pixels sampled, using the fallback palette");
        return Palette::fallback();
    }
    let colors = match strategy {
        Strategy::Agglomerative => agglomerative::cluster(samples, options.num_colors),
        Strategy::KMeans => {
            kmeans::cluster_with(samples, options.num_colors, options.max_iterations, rng)
        }
    };
    Palette::from_colors(&colors)
}

/// Extracts one palette from raw RGBA memory.
pub fn extract(
    pixels: &[u8],
    width: u32,
    height: u32,
    strategy: Strategy,
    options: &Options,
) -> Result<Palette, Error> {
    extract_with(pixels, width, height, strategy, options, &mut rand::rng())
}

pub fn extract_with<R: Rng + ?Sized>(
    pixels: &[u8],
    width: u32,
    height: u32,
    strategy: Strategy,
    options: &Options,
    rng: &mut R,
) -> Result<Palette, Error> {
    validate(pixels, width, height)?;
    let samples = sampler::sample(pixels, width, height, options.sample_size);
    Ok(cluster_samples(&samples, strategy, options, rng))
}

/// Samples once and runs both clusterers on that sample.
pub fn extract_both(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: &Options,
) -> Result<PhotoPalettes, Error> {
    extract_both_with(pixels, width, height, options, &mut rand::rng())
}

pub fn extract_both_with<R: Rng + ?Sized>(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: &Options,
    rng: &mut R,
) -> Result<PhotoPalettes, Error> {
    validate(pixels, width, height)?;
    let samples = sampler::sample(pixels, width, height, options.sample_size);
    Ok(PhotoPalettes {
        agglomerative: cluster_samples(&samples, Strategy::Agglomerative, options, rng),
        kmeans: cluster_samples(&samples, Strategy::KMeans, options, rng),
    })
}

/// [`extract_both_with`] for a decoded image.
pub fn extract_image_with<R: Rng + ?Sized>(
    image: &RgbaImage,
    options: &Options,
    rng: &mut R,
) -> Result<PhotoPalettes, Error> {
    extract_both_with(image.as_raw(), image.width(), image.height(), options, rng)
}

/// Decodes an uploaded image (PNG, JPEG, ...) and extracts both palettes.
pub fn extract_encoded_with<R: Rng + ?Sized>(
    input: &[u8],
    options: &Options,
    rng: &mut R,
) -> Result<PhotoPalettes, Error> {
    let image = image::load_from_memory(input)?.to_rgba8();
    extract_image_with(&image, options, rng)
}

/// Decodes an uploaded image and runs only the given strategy.
pub fn extract_encoded_one_with<R: Rng + ?Sized>(
    input: &[u8],
    strategy: Strategy,
    options: &Options,
    rng: &mut R,
) -> Result<Palette, Error> {
    let image = image::load_from_memory(input)?.to_rgba8();
    extract_with(image.as_raw(), image.width(), image.height(), strategy, options, rng)
}
