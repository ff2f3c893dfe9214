use wasm_bindgen::prelude::*;
use js_sys::{Array, Object, Reflect};
#[cfg(all(feature = "native-bin", not(target_arch = "wasm32")))]
use anyhow::{Context, Result};

pub mod cluster;
pub mod color;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod sampler;

pub use color::{DEFAULT_PALETTE, Pixel, luminance};
pub use error::Error;
pub use format::{PaletteColor, hex_of, is_light, parse_hex};
pub use pipeline::{
    BackgroundCycle, Options, Palette, PhotoPalettes, Strategy, extract, extract_both,
    extract_both_with, extract_with,
};
pub use sampler::{sample, sample_image};

// ------------------------------------------------------------
// JS conversion helpers
// ------------------------------------------------------------

fn to_js_error(err: Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn options_from(
    num_colors: Option<usize>,
    sample_size: Option<usize>,
    max_iterations: Option<usize>,
) -> Options {
    let defaults = Options::default();
    Options {
        num_colors: num_colors.unwrap_or(defaults.num_colors),
        sample_size: sample_size.unwrap_or(defaults.sample_size),
        max_iterations: max_iterations.unwrap_or(defaults.max_iterations),
    }
}

/// `{ rgb: [r, g, b], hex, isLight }` for every color, in palette order.
fn palette_to_js<'a>(colors: impl IntoIterator<Item = &'a PaletteColor>) -> Result<Array, JsValue> {
    let out = Array::new();
    for color in colors {
        let rgb = Array::new();
        for channel in color.rgb {
            rgb.push(&JsValue::from(channel));
        }

        let entry = Object::new();
        Reflect::set(&entry, &JsValue::from_str("rgb"), &rgb)?;
        Reflect::set(&entry, &JsValue::from_str("hex"), &JsValue::from_str(&color.hex))?;
        Reflect::set(&entry, &JsValue::from_str("isLight"), &JsValue::from_bool(color.is_light))?;
        out.push(&entry);
    }
    Ok(out)
}

fn palettes_to_js(palettes: &PhotoPalettes) -> Result<Object, JsValue> {
    let agglomerative = palette_to_js(&palettes.agglomerative)?;
    let kmeans = palette_to_js(&palettes.kmeans)?;

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("agglomerative"), &agglomerative)?;
    Reflect::set(&result, &JsValue::from_str("kmeans"), &kmeans)?;
    Ok(result)
}

// ------------------------------------------------------------
// WASM entry points
// ------------------------------------------------------------

/// Extract both palettes from raw RGBA pixel memory (e.g. `ImageData.data`).
///
/// Returns `{ agglomerative, kmeans }`, each an array of
/// `{ rgb, hex, isLight }` sorted brightest first. Both palettes come from
/// the same pixel sample so the caller can switch between them freely.
#[wasm_bindgen]
pub fn extract_palettes(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    num_colors: Option<usize>,
    sample_size: Option<usize>,
    max_iterations: Option<usize>,
) -> Result<Object, JsValue> {
    let options = options_from(num_colors, sample_size, max_iterations);
    let palettes = extract_both(&pixels, width, height, &options).map_err(to_js_error)?;
    palettes_to_js(&palettes)
}

/// Extract a single palette with the named strategy (`"agglomerative"` or
/// `"kmeans"`).
#[wasm_bindgen]
pub fn extract_palette(
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    strategy: &str,
    num_colors: Option<usize>,
    sample_size: Option<usize>,
    max_iterations: Option<usize>,
) -> Result<Array, JsValue> {
    let strategy: Strategy = strategy.parse().map_err(|e: String| JsValue::from_str(&e))?;
    let options = options_from(num_colors, sample_size, max_iterations);
    let palette = extract(&pixels, width, height, strategy, &options).map_err(to_js_error)?;
    palette_to_js(&palette)
}

/// Same as [`extract_palettes`] for an encoded upload (PNG, JPEG, ...).
#[wasm_bindgen]
pub fn extract_palettes_from_image(
    input: Vec<u8>,
    num_colors: Option<usize>,
    sample_size: Option<usize>,
    max_iterations: Option<usize>,
) -> Result<Object, JsValue> {
    let options = options_from(num_colors, sample_size, max_iterations);
    let palettes = pipeline::extract_encoded_with(&input, &options, &mut rand::rng())
        .map_err(to_js_error)?;
    palettes_to_js(&palettes)
}

/// Format `[[r, g, b], ...]` into display entries. Channels are clamped to
/// 0-255 and rounded; order is preserved.
#[wasm_bindgen]
pub fn format_palette(colors: Array) -> Result<Array, JsValue> {
    let mut formatted = Vec::with_capacity(colors.length() as usize);
    for value in colors.iter() {
        if !Array::is_array(&value) {
            return Err(JsValue::from_str("Palette entries must be [r, g, b] arrays"));
        }
        let triple = Array::from(&value);
        if triple.length() != 3 {
            return Err(JsValue::from_str("Palette entries must have exactly 3 channels"));
        }
        let channel = |i: u32| {
            triple
                .get(i)
                .as_f64()
                .ok_or_else(|| JsValue::from_str("Color channels must be numbers"))
        };
        formatted.push(PaletteColor::from_channels(channel(0)?, channel(1)?, channel(2)?));
    }
    palette_to_js(&formatted)
}

// ------------------------------------------------------------
// Native helpers
// ------------------------------------------------------------

#[cfg(all(feature = "native-bin", not(target_arch = "wasm32")))]
fn seeded_rng(seed: Option<u64>) -> Box<dyn rand::RngCore> {
    use rand::{SeedableRng, rngs::StdRng};

    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::rng()),
    }
}

/// Decode an image file's bytes and extract both palettes.
///
/// A `seed` makes the k-means palette reproducible; without one it draws
/// from thread entropy.
#[cfg(all(feature = "native-bin", not(target_arch = "wasm32")))]
pub fn extract_palettes_bytes(
    input: &[u8],
    options: &Options,
    seed: Option<u64>,
) -> Result<PhotoPalettes> {
    let mut rng = seeded_rng(seed);
    let palettes = pipeline::extract_encoded_with(input, options, &mut *rng)
        .context("palette extraction failed")?;
    Ok(palettes)
}

/// Decode an image file's bytes and run only `strategy`.
#[cfg(all(feature = "native-bin", not(target_arch = "wasm32")))]
pub fn extract_palette_bytes(
    input: &[u8],
    strategy: Strategy,
    options: &Options,
    seed: Option<u64>,
) -> Result<Palette> {
    let mut rng = seeded_rng(seed);
    let palette = pipeline::extract_encoded_one_with(input, strategy, options, &mut *rng)
        .with_context(|| format!("{strategy} palette extraction failed"))?;
    Ok(palette)
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use wasm_bindgen_test::wasm_bindgen_test;

    use super::*;

    #[wasm_bindgen_test]
    fn format_palette_clamps_and_rounds() {
        let colors = Array::new();
        let triple = Array::new();
        for channel in [300.0, -4.0, 127.6] {
            triple.push(&JsValue::from_f64(channel));
        }
        colors.push(&triple);

        let formatted = format_palette(colors).unwrap();
        assert_eq!(formatted.length(), 1);
        let entry = formatted.get(0);
        let hex = Reflect::get(&entry, &JsValue::from_str("hex")).unwrap();
        assert_eq!(hex.as_string().as_deref(), Some("#ff0080"));
        let is_light = Reflect::get(&entry, &JsValue::from_str("isLight")).unwrap();
        assert_eq!(is_light.as_bool(), Some(false));
    }

    #[wasm_bindgen_test]
    fn extract_palettes_returns_both_arrays() {
        let pixels = [200u8, 200, 200, 255].repeat(4);
        let result = extract_palettes(pixels, 2, 2, Some(1), None, None).unwrap();
        for key in ["agglomerative", "kmeans"] {
            let palette = Reflect::get(&result, &JsValue::from_str(key)).unwrap();
            assert!(Array::is_array(&palette));
            assert_eq!(Array::from(&palette).length(), 1);
        }
    }

    #[wasm_bindgen_test]
    fn format_palette_rejects_short_entries() {
        let colors = Array::new();
        colors.push(&Array::of2(&JsValue::from_f64(1.0), &JsValue::from_f64(2.0)));
        assert!(format_palette(colors).is_err());
    }
}
