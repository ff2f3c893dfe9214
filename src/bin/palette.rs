use clap::Parser;
use std::fs;
use std::path::PathBuf;
use photobooth_palette::{
    Options, Palette, PhotoPalettes, Strategy, extract_palette_bytes, extract_palettes_bytes,
};
use anyhow::Context;
use anyhow::Result;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Extract color palettes from photos with agglomerative and k-means clustering.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors per palette
    #[arg(short = 'k', long = "colors", default_value_t = photobooth_palette::pipeline::DEFAULT_NUM_COLORS)]
    num_colors: usize,

    /// Target number of sampled pixels (agglomerative cost grows cubically with this)
    #[arg(short, long, default_value_t = photobooth_palette::pipeline::DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// Iteration budget for k-means
    #[arg(short, long, default_value_t = photobooth_palette::cluster::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Run only this strategy (both by default)
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Seed for k-means initialization, for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

/// What was extracted from one image.
enum Extracted {
    Both(PhotoPalettes),
    One(Strategy, Palette),
}

impl Extracted {
    fn palettes(&self) -> Vec<(Strategy, &Palette)> {
        match self {
            Extracted::Both(palettes) => [Strategy::Agglomerative, Strategy::KMeans]
                .into_iter()
                .map(|strategy| (strategy, palettes.get(strategy)))
                .collect(),
            Extracted::One(strategy, palette) => vec![(*strategy, palette)],
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum Report<'a> {
    Both {
        path: &'a str,
        #[serde(flatten)]
        palettes: &'a PhotoPalettes,
    },
    One {
        path: &'a str,
        strategy: Strategy,
        palette: &'a Palette,
    },
}

impl<'a> Report<'a> {
    fn new(path: &'a str, extracted: &'a Extracted) -> Self {
        match extracted {
            Extracted::Both(palettes) => Report::Both { path, palettes },
            Extracted::One(strategy, palette) => Report::One {
                path,
                strategy: *strategy,
                palette,
            },
        }
    }
}

fn print_palette(strategy: Strategy, palette: &Palette) {
    println!("  {strategy}:");
    for color in palette {
        let [r, g, b] = color.rgb;
        let tone = if color.is_light { "light" } else { "dark" };
        println!("    {}  rgb({r:>3}, {g:>3}, {b:>3})  {tone}", color.hex);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = Options {
        num_colors: args.num_colors,
        sample_size: args.sample_size,
        max_iterations: args.max_iterations,
    };
    let mut reports = Vec::new();
    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("cannot read {}", input.display()))?;
        tracing::info!("extracting palettes from {}", input.display());
        let extracted = match args.strategy {
            Some(strategy) => extract_palette_bytes(&bytes, strategy, &options, args.seed)
                .map(|palette| Extracted::One(strategy, palette)),
            None => extract_palettes_bytes(&bytes, &options, args.seed).map(Extracted::Both),
        }
        .with_context(|| format!("palette extraction failed for {}", input.display()))?;
        reports.push((input.display().to_string(), extracted));
    }

    if args.json {
        let reports: Vec<_> = reports
            .iter()
            .map(|(path, extracted)| Report::new(path, extracted))
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for (path, extracted) in &reports {
            println!("{path}");
            for (strategy, palette) in extracted.palettes() {
                print_palette(strategy, palette);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photobooth_palette::DEFAULT_PALETTE;

    #[test]
    fn single_strategy_report_carries_one_palette() {
        let palette = Palette::from_colors(&DEFAULT_PALETTE[..1]);
        let extracted = Extracted::One(Strategy::KMeans, palette);
        assert_eq!(extracted.palettes().len(), 1);

        let json = serde_json::to_value(Report::new("photo.png", &extracted)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "photo.png",
                "strategy": "k-means",
                "palette": [{ "rgb": [255, 255, 255], "hex": "#ffffff", "isLight": true }],
            })
        );
    }

    #[test]
    fn default_report_flattens_both_palettes() {
        let palette = Palette::fallback();
        let extracted = Extracted::Both(PhotoPalettes {
            agglomerative: palette.clone(),
            kmeans: palette,
        });
        assert_eq!(extracted.palettes().len(), 2);

        let json = serde_json::to_value(Report::new("photo.png", &extracted)).unwrap();
        assert!(json.get("agglomerative").is_some());
        assert!(json.get("kmeans").is_some());
        assert!(json.get("strategy").is_none());
    }
}
