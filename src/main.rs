use clap::{Parser, Subcommand};
use lightbox::dom::NodeId;
use lightbox::fit::{Size, available_box, compute_fit};
use lightbox::page::Page;
use lightbox::slider::SliderEvent;
use lightbox::source::{GallerySource, load_gallery};
use lightbox::{config, output, view};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

/// Parse `WIDTHxHEIGHT`, e.g. `4000x3000`.
fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    Ok((w, h))
}

#[derive(Parser)]
#[command(name = "lightbox")]
#[command(about = "Gallery preview overlay: lazy slides and viewport auto-fit")]
#[command(long_about = "\
Gallery preview overlay: lazy slides and viewport auto-fit

A gallery is either a JSON file of entries or a directory of images:

  gallery.json
  [
    { \"imageUrl\": \"https://example.com/photos/a.jpg\", \"id\": 1001 },
    { \"imageUrl\": \"https://example.com/photos/b.jpg\", \"id\": 1002 }
  ]

  photos/            # every image under it, sorted by path, ids from 1
  ├── 001-dawn.jpg
  └── trip/002.png

Fit policy, with available = viewport - reserve:
  Oversized (either axis >= available): width/height attributes, aspect kept
  Undersized (both axes smaller):       scale() term of the transform

Run 'lightbox gen-config' to print a documented lightbox.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file means stock defaults)
    #[arg(long, default_value = "lightbox.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the fit decision for one image
    Fit {
        /// Natural size as WIDTHxHEIGHT
        #[arg(value_parser = parse_dimensions, required_unless_present = "image")]
        size: Option<(u32, u32)>,
        /// Read the natural size from an image file instead
        #[arg(long, conflicts_with = "size")]
        image: Option<PathBuf>,
        /// Viewport as WIDTHxHEIGHT (default from config)
        #[arg(long, value_parser = parse_dimensions)]
        viewport: Option<(u32, u32)>,
    },
    /// Open the preview on a gallery and print the resulting overlay
    Preview {
        /// Gallery JSON file or image directory
        #[arg(long)]
        gallery: PathBuf,
        /// Thumbnail to open (0-based)
        #[arg(long, default_value_t = 0)]
        open: usize,
        /// Advance the slider this many times after opening
        #[arg(long, default_value_t = 0)]
        next: usize,
        /// Click the backdrop at the end
        #[arg(long)]
        dismiss: bool,
        /// Viewport as WIDTHxHEIGHT (default from config)
        #[arg(long, value_parser = parse_dimensions)]
        viewport: Option<(u32, u32)>,
    },
    /// Write a standalone HTML page with the thumbnail strip
    Render {
        /// Gallery JSON file or image directory
        #[arg(long)]
        gallery: PathBuf,
        /// Output HTML file
        #[arg(long, default_value = "gallery.html")]
        output: PathBuf,
        /// Page title
        #[arg(long, default_value = "Gallery")]
        title: String,
    },
    /// Print a stock lightbox.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lightbox=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Fit {
            size,
            image,
            viewport,
        } => {
            let cfg = config::load_config(&cli.config)?;
            let (w, h) = match (size, image) {
                (_, Some(path)) => image::image_dimensions(&path)?,
                (Some(size), None) => size,
                (None, None) => return Err("an image size or --image is required".into()),
            };
            let natural = Size::new(w as f64, h as f64);
            let available = available_box(viewport_or(viewport, &cfg), cfg.insets());
            let decision = compute_fit(natural, available)?;
            output::print_fit(natural, available, &decision);
        }
        Command::Preview {
            gallery,
            open,
            next,
            dismiss,
            viewport,
        } => {
            let cfg = config::load_config(&cli.config)?;
            let source = load_gallery(&gallery)?;
            output::print_gallery(&source);
            println!();

            let mut page = Page::new(source.items.clone(), &cfg, viewport_or(viewport, &cfg))?;
            page.click_thumbnail(open)?;
            complete_known_loads(&mut page, &source)?;
            for _ in 0..next {
                let state = page.snapshot().state;
                let target = state.active_index + 1;
                if target >= source.items.len() {
                    tracing::warn!(index = target, "no next slide");
                    break;
                }
                page.slider_event(SliderEvent::IndexChange(target))?;
                complete_known_loads(&mut page, &source)?;
            }
            if dismiss {
                let backdrop = page.slider().portal().and_then(|portal| {
                    page.document().children(portal).first().copied()
                });
                page.click(backdrop)?;
            }

            let doc = page.document();
            println!("{}", doc.to_html(page.view().slider_mount()).into_string());
            println!();
            let outcomes = page.take_outcomes();
            output::print_session(&page.snapshot(), &outcomes);
        }
        Command::Render {
            gallery,
            output: out_path,
            title,
        } => {
            let cfg = config::load_config(&cli.config)?;
            let source = load_gallery(&gallery)?;
            let html = view::render_page(&title, &source.items, &cfg).into_string();
            if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&out_path, html)?;
            output::print_render_output(&out_path, source.items.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn viewport_or(viewport: Option<(u32, u32)>, cfg: &config::LightboxConfig) -> Size {
    match viewport {
        Some((w, h)) => Size::new(w as f64, h as f64),
        None => cfg.viewport_size(),
    }
}

/// Finish loading every mounted overlay image whose natural size is known.
/// Images with unknown sizes stay pending, as if still on the network.
fn complete_known_loads(
    page: &mut Page,
    source: &GallerySource,
) -> Result<(), Box<dyn std::error::Error>> {
    let pending: Vec<(NodeId, (u32, u32))> = page
        .overlay_images()
        .into_iter()
        .filter_map(|node| {
            let img = page.document().element(node)?.image()?;
            if img.complete {
                return None;
            }
            let ordinal = source.items.iter().position(|i| i.source_url == img.src)?;
            let size = source.natural_sizes.get(ordinal).copied().flatten()?;
            Some((node, size))
        })
        .collect();
    for (node, (w, h)) in pending {
        page.complete_image_load(node, w, h)?;
    }
    Ok(())
}
