use clap::{Parser, Subcommand};
use pythonz::fetch::{Fetcher, IntegrationEvent};
use pythonz::integrations::{digest, geo, hh};
use pythonz::thumbnail::{ThumbnailCache, collect_images};
use pythonz::typograph::Typograph;
use pythonz::types::Realm;
use pythonz::urls::{Utm, url_mangle};
use pythonz::{config, logging, output, text};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pythonz")]
#[command(about = "Content utilities for pythonz.net")]
#[command(long_about = "\
Content utilities for pythonz.net

Typography cleanup for user-submitted text, on-demand thumbnails under the
media root, link helpers, and lookups against hh.ru, the Yandex geocoder,
the Google Time Zone API and the pythondigest.ru feeds.

Thumbnail layout:

  <media_root>/
  └── img/
      └── articles/                # Realm plural name
          ├── cover.jpg            # Source image
          └── thumbs/
              └── 200x100/         # Bounding box
                  └── cover.jpg    # Generated thumbnail

Run 'pythonz gen-config' to generate a documented pythonz.toml.")]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    /// Only log warnings and errors
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

/// Realm and bounding box shared by the thumbnail commands.
#[derive(clap::Args, Clone)]
struct ThumbArgs {
    /// Content realm, singular or plural (article, videos, ...)
    #[arg(long, short, default_value = "article")]
    realm: Realm,

    /// Maximum thumbnail width in pixels
    #[arg(long, short = 'W')]
    width: u32,

    /// Maximum thumbnail height in pixels
    #[arg(long, short = 'H')]
    height: u32,
}

#[derive(Subcommand)]
enum Command {
    /// Apply typography rules to text (reads stdin when TEXT is omitted)
    Typograph { text: Option<String> },
    /// Print the URL of a thumbnail, generating it if needed
    Thumb {
        /// Source image path, or an http(s) URL to download into the realm directory
        source: String,
        #[command(flatten)]
        args: ThumbArgs,
        /// Prefix the site URL
        #[arg(long)]
        absolute: bool,
    },
    /// Generate thumbnails for every image under a directory
    Warm {
        dir: PathBuf,
        #[command(flatten)]
        args: ThumbArgs,
    },
    /// Add UTM labels to a URL
    Utm {
        url: String,
        /// Tag as an internal promo link shared through SOURCE
        #[arg(long)]
        source: Option<String>,
    },
    /// Shorten a long URL for display
    Mangle { url: String },
    /// Group an amount in thousands
    Currency { value: f64 },
    /// Shorten text by characters or words
    Truncate {
        text: String,
        /// Keep at most N characters, ellipsis included
        #[arg(long, conflicts_with = "words", required_unless_present = "words")]
        chars: Option<usize>,
        /// Keep at most N words
        #[arg(long)]
        words: Option<usize>,
    },
    /// List today's Python vacancies from hh.ru
    Vacancies {
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Check whether a vacancy has been archived
    VacancyStatus {
        /// Vacancy API URL
        url: String,
    },
    /// Look up a place with the Yandex geocoder
    Geocode { name: String },
    /// Look up the time zone at coordinates
    Timezone {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lng: f64,
    },
    /// Collect fresh links for articles, videos and events from pythondigest.ru
    Digest {
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// Print a stock pythonz.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.quiet);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let settings = config::load_config(&cli.config)?;

    match cli.command {
        Command::Typograph { text } => {
            let input = match text {
                Some(t) => t,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let typograph = Typograph::with_extra(&settings.typograph.extra_rules)?;
            println!("{}", typograph.apply(&input));
        }
        Command::Thumb {
            source,
            args,
            absolute,
        } => {
            let cache = ThumbnailCache::from_settings(&settings);
            let image = if source.starts_with("http://") || source.starts_with("https://") {
                download_source(&settings, &args.realm, &source)?
            } else {
                PathBuf::from(&source)
            };
            match cache.get_thumbnail_url(&args.realm, &image, args.width, args.height, absolute)? {
                Some(url) => println!("{}", url),
                None => return Err(format!("no file name in '{}'", source).into()),
            }
        }
        Command::Warm { dir, args } => {
            init_thread_pool(&settings.processing);
            let cache = ThumbnailCache::from_settings(&settings);
            let images = collect_images(&dir)?;
            tracing::info!(count = images.len(), dir = %dir.display(), "warming thumbnails");
            let outcomes = cache.warm(&args.realm, &images, args.width, args.height);
            output::print_warm_output(&outcomes, cache.stats());
            if outcomes.iter().any(|o| o.result.is_err()) {
                return Err("some thumbnails failed".into());
            }
        }
        Command::Utm { url, source } => {
            let tagged = match source {
                Some(source) => Utm::add_to_internal_url(&url, &source),
                None => Utm::add_to_external_url(&url),
            };
            println!("{}", tagged);
        }
        Command::Mangle { url } => println!("{}", url_mangle(&url)),
        Command::Currency { value } => println!("{}", text::format_currency(value)),
        Command::Truncate {
            text: input,
            chars,
            words,
        } => {
            let shortened = match (chars, words) {
                (Some(n), _) => text::truncate_chars(&input, n),
                (None, Some(n)) => text::truncate_words(&input, n),
                (None, None) => input,
            };
            println!("{}", shortened);
        }
        Command::Vacancies { json } => {
            let vacancies = with_fetcher(&settings, |fetcher| Ok(hh::fetch_list(fetcher)?))?;
            let Some(vacancies) = vacancies else {
                return Err("vacancy list unavailable".into());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&vacancies)?);
            } else {
                output::print_vacancies(&vacancies);
            }
        }
        Command::VacancyStatus { url } => {
            let archived = with_fetcher(&settings, |fetcher| Ok(hh::get_status(fetcher, &url)))?;
            println!("{}", output::format_vacancy_status(&url, archived));
        }
        Command::Geocode { name } => {
            match with_fetcher(&settings, |fetcher| Ok(geo::get_location_data(fetcher, &name)))? {
                Some(location) => output::print_location(&location),
                None => return Err(format!("nothing found for '{}'", name).into()),
            }
        }
        Command::Timezone { lat, lng } => {
            let Some(api_key) = settings.integrations.google_api_key.clone() else {
                return Err("integrations.google_api_key is not set".into());
            };
            match with_fetcher(&settings, |fetcher| {
                Ok(geo::get_timezone_name(fetcher, &api_key, lat, lng))
            })? {
                Some(name) => println!("{}", name),
                None => return Err(format!("no time zone for {},{}", lat, lng).into()),
            }
        }
        Command::Digest { json } => {
            let entries = with_fetcher(&settings, |fetcher| Ok(digest::fetch_entries(fetcher)))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                output::print_digest(&entries);
            }
        }
        // Printed above, before settings are loaded.
        Command::GenConfig => {}
    }

    Ok(())
}

/// Run `f` with a fetcher whose integration failures are reported on stderr.
fn with_fetcher<T>(
    settings: &config::Settings,
    f: impl FnOnce(&Fetcher) -> Result<T, Box<dyn std::error::Error>>,
) -> Result<T, Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel::<IntegrationEvent>();
    let reporter = std::thread::spawn(move || {
        for event in rx {
            eprintln!("Integration failed: {}", event.description);
        }
    });
    let fetcher = Fetcher::from_config(&settings.integrations)?.with_events(tx);
    let result = f(&fetcher);
    drop(fetcher);
    reporter
        .join()
        .map_err(|_| "integration reporter thread panicked")?;
    result
}

/// Download `url` into the realm's image directory under the media root.
///
/// An existing upload with the same name is kept; the download gets a
/// numbered name instead.
fn download_source(
    settings: &config::Settings,
    realm: &Realm,
    url: &str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file = with_fetcher(settings, |fetcher| Ok(fetcher.get_image_from_url(url)?))?;
    if Path::new(&file.name).file_name().is_none() {
        return Err(format!("no file name in '{}'", url).into());
    }
    let dir = settings.media_root().join("img").join(&realm.name_plural);
    std::fs::create_dir_all(&dir)?;
    let path = file.save_into(&dir)?;
    tracing::info!(url, path = %path.display(), "downloaded source image");
    Ok(path)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores. User can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
