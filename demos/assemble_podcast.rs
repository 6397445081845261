//! Пример сборки подкаста через HTTP движок синтеза
//!
//! ```text
//! cargo run --example assemble_podcast -- script.txt [config.json] [music_dir]
//! ```
//!
//! Движок (например, Kokoro-FastAPI) должен слушать адрес из `engine.base_url`.

use anyhow::{bail, Context, Result};
use podcast_assembly::batch::BatchItem;
use podcast_assembly::config::PodcastConfig;
use podcast_assembly::media::music::TrackLibrary;
use podcast_assembly::notification::{
    CompositeProgressObserver, FileProgressObserver, LogProgressObserver,
};
use podcast_assembly::tts::{CachedSynthesizer, HttpSynthesizer};
use podcast_assembly::utils::logging::init_logger;
use podcast_assembly::PodcastAssembler;

fn main() -> Result<()> {
    init_logger();

    let mut args = std::env::args().skip(1);
    let Some(script_path) = args.next() else {
        bail!("usage: assemble_podcast <script.txt> [config.json] [music_dir]");
    };

    let config = match args.next() {
        Some(path) => PodcastConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => PodcastConfig::default(),
    };
    let tracks = match args.next() {
        Some(dir) => TrackLibrary::from_dir(&dir)
            .with_context(|| format!("Failed to scan music directory {}", dir))?,
        None => TrackLibrary::new(),
    };
    log::info!("Background tracks available: {:?}", tracks.names());

    let synthesizer = CachedSynthesizer::new(
        HttpSynthesizer::new(config.engine.clone()).context("Failed to create HTTP client")?,
    );

    let mut observers = CompositeProgressObserver::new();
    observers.add_observer(Box::new(LogProgressObserver::new()));
    observers.add_observer(Box::new(FileProgressObserver::new("progress.log")));

    let mut assembler = PodcastAssembler::new(config).with_tracks(tracks);
    assembler.add_observer(Box::new(observers));

    let item = BatchItem::from_text_file(&script_path);
    let script = match &item.script {
        Ok(script) => script,
        Err(reason) => bail!("{}", reason),
    };

    let mut rng = rand::thread_rng();
    match assembler.assemble(script, &item.output_file_name, &synthesizer, &mut rng) {
        Ok(result) => {
            println!("{}", result.summary_markdown());
            if result.background.is_recovered() {
                println!("Background music was skipped: {:?}", result.background);
            }
            let (hits, misses) = synthesizer.stats();
            log::info!("TTS cache: {} hits, {} misses", hits, misses);
            Ok(())
        }
        Err(e) if e.is_user_facing() => {
            println!("**{}**", e);
            Ok(())
        }
        Err(e) => Err(e).context("Podcast assembly failed"),
    }
}
