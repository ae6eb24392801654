//! 命令行入口：翻译一个 HTML 文件并输出结果

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;

use autotranslate::dom::Document;
use autotranslate::translation::{AutoTranslator, DictionaryCatalog, LanguageRequest, PassOutcome};
use autotranslate::{logging, ConfigLoader, TranslatorResult};

#[derive(Parser, Debug)]
#[command(
    name = "autotranslate",
    version,
    about = "Translate an HTML page with a dictionary, reversibly"
)]
struct Cli {
    /// HTML file to translate
    #[arg(short, long)]
    input: PathBuf,

    /// Dictionary catalog (.json or .toml), keyed by language code
    #[arg(short, long)]
    dictionary: PathBuf,

    /// Target language code
    #[arg(short, long)]
    language: String,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Charset of the input file
    #[arg(short = 'E', long, default_value = "utf-8")]
    encoding: String,

    /// Restore to the source language after translating
    #[arg(long)]
    restore: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> TranslatorResult<()> {
    let mut config = ConfigLoader::load(cli.config.as_deref())?;
    // 命令行下没有界面渲染需要等待
    config.settle_delay_ms = 0;
    logging::init(&config.log_level);

    let data = fs::read(&cli.input)?;
    let document = Rc::new(Document::from_bytes(&data, &cli.encoding)?);
    let catalog = DictionaryCatalog::load(&cli.dictionary)?;

    let source_language = config.source_language.clone();
    let translator = AutoTranslator::new(config, Rc::clone(&document));

    let request = LanguageRequest::new(cli.language.as_str(), catalog.dictionary(&cli.language));
    if let PassOutcome::Completed { report, .. } = translator.on_language_change(request).await {
        tracing::info!(
            "{}: 翻译 {} 处, 失败 {} 处",
            cli.input.display(),
            report.translated,
            report.failed
        );
    }

    if cli.restore {
        translator
            .on_language_change(LanguageRequest::without_dictionary(source_language))
            .await;
    }
    translator.shutdown();

    let html = document.to_html()?;
    match cli.output {
        Some(path) => fs::write(path, html)?,
        None => print!("{}", html),
    }
    Ok(())
}
