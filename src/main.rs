mod build_info;

#[allow(unused_imports)]
use log::{debug, error, info, warn};

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use clap::{Parser, Subcommand, ValueEnum};

use doclayout_dataset::logging;
use doclayout_dataset::writer::JsonlWriter;
use doclayout_dataset::{
    DatasetBuilder, DatasetConfig, DatasetError, LabelResolver, LogObserver, RecordingObserver,
    Split, UserSettings,
};

use crate::build_info::BuildInfo;

const APP_NAME: &str = "doclayout-dataset";

/// How many skip reasons `check` prints per split
const MAX_REPORTED_SKIPS: usize = 10;

#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = BuildInfo::build_string(), about)]
struct Cli {
    /// Settings file (YAML). Defaults to the per-user config location.
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Data directory, overrides the settings file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Write the in-memory log buffer to debug.log before exiting
    #[arg(long, global = true)]
    export_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write examples as JSON Lines
    Generate {
        #[arg(long, value_enum, default_value_t = SplitArg::All)]
        split: SplitArg,

        /// Directory for <split>.jsonl files; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many examples per split
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Read every record and report skipped lines, boxes beyond the grid
    /// and unknown labels
    Check {
        #[arg(long, value_enum, default_value_t = SplitArg::All)]
        split: SplitArg,
    },
    /// Print the dataset description as YAML
    Info,
    /// Write a commented settings file
    InitSettings {
        /// Target path; the per-user config location when omitted
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SplitArg {
    Train,
    Test,
    All,
}

impl SplitArg {
    fn splits(self) -> Vec<Split> {
        match self {
            SplitArg::Train => vec![Split::Train],
            SplitArg::Test => vec![Split::Test],
            SplitArg::All => Split::ALL.to_vec(),
        }
    }
}

fn main() -> ExitCode {
    let log_buffer = logging::setup_logger();
    logging::setup_panic_hook(APP_NAME, log_buffer.clone());

    let cli = Cli::parse();
    debug!("{}", BuildInfo::detailed_info().replace('\n', ", "));

    let result = run(&cli);
    if let Err(e) = &result {
        error!("{}", e);
    }

    if cli.export_logs {
        if let Err(e) = logging::export_debug_logs(APP_NAME, &log_buffer) {
            eprintln!("Failed to export debug logs: {}", e);
        }
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn run(cli: &Cli) -> Result<(), DatasetError> {
    if let Command::InitSettings { path, force } = &cli.command {
        let path = path.clone().unwrap_or_else(UserSettings::settings_path);
        UserSettings::default().save(&path, *force)?;
        println!("Wrote settings template to {}", path.display());
        return Ok(());
    }

    let settings = UserSettings::load(cli.settings.as_deref())?;
    let mut config = DatasetConfig::from_settings(&settings)?;
    if let Some(data_dir) = &cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    info!("Data directory: {}", config.data_dir().display());
    let builder = DatasetBuilder::new(config);

    match &cli.command {
        Command::Generate { split, output, limit } => {
            generate(&builder, &split.splits(), output.as_deref(), *limit)
        }
        Command::Check { split } => check(&builder, &split.splits()),
        Command::Info => print_info(&builder),
        Command::InitSettings { .. } => Ok(()),
    }
}

fn generate(
    builder: &DatasetBuilder,
    splits: &[Split],
    output: Option<&Path>,
    limit: Option<usize>,
) -> Result<(), DatasetError> {
    if let Some(dir) = output {
        std::fs::create_dir_all(dir)
            .map_err(|source| DatasetError::Io { path: dir.to_path_buf(), source })?;
    }

    for &split in splits {
        let mut examples = builder.generate_examples(split, LogObserver)?;
        let class_list = examples.class_list().clone();
        let resolver = LabelResolver::new(&builder.config().labels, &class_list);

        let sink: Box<dyn Write> = match output {
            Some(dir) => {
                let path = dir.join(format!("{}.jsonl", split));
                let file = File::create(&path)
                    .map_err(|source| DatasetError::Io { path: path.clone(), source })?;
                info!("Writing {} examples to {}", split, path.display());
                Box::new(BufWriter::new(file))
            }
            None => Box::new(BufWriter::new(io::stdout().lock())),
        };

        let mut writer = JsonlWriter::new(sink, resolver);
        let limit = limit.unwrap_or(usize::MAX);
        let mut truncated = false;
        for item in examples.by_ref() {
            let (_, example) = item?;
            if writer.rows() == limit {
                truncated = true;
                break;
            }
            writer.write_example(&example)?;
        }
        let rows = writer.finish()?;

        if truncated {
            examples.finish();
            info!("{}: stopped after {} examples", split, rows);
        }
    }

    Ok(())
}

fn check(builder: &DatasetBuilder, splits: &[Split]) -> Result<(), DatasetError> {
    for &split in splits {
        let generator = builder.split_generator(split);
        let mut observer = RecordingObserver::default();
        let mut examples = builder.generate_examples(split, &mut observer)?;
        let class_list = examples.class_list().clone();
        let resolver = LabelResolver::new(&builder.config().labels, &class_list);

        let mut unknown_labels = 0usize;
        for item in examples.by_ref() {
            let (index, example) = item?;
            if let Err(e) = resolver.resolve_all(&example.ner_tags) {
                warn!("Line {}: {}", index, e);
                unknown_labels += 1;
            }
        }
        let stats = examples.stats().clone();
        drop(examples);

        println!("[{}] {}", split, generator.manifest.display());
        println!("  class list entries:   {}", class_list.len());
        println!("  lines read:           {}", stats.lines_read);
        println!("  examples:             {}", stats.emitted);
        println!("  skipped:              {}", stats.skipped);
        println!("  boxes beyond grid:    {} images", stats.out_of_range_images);
        println!("  unknown labels:       {} examples", unknown_labels);
        println!("  avg image decode:     {:.2} ms", stats.decode.average_ms());

        for (index, _, reason) in observer.skipped.iter().take(MAX_REPORTED_SKIPS) {
            println!("  - line {}: {}", index, reason);
        }
        if observer.skipped.len() > MAX_REPORTED_SKIPS {
            println!("  ... and {} more", observer.skipped.len() - MAX_REPORTED_SKIPS);
        }
        for (index, path) in &observer.out_of_range {
            println!("  ! line {}: boxes beyond 1000 in {}", index, path.display());
        }
    }

    Ok(())
}

fn print_info(builder: &DatasetBuilder) -> Result<(), DatasetError> {
    print!("{}", serde_yaml::to_string(&builder.info())?);
    for generator in builder.split_generators() {
        println!("# {}: {}", generator.split, generator.manifest.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            APP_NAME, "--data-dir", "/data/w2", "generate", "--split", "test", "-o", "out", "--limit", "3",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/data/w2")));
        match cli.command {
            Command::Generate { split, output, limit } => {
                assert_eq!(split.splits(), vec![Split::Test]);
                assert_eq!(output, Some(PathBuf::from("out")));
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_split_is_all() {
        let cli = Cli::try_parse_from([APP_NAME, "check"]).unwrap();
        match cli.command {
            Command::Check { split } => assert_eq!(split.splits(), Split::ALL.to_vec()),
            other => panic!("unexpected command {:?}", other),
        }
    }
}
