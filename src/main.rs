mod cli;

use exrtiler::{config, manifest::ManifestScene, report, tools};
use exrtiler_core::{
    lifecycle, scene, AssetRecord, CommandRunner, ConversionEngine, ConversionStatus,
    ConvertRequest, DryRunRunner, LifecycleController, ProcessRunner,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, ColorSpaceArgs, Commands, ConvertArgs, SceneArgs};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "exrtiler=trace,exrtiler_core=debug".to_string()
        } else {
            "exrtiler=info,exrtiler_core=info".to_string()
        }
    });

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::List { scene, json } => list_assets(&scene, cli.config.as_deref(), json),
        Commands::Convert {
            scene,
            convert,
            color_space,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_scene(
                &scene,
                &convert,
                &color_space,
                cli.config.as_deref(),
            ))
        }
        Commands::Revert {
            scene,
            color_space,
            json,
        } => revert_scene(&scene, &color_space, cli.config.as_deref(), json),
        Commands::Switch {
            scene,
            postfix,
            color_space,
            json,
        } => switch_scene(
            &scene,
            postfix.as_deref(),
            &color_space,
            cli.config.as_deref(),
            json,
        ),
        Commands::ConvertFiles { files, convert } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert_files(&files, &convert, cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

fn open_scene(path: &Path, config: &config::Config) -> Result<ManifestScene> {
    Ok(ManifestScene::open(path)?.with_auto_color_space(config.scene.auto_color_space))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn list_assets(args: &SceneArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let manifest = open_scene(&args.scene, &config)?;

    let records = scene::load_records(&manifest, &args.selection())?;
    let entries = lifecycle::list_state(&records);

    if json {
        print_json(&entries)
    } else {
        println!("{}", report::render_states(&entries));
        Ok(())
    }
}

/// Executable for a conversion: command line, then config, then PATH.
fn converter_path(args: &ConvertArgs, config: &config::Config) -> Result<PathBuf> {
    if let Some(ref exe) = args.executable {
        return Ok(exe.clone());
    }

    match tools::resolve_converter(config.converter.executable.as_deref()) {
        Some(path) => Ok(path),
        // A dry run only prints commands, so the bare name is good enough.
        None if args.dry_run => Ok(PathBuf::from(tools::CONVERTER_NAME)),
        None => anyhow::bail!(
            "{} not found. Pass --executable or set converter.executable in the config",
            tools::CONVERTER_NAME
        ),
    }
}

fn convert_request(args: &ConvertArgs, config: &config::Config) -> Result<ConvertRequest> {
    let request = ConvertRequest::new(converter_path(args, config)?)
        .with_options(args.options(&config.defaults))
        .with_concurrency(args.threads.unwrap_or(config.converter.threads));
    request.options.validate()?;
    Ok(request)
}

fn process_runner(args: &ConvertArgs, config: &config::Config) -> ProcessRunner {
    let timeout = args
        .timeout
        .map(std::time::Duration::from_secs)
        .or_else(|| config.converter.timeout());

    match timeout {
        Some(timeout) => ProcessRunner::new().with_timeout(timeout),
        None => ProcessRunner::new(),
    }
}

async fn convert_scene(
    args: &SceneArgs,
    convert: &ConvertArgs,
    color_space: &ColorSpaceArgs,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let request =
        convert_request(convert, &config)?.with_color_space(color_space.policy(&config.color_space));

    if convert.dry_run {
        run_scene_conversion(DryRunRunner, args, convert, &request, &config).await
    } else {
        run_scene_conversion(process_runner(convert, &config), args, convert, &request, &config)
            .await
    }
}

async fn run_scene_conversion<R: CommandRunner + 'static>(
    runner: R,
    args: &SceneArgs,
    convert: &ConvertArgs,
    request: &ConvertRequest,
    config: &config::Config,
) -> Result<()> {
    let mut manifest = open_scene(&args.scene, config)?;
    let mut records = scene::load_records(&manifest, &args.selection())?;

    tracing::info!(
        "Converting {} textures with {:?}",
        records.len(),
        request.executable
    );

    let controller = LifecycleController::new(ConversionEngine::new(runner));
    let report = controller.convert(&mut records, request).await?;

    if convert.dry_run {
        tracing::info!("[DRY RUN] Scene not modified");
    } else if !report.transitions.is_empty() {
        scene::commit(&mut manifest, &mut records, &report.transitions)?;
        manifest
            .save()
            .with_context(|| format!("Failed to update scene {:?}", args.scene))?;
    }

    if convert.json {
        print_json(&report)?;
    } else {
        println!("{}", report::render_conversion(&report));
    }

    for failure in report.failures() {
        eprintln!("[{}] {}", failure.asset, report::render_result(&failure.result));
    }

    if report.failed() > 0 {
        anyhow::bail!("{} of {} conversions failed", report.failed(), report.entries.len());
    }
    Ok(())
}

fn revert_scene(
    args: &SceneArgs,
    color_space: &ColorSpaceArgs,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let policy = color_space.policy(&config.color_space);

    let mut manifest = open_scene(&args.scene, &config)?;
    let mut records = scene::load_records(&manifest, &args.selection())?;

    let report = lifecycle::revert_to_source(&mut records, &policy);
    finish_switch(&mut manifest, &mut records, &report, json)
}

fn switch_scene(
    args: &SceneArgs,
    postfix: Option<&str>,
    color_space: &ColorSpaceArgs,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let policy = color_space.policy(&config.color_space);
    let postfix = postfix.unwrap_or(config.defaults.postfix.as_str());

    let mut manifest = open_scene(&args.scene, &config)?;
    let mut records = scene::load_records(&manifest, &args.selection())?;

    let report = lifecycle::switch_to_derived(&mut records, postfix, &policy);
    finish_switch(&mut manifest, &mut records, &report, json)
}

fn finish_switch(
    manifest: &mut ManifestScene,
    records: &mut [AssetRecord],
    report: &lifecycle::SwitchReport,
    json: bool,
) -> Result<()> {
    if !report.transitions.is_empty() {
        scene::commit(manifest, records, &report.transitions)?;
        manifest.save()?;
    }

    if json {
        print_json(report)
    } else {
        println!("{}", report::render_switch(report));
        Ok(())
    }
}

async fn convert_files(files: &[PathBuf], args: &ConvertArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let request = convert_request(args, &config)?;

    for file in files.iter().filter(|f| !f.exists()) {
        tracing::warn!("Input file does not exist: {:?}", file);
    }

    let results = if args.dry_run {
        ConversionEngine::new(DryRunRunner)
            .convert_files(&request.executable, files, &request.options, request.concurrency)
            .await?
    } else {
        ConversionEngine::new(process_runner(args, &config))
            .convert_files(&request.executable, files, &request.options, request.concurrency)
            .await?
    };

    if args.json {
        print_json(&results)?;
    } else {
        println!("{}", report::render_results(&results));
    }

    let failed = results
        .iter()
        .filter(|r| matches!(r.status, ConversionStatus::Failed { .. }))
        .count();
    if failed > 0 {
        anyhow::bail!("{} of {} conversions failed", failed, results.len());
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tool = tools::check_converter(config.converter.executable.as_deref());

    let status = if tool.available { "✓" } else { "✗" };
    print!("{} {}", status, tool.name);
    if let (Some(path), Some(origin)) = (&tool.path, tool.origin) {
        print!(" - {} (from {})", path.display(), origin);
    }
    println!();

    println!();
    if tool.available {
        println!("All required tools are available!");
    } else {
        println!(
            "{} is missing. Install V-Ray or set converter.executable in the config.",
            tool.name
        );
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    match config.converter.executable {
        Some(ref exe) => println!("  Converter: {}", exe.display()),
        None => println!("  Converter: {} (from PATH)", tools::CONVERTER_NAME),
    }
    println!("  Threads: {}", config.converter.threads);
    println!("  Options: {}", config.defaults.option_string());
    println!("  Postfix: {}", config.defaults.postfix);
    println!(
        "  Preserve color space: {} (filter: {:?})",
        config.color_space.preserve,
        config.color_space.filter.tokens().join(",")
    );

    Ok(())
}
